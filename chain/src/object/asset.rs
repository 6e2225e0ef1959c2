use muse_common::{
    asset::{Asset, AssetId},
    config::ASSET_PRECISION,
    operation::{AssetOptions, CHARGE_MARKET_FEE, DISABLE_CONFIDENTIAL, TRANSFER_RESTRICTED},
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// Parameters of an asset. The row instance doubles as the `AssetId`
/// carried inside every amount of this asset.
#[derive(Clone, Debug)]
pub struct AssetObject {
    pub id: u64,
    pub symbol: String,
    pub precision: u8,
    pub issuer: String,
    pub current_supply: i64,
    pub options: AssetOptions,
}

impl Default for AssetObject {
    fn default() -> Self {
        AssetObject {
            id: 0,
            symbol: String::new(),
            precision: ASSET_PRECISION,
            issuer: String::new(),
            current_supply: 0,
            options: AssetOptions::default(),
        }
    }
}

impl AssetObject {
    pub fn asset_id(&self) -> AssetId {
        AssetId::new(self.id)
    }

    pub fn amount(&self, amount: i64) -> Asset {
        Asset::new(amount, self.asset_id())
    }

    pub fn charges_market_fees(&self) -> bool {
        self.options.flags & CHARGE_MARKET_FEE != 0
    }

    pub fn is_transfer_restricted(&self) -> bool {
        self.options.flags & TRANSFER_RESTRICTED != 0
    }

    pub fn allow_confidential(&self) -> bool {
        self.options.flags & DISABLE_CONFIDENTIAL == 0
    }
}

chain_object!(AssetObject, IMPLEMENTATION_SPACE, object_types::ASSET);
