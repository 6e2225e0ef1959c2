use muse_common::{
    asset::{Asset, Price},
    config::{MBD_SYMBOL, MUSE_SYMBOL},
    time::TimePointSec,
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// An open order on the internal market. `for_sale` is denominated in
/// the base of `sell_price`; the owner's balance was debited when the
/// order was placed, so the book always covers its reservations.
#[derive(Clone, Debug)]
pub struct LimitOrderObject {
    pub id: u64,
    pub created: TimePointSec,
    pub expiration: TimePointSec,
    pub seller: String,
    pub order_id: u32,
    pub for_sale: i64,
    pub sell_price: Price,
}

impl Default for LimitOrderObject {
    fn default() -> Self {
        LimitOrderObject {
            id: 0,
            created: TimePointSec::zero(),
            expiration: TimePointSec::maximum(),
            seller: String::new(),
            order_id: 0,
            for_sale: 0,
            sell_price: Price::new(Asset::new(1, MUSE_SYMBOL), Asset::new(1, MBD_SYMBOL)),
        }
    }
}

impl LimitOrderObject {
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_price.base.asset_id)
    }

    pub fn amount_to_receive(&self) -> Result<Asset, muse_common::asset::AmountError> {
        self.amount_for_sale().multiply(&self.sell_price)
    }
}

chain_object!(
    LimitOrderObject,
    IMPLEMENTATION_SPACE,
    object_types::LIMIT_ORDER
);

/// A pending MBD conversion; pays MUSE at the median feed once the
/// conversion delay has elapsed.
#[derive(Clone, Debug)]
pub struct ConvertRequestObject {
    pub id: u64,
    pub owner: String,
    pub request_id: u32,
    pub amount: Asset,
    pub conversion_date: TimePointSec,
}

impl Default for ConvertRequestObject {
    fn default() -> Self {
        ConvertRequestObject {
            id: 0,
            owner: String::new(),
            request_id: 0,
            amount: Asset::zero(MBD_SYMBOL),
            conversion_date: TimePointSec::zero(),
        }
    }
}

chain_object!(
    ConvertRequestObject,
    IMPLEMENTATION_SPACE,
    object_types::CONVERT_REQUEST
);
