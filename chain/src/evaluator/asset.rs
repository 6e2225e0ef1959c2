use log::debug;

use muse_common::{
    asset::Asset,
    operation::{
        AssetCreateOperation, AssetIssueOperation, AssetReserveOperation, AssetUpdateOperation,
    },
};

use crate::{database::Database, error::BlockchainError};

use super::transfer::is_authorized_asset;

pub fn apply_asset_create(
    db: &mut Database,
    op: &AssetCreateOperation,
) -> Result<(), BlockchainError> {
    if db.find_asset_by_symbol(&op.symbol).is_some() {
        return Err(BlockchainError::DuplicateEntity(format!(
            "asset with symbol {}",
            op.symbol
        )));
    }
    db.get_account(&op.issuer)?;

    // a dotted symbol is a sub-asset of its prefix and may only be
    // created by the prefix's issuer
    if let Some(dot) = op.symbol.rfind('.') {
        let prefix = &op.symbol[..dot];
        let parent = db.find_asset_by_symbol(prefix).ok_or_else(|| {
            BlockchainError::Evaluate(format!(
                "asset {} may only be created by the issuer of {}, which is not registered",
                op.symbol, prefix
            ))
        })?;
        if parent.issuer != op.issuer {
            return Err(BlockchainError::Evaluate(format!(
                "asset {} may only be created by the issuer of {}",
                op.symbol, prefix
            )));
        }
    }

    db.assets.create(|asset| {
        asset.issuer = op.issuer.clone();
        asset.symbol = op.symbol.clone();
        asset.precision = op.precision;
        asset.options = op.common_options.clone();
        asset.current_supply = 0;
    });
    debug!("created asset {}", op.symbol);
    Ok(())
}

pub fn apply_asset_update(
    db: &mut Database,
    op: &AssetUpdateOperation,
) -> Result<(), BlockchainError> {
    let asset = db.get_asset(op.asset_to_update)?;
    let instance = asset.id;

    if let Some(new_issuer) = &op.new_issuer {
        db.get_account(new_issuer)?;
    }

    let asset = db.assets.get(instance)?;
    // permissions only shrink
    if op.new_options.issuer_permissions & !asset.options.issuer_permissions != 0 {
        return Err(BlockchainError::Evaluate(
            "cannot reinstate previously revoked issuer permissions on an asset".to_owned(),
        ));
    }
    // changed flags must be covered by the still-held permissions
    if (op.new_options.flags ^ asset.options.flags) & !asset.options.issuer_permissions != 0 {
        return Err(BlockchainError::Evaluate(
            "flag change is forbidden by issuer permissions".to_owned(),
        ));
    }
    if asset.issuer != op.issuer {
        return Err(BlockchainError::Evaluate(format!(
            "only the issuer may update asset {}",
            asset.symbol
        )));
    }
    if op.new_options.max_supply < asset.current_supply {
        return Err(BlockchainError::Evaluate(
            "max supply cannot drop below the current supply".to_owned(),
        ));
    }

    db.assets.modify(instance, |asset| {
        if let Some(new_issuer) = &op.new_issuer {
            asset.issuer = new_issuer.clone();
        }
        asset.options = op.new_options.clone();
    })
}

pub fn apply_asset_issue(
    db: &mut Database,
    op: &AssetIssueOperation,
) -> Result<(), BlockchainError> {
    let asset = db.get_asset(op.asset_to_issue.asset_id)?;
    if asset.issuer != op.issuer {
        return Err(BlockchainError::Evaluate(format!(
            "only the issuer may issue asset {}",
            asset.symbol
        )));
    }
    let to = db.get_account(&op.issue_to_account)?;
    if !is_authorized_asset(db, to, asset.id) {
        return Err(BlockchainError::Evaluate("unauthorized asset".to_owned()));
    }
    if asset.current_supply + op.asset_to_issue.amount > asset.options.max_supply {
        return Err(BlockchainError::Evaluate(format!(
            "issuing {} would exceed the maximum supply",
            op.asset_to_issue
        )));
    }

    db.adjust_balance(&op.issue_to_account, op.asset_to_issue)?;
    db.adjust_supply(op.asset_to_issue)
}

pub fn apply_asset_reserve(
    db: &mut Database,
    op: &AssetReserveOperation,
) -> Result<(), BlockchainError> {
    db.get_asset(op.amount_to_reserve.asset_id)?;
    let payer = db.get_account(&op.payer)?;
    if !is_authorized_asset(db, payer, op.amount_to_reserve.asset_id.instance()) {
        return Err(BlockchainError::Evaluate("unauthorized asset".to_owned()));
    }
    db.adjust_balance(&op.payer, op.amount_to_reserve.negate())?;
    db.adjust_supply(Asset::new(
        -op.amount_to_reserve.amount,
        op.amount_to_reserve.asset_id,
    ))
}
