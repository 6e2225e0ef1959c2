use std::collections::BTreeMap;

use muse_common::{
    asset::AssetId,
    config::{MAX_ACCOUNT_WITNESS_VOTES, MAX_WITHDRAW_ROUTES, MBD_SYMBOL, MUSE_SYMBOL, VESTS_SYMBOL},
};

use crate::error::BlockchainError;

use super::Database;

impl Database {
    /// Full-state audit: every satoshi of every asset must be located in
    /// a balance, an order, an escrow, a convert request, an unclaimed
    /// genesis balance, a content accumulator or the vesting fund, and
    /// the per-account caps must hold. Test and debug builds run this
    /// after mutations; it never mutates.
    pub fn validate_invariants(&self) -> Result<(), BlockchainError> {
        let violation = |message: String| Err(BlockchainError::InvariantViolation(message));

        let mut located: BTreeMap<AssetId, i128> = BTreeMap::new();
        let mut locate = |asset_id: AssetId, amount: i64| {
            *located.entry(asset_id).or_insert(0) += amount as i128;
        };

        let mut total_vesting = 0i128;
        for account in self.accounts.iter() {
            for (asset_id, amount) in &account.balances {
                if *amount < 0 {
                    return violation(format!("negative balance on {}", account.name));
                }
                locate(*asset_id, *amount);
            }
            total_vesting += account.vesting_shares as i128;

            if account.withdraw_routes as usize > MAX_WITHDRAW_ROUTES {
                return violation(format!("too many withdraw routes on {}", account.name));
            }
            if account.witnesses_voted_for as usize > MAX_ACCOUNT_WITNESS_VOTES {
                return violation(format!("too many witness votes on {}", account.name));
            }
        }

        for order in self.limit_orders.iter() {
            if order.for_sale <= 0 {
                return violation(format!(
                    "order {}:{} reserves nothing",
                    order.seller, order.order_id
                ));
            }
            locate(order.sell_price.base.asset_id, order.for_sale);
        }
        for escrow in self.escrows.iter() {
            locate(escrow.balance.asset_id, escrow.balance.amount);
            locate(escrow.pending_fee.asset_id, escrow.pending_fee.amount);
        }
        for request in self.convert_requests.iter() {
            locate(request.amount.asset_id, request.amount.amount);
        }
        for balance in self.balances.iter() {
            locate(balance.balance.asset_id, balance.balance.amount);
        }
        for content in self.contents.iter() {
            locate(
                content.accumulated_balance_master.asset_id,
                content.accumulated_balance_master.amount,
            );
            locate(
                content.accumulated_balance_comp.asset_id,
                content.accumulated_balance_comp.amount,
            );
        }

        let dgp = self.dgp();
        let muse_located =
            located.get(&MUSE_SYMBOL).copied().unwrap_or(0) + dgp.total_vesting_fund_muse.amount as i128;
        if muse_located != dgp.current_supply.amount as i128 {
            return violation(format!(
                "MUSE supply mismatch: located {}, supply {}",
                muse_located, dgp.current_supply.amount
            ));
        }
        let mbd_located = located.get(&MBD_SYMBOL).copied().unwrap_or(0);
        if mbd_located != dgp.current_mbd_supply.amount as i128 {
            return violation(format!(
                "MBD supply mismatch: located {}, supply {}",
                mbd_located, dgp.current_mbd_supply.amount
            ));
        }
        if total_vesting != dgp.total_vesting_shares.amount as i128 {
            return violation(format!(
                "vesting share mismatch: located {}, total {}",
                total_vesting, dgp.total_vesting_shares.amount
            ));
        }

        for asset in self.assets.iter() {
            let asset_id = asset.asset_id();
            if asset_id == MUSE_SYMBOL || asset_id == VESTS_SYMBOL || asset_id == MBD_SYMBOL {
                continue;
            }
            if asset.current_supply > asset.options.max_supply {
                return violation(format!("asset {} exceeds its max supply", asset.symbol));
            }
            let asset_located = located.get(&asset_id).copied().unwrap_or(0);
            if asset_located != asset.current_supply as i128 {
                return violation(format!(
                    "{} supply mismatch: located {}, supply {}",
                    asset.symbol, asset_located, asset.current_supply
                ));
            }
        }

        // a vote may only exist against a voteable content row
        for vote in self.content_votes.iter() {
            let Some(content) = self.contents.find(vote.content) else {
                return violation(format!("vote {} references missing content", vote.id));
            };
            if !content.allow_votes {
                return violation(format!("vote on non-voteable content {}", content.url));
            }
        }

        Ok(())
    }
}
