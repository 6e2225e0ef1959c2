use log::{debug, trace};

use muse_common::{
    asset::{Asset, Price},
    config::{CONVERSION_DELAY_SEC, HUNDRED_PERCENT},
    operation::{
        ConvertOperation, FeedPublishOperation, FillOrderOperation, LimitOrderCancelOperation,
        LimitOrderCreate2Operation, LimitOrderCreateOperation, Operation,
    },
};

use crate::{
    database::Database,
    db::UniqueIndex,
    error::BlockchainError,
    object::{ConvertRequestObject, LimitOrderObject},
};

fn find_order(db: &Database, owner: &str, order_id: u32) -> Option<u64> {
    db.limit_orders
        .index::<UniqueIndex<LimitOrderObject, (String, u32)>>()
        .expect("registered in new")
        .find(&(owner.to_owned(), order_id))
}

/// Best-priced open order selling `base` for `quote`, if any.
fn best_counter_order(db: &Database, base: muse_common::asset::AssetId, quote: muse_common::asset::AssetId) -> Option<u64> {
    let index = db
        .limit_orders
        .index::<UniqueIndex<LimitOrderObject, (Price, u64)>>()
        .expect("registered in new");
    let low = (Price::min(base, quote), 0u64);
    let high = (Price::max(base, quote), u64::MAX);
    index.range(low..=high).next_back().map(|(_, instance)| instance)
}

// Credit `receives` to `owner`, routing the market fee of the received
// asset to its issuer when the asset charges one.
fn pay_fill(db: &mut Database, owner: &str, receives: Asset) -> Result<(), BlockchainError> {
    let asset = db.get_asset(receives.asset_id)?;
    let mut fee = 0i64;
    if asset.charges_market_fees() {
        fee = ((receives.amount as i128 * asset.options.market_fee_percent as i128)
            / HUNDRED_PERCENT as i128) as i64;
        fee = fee.min(asset.options.max_market_fee);
    }
    let issuer = asset.issuer.clone();
    if fee > 0 {
        db.adjust_balance(&issuer, Asset::new(fee, receives.asset_id))?;
    }
    db.adjust_balance(owner, Asset::new(receives.amount - fee, receives.asset_id))
}

// Match a new order against the book until it is filled or no
// compatible counter order remains. Fills happen at the maker's price.
fn match_order(db: &mut Database, order_instance: u64) -> Result<bool, BlockchainError> {
    loop {
        let Some(order) = db.limit_orders.find(order_instance) else {
            return Ok(true); // fully filled and removed
        };
        let order = order.clone();
        let pays_asset = order.sell_price.base.asset_id;
        let receives_asset = order.sell_price.quote.asset_id;

        let Some(counter_instance) = best_counter_order(db, receives_asset, pays_asset) else {
            return Ok(false);
        };
        let counter = db.limit_orders.get(counter_instance)?.clone();

        // compatible iff the maker asks no more than the taker's limit:
        // both prices on the same (pays -> receives) axis, lower asks
        // less of the pays asset per unit received
        let maker_price = counter.sell_price.invert();
        if maker_price > order.sell_price {
            return Ok(false);
        }

        // amounts at the maker price
        let counter_wants = counter.amount_for_sale().multiply(&counter.sell_price)?;
        if counter_wants.amount <= 0 {
            // the maker remainder is too small to trade
            cancel_order(db, counter_instance)?;
            continue;
        }
        let (order_pays, order_receives) = if order.for_sale >= counter_wants.amount {
            // maker fully filled
            (counter_wants, counter.amount_for_sale())
        } else {
            // taker fully filled
            let receives = Asset::new(order.for_sale, pays_asset).multiply(&counter.sell_price)?;
            if receives.amount <= 0 {
                // the taker remainder buys nothing at this price
                cancel_order(db, order_instance)?;
                return Ok(false);
            }
            (Asset::new(order.for_sale, pays_asset), receives)
        };

        pay_fill(db, &order.seller, order_receives)?;
        pay_fill(db, &counter.seller, order_pays)?;

        db.push_virtual_operation(Operation::FillOrder(FillOrderOperation {
            current_owner: order.seller.clone(),
            current_order_id: order.order_id,
            current_pays: order_pays,
            open_owner: counter.seller.clone(),
            open_order_id: counter.order_id,
            open_pays: order_receives,
        }));

        // shrink or remove both sides
        let counter_remaining = counter.for_sale - order_receives.amount;
        if counter_remaining <= 0 {
            db.limit_orders.remove(counter_instance)?;
        } else {
            db.limit_orders.modify(counter_instance, |counter| {
                counter.for_sale = counter_remaining;
            })?;
            // a maker remainder that can no longer buy anything is refunded
            let counter = db.limit_orders.get(counter_instance)?;
            if counter.amount_to_receive()?.amount <= 0 {
                cancel_order(db, counter_instance)?;
            }
        }

        let order_remaining = order.for_sale - order_pays.amount;
        if order_remaining <= 0 {
            db.limit_orders.remove(order_instance)?;
            return Ok(true);
        }
        db.limit_orders.modify(order_instance, |order| {
            order.for_sale = order_remaining;
        })?;
    }
}

// Refund what is still for sale and drop the order.
pub(crate) fn cancel_order(db: &mut Database, instance: u64) -> Result<(), BlockchainError> {
    let order = db.limit_orders.get(instance)?.clone();
    db.adjust_balance(&order.seller, order.amount_for_sale())?;
    db.limit_orders.remove(instance)
}

fn create_and_match(
    db: &mut Database,
    owner: &str,
    order_id: u32,
    amount_to_sell: Asset,
    sell_price: Price,
    fill_or_kill: bool,
    expiration: muse_common::time::TimePointSec,
) -> Result<(), BlockchainError> {
    db.get_account(owner)?;
    db.get_asset(sell_price.base.asset_id)?;
    db.get_asset(sell_price.quote.asset_id)?;
    if find_order(db, owner, order_id).is_some() {
        return Err(BlockchainError::DuplicateEntity(format!(
            "order {owner}:{order_id}"
        )));
    }
    if expiration <= db.head_block_time() {
        return Err(BlockchainError::Evaluate(
            "order expiration is in the past".to_owned(),
        ));
    }

    db.adjust_balance(owner, amount_to_sell.negate())?;

    let now = db.head_block_time();
    let owner = owner.to_owned();
    let instance = {
        let order = db.limit_orders.create(|order| {
            order.created = now;
            order.expiration = expiration;
            order.seller = owner.clone();
            order.order_id = order_id;
            order.for_sale = amount_to_sell.amount;
            order.sell_price = sell_price;
        });
        order.id
    };

    let filled = match_order(db, instance)?;
    if fill_or_kill && !filled {
        return Err(BlockchainError::Evaluate(
            "fill-or-kill order was not filled".to_owned(),
        ));
    }
    trace!("order {owner}:{order_id} placed, filled: {filled}");
    Ok(())
}

pub fn apply_limit_order_create(
    db: &mut Database,
    op: &LimitOrderCreateOperation,
) -> Result<(), BlockchainError> {
    create_and_match(
        db,
        &op.owner,
        op.order_id,
        op.amount_to_sell,
        op.sell_price(),
        op.fill_or_kill,
        op.expiration,
    )
}

pub fn apply_limit_order_create2(
    db: &mut Database,
    op: &LimitOrderCreate2Operation,
) -> Result<(), BlockchainError> {
    create_and_match(
        db,
        &op.owner,
        op.order_id,
        op.amount_to_sell,
        op.exchange_rate,
        op.fill_or_kill,
        op.expiration,
    )
}

pub fn apply_limit_order_cancel(
    db: &mut Database,
    op: &LimitOrderCancelOperation,
) -> Result<(), BlockchainError> {
    let instance = find_order(db, &op.owner, op.order_id).ok_or_else(|| {
        BlockchainError::Evaluate(format!("unknown order {}:{}", op.owner, op.order_id))
    })?;
    cancel_order(db, instance)
}

pub fn apply_feed_publish(
    db: &mut Database,
    op: &FeedPublishOperation,
) -> Result<(), BlockchainError> {
    let witness = db.get_witness(&op.publisher)?;
    let instance = witness.id;
    let now = db.head_block_time();
    debug!("{} published feed {:?}", op.publisher, op.exchange_rate);
    db.witnesses.modify(instance, |witness| {
        witness.mbd_exchange_rate = Some(op.exchange_rate);
        witness.last_mbd_exchange_update = now;
    })
}

pub fn apply_convert(db: &mut Database, op: &ConvertOperation) -> Result<(), BlockchainError> {
    db.get_account(&op.owner)?;

    let index = db
        .convert_requests
        .index::<UniqueIndex<ConvertRequestObject, (String, u32)>>()
        .expect("registered in new");
    if index.contains(&(op.owner.clone(), op.request_id)) {
        return Err(BlockchainError::DuplicateEntity(format!(
            "convert request {}:{}",
            op.owner, op.request_id
        )));
    }

    // conversions need an established feed
    if db.feed_history().current_median_history.is_none() {
        return Err(BlockchainError::Evaluate(
            "no price feed has been established".to_owned(),
        ));
    }

    db.adjust_balance(&op.owner, op.amount.negate())?;
    let conversion_date = db.head_block_time().add_seconds(CONVERSION_DELAY_SEC);
    db.convert_requests.create(|request| {
        request.owner = op.owner.clone();
        request.request_id = op.request_id;
        request.amount = op.amount;
        request.conversion_date = conversion_date;
    });
    Ok(())
}
