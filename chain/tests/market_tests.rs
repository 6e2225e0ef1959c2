// Internal market: order placement, price-time matching, cancellation,
// expiration, feeds and MBD conversion.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    asset::{Asset, Price},
    config::{CONVERSION_DELAY_SEC, MBD_SYMBOL, MUSE_SYMBOL},
    operation::{
        ConvertOperation, FeedPublishOperation, LimitOrderCancelOperation,
        LimitOrderCreateOperation, Operation,
    },
    time::TimePointSec,
};

fn sell(owner: &str, order_id: u32, amount: Asset, min: Asset, expires: TimePointSec) -> Operation {
    Operation::LimitOrderCreate(LimitOrderCreateOperation {
        owner: owner.to_owned(),
        order_id,
        amount_to_sell: amount,
        min_to_receive: min,
        fill_or_kill: false,
        expiration: expires,
    })
}

fn setup() -> TestNet {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 10_000);
    net.fund_asset("bob", Asset::new(10_000, MBD_SYMBOL));
    net
}

#[test]
fn orders_match_at_the_maker_price() {
    let mut net = setup();
    let expires = net.db.head_block_time().add_seconds(3000);

    // maker: alice sells 1000 MUSE for at least 500 MBD (0.5 MBD/MUSE)
    net.push_tx(
        vec![sell(
            "alice",
            1,
            Asset::new(1000, MUSE_SYMBOL),
            Asset::new(500, MBD_SYMBOL),
            expires,
        )],
        &["alice"],
    )
    .expect("maker order");
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 10_000 - 1000);

    // taker: bob sells 300 MBD for at least 400 MUSE; fills at the
    // maker's 0.5 rate, so 300 MBD buy 600 MUSE
    net.push_tx(
        vec![sell(
            "bob",
            1,
            Asset::new(300, MBD_SYMBOL),
            Asset::new(400, MUSE_SYMBOL),
            expires,
        )],
        &["bob"],
    )
    .expect("taker order");

    assert_eq!(net.balance("bob", MUSE_SYMBOL), 600);
    assert_eq!(net.balance("alice", MBD_SYMBOL), 300);
    // the maker's remainder stays on the book
    let order = net
        .db
        .limit_orders
        .iter()
        .find(|order| order.seller == "alice")
        .expect("partial maker remains");
    assert_eq!(order.for_sale, 400);

    let names: Vec<&str> = net
        .db
        .virtual_operations()
        .iter()
        .map(|(_, op)| op.name())
        .collect();
    assert!(names.contains(&"fill_order"));
    net.db.validate_invariants().unwrap();
}

#[test]
fn incompatible_prices_do_not_match() {
    let mut net = setup();
    let expires = net.db.head_block_time().add_seconds(3000);

    // alice wants 1 MBD per MUSE; bob offers only 0.5
    net.push_tx(
        vec![sell(
            "alice",
            1,
            Asset::new(1000, MUSE_SYMBOL),
            Asset::new(1000, MBD_SYMBOL),
            expires,
        )],
        &["alice"],
    )
    .unwrap();
    net.push_tx(
        vec![sell(
            "bob",
            1,
            Asset::new(500, MBD_SYMBOL),
            Asset::new(1000, MUSE_SYMBOL),
            expires,
        )],
        &["bob"],
    )
    .unwrap();

    assert_eq!(net.db.limit_orders.len(), 2);
    assert_eq!(net.balance("bob", MUSE_SYMBOL), 0);
    net.db.validate_invariants().unwrap();
}

#[test]
fn fill_or_kill_unfilled_is_rejected() {
    let mut net = setup();
    let expires = net.db.head_block_time().add_seconds(3000);
    let op = Operation::LimitOrderCreate(LimitOrderCreateOperation {
        owner: "alice".to_owned(),
        order_id: 7,
        amount_to_sell: Asset::new(1000, MUSE_SYMBOL),
        min_to_receive: Asset::new(500, MBD_SYMBOL),
        fill_or_kill: true,
        expiration: expires,
    });
    let err = net.push_tx(vec![op], &["alice"]).unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
    // the failed block charged nothing
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 10_000);
}

#[test]
fn cancel_refunds_the_reservation() {
    let mut net = setup();
    let expires = net.db.head_block_time().add_seconds(3000);
    net.push_tx(
        vec![sell(
            "alice",
            3,
            Asset::new(2500, MUSE_SYMBOL),
            Asset::new(999, MBD_SYMBOL),
            expires,
        )],
        &["alice"],
    )
    .unwrap();
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 7_500);

    net.push_tx(
        vec![Operation::LimitOrderCancel(LimitOrderCancelOperation {
            owner: "alice".to_owned(),
            order_id: 3,
        })],
        &["alice"],
    )
    .unwrap();
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 10_000);
    assert!(net.db.limit_orders.is_empty());
}

#[test]
fn expired_orders_are_refunded_by_maintenance() {
    let mut net = setup();
    let expires = net.db.head_block_time().add_seconds(30);
    net.push_tx(
        vec![sell(
            "alice",
            4,
            Asset::new(100, MUSE_SYMBOL),
            Asset::new(100, MBD_SYMBOL),
            expires,
        )],
        &["alice"],
    )
    .unwrap();
    assert_eq!(net.db.limit_orders.len(), 1);

    // 40 slots (120 seconds) later the order is past expiration
    net.produce_block_at_slot(40);
    assert!(net.db.limit_orders.is_empty());
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 10_000);
    net.db.validate_invariants().unwrap();
}

#[test]
fn feed_median_drives_conversion() {
    let mut net = setup();

    // initminer publishes 4 MBD per MUSE
    net.push_tx(
        vec![Operation::FeedPublish(FeedPublishOperation {
            publisher: "initminer".to_owned(),
            exchange_rate: Price::new(
                Asset::new(4_000_000, MBD_SYMBOL),
                Asset::new(1_000_000, MUSE_SYMBOL),
            ),
        })],
        &["initminer"],
    )
    .expect("feed");

    // the median enters the window at the next hourly rotation
    assert!(net.db.feed_history().current_median_history.is_none());
    net.cross_time_boundary(60 * 60);
    assert!(net.db.feed_history().current_median_history.is_some());

    net.push_tx(
        vec![Operation::Convert(ConvertOperation {
            owner: "bob".to_owned(),
            request_id: 1,
            amount: Asset::new(4_000, MBD_SYMBOL),
        })],
        &["bob"],
    )
    .expect("convert");
    assert_eq!(net.balance("bob", MBD_SYMBOL), 6_000);
    assert_eq!(net.db.convert_requests.len(), 1);

    // nothing pays out before the 3.5 day delay
    net.produce_blocks(5);
    assert_eq!(net.db.convert_requests.len(), 1);

    let muse_before = net.balance("bob", MUSE_SYMBOL);
    net.produce_block_at_slot(CONVERSION_DELAY_SEC as u64 / 3 + 10);
    assert!(net.db.convert_requests.is_empty());
    // 4000 MBD at 4 MBD/MUSE pay 1000 MUSE
    assert_eq!(net.balance("bob", MUSE_SYMBOL) - muse_before, 1_000);

    let names: Vec<&str> = net
        .db
        .virtual_operations()
        .iter()
        .map(|(_, op)| op.name())
        .collect();
    assert!(names.contains(&"fill_convert_request"));
    net.db.validate_invariants().unwrap();
}
