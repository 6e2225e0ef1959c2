// User-issued assets: creation, permissions, issuance and reserves.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    asset::{Asset, AssetId},
    config::MUSE_SYMBOL,
    operation::{
        AssetCreateOperation, AssetIssueOperation, AssetOptions, AssetReserveOperation,
        AssetUpdateOperation, Operation, TransferOperation, CHARGE_MARKET_FEE,
        TRANSFER_RESTRICTED, UIA_ASSET_ISSUER_PERMISSION_MASK,
    },
};

fn setup() -> (TestNet, AssetId) {
    let mut net = TestNet::new();
    net.create_account("label");
    net.create_account("fan");

    net.push_tx(
        vec![Operation::AssetCreate(AssetCreateOperation {
            issuer: "label".to_owned(),
            symbol: "GOLD".to_owned(),
            precision: 6,
            common_options: AssetOptions {
                max_supply: 1_000_000,
                ..AssetOptions::default()
            },
        })],
        &["label"],
    )
    .expect("asset");
    let asset_id = net.db.find_asset_by_symbol("GOLD").unwrap().asset_id();
    (net, asset_id)
}

#[test]
fn creates_issues_and_reserves() {
    let (mut net, gold) = setup();

    net.push_tx(
        vec![Operation::AssetIssue(AssetIssueOperation {
            issuer: "label".to_owned(),
            asset_to_issue: Asset::new(500_000, gold),
            issue_to_account: "fan".to_owned(),
        })],
        &["label"],
    )
    .expect("issue");
    assert_eq!(net.balance("fan", gold), 500_000);
    assert_eq!(net.db.get_asset(gold).unwrap().current_supply, 500_000);

    // issuing beyond max_supply is refused
    let err = net
        .push_tx(
            vec![Operation::AssetIssue(AssetIssueOperation {
                issuer: "label".to_owned(),
                asset_to_issue: Asset::new(600_000, gold),
                issue_to_account: "fan".to_owned(),
            })],
            &["label"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    // the holder can return supply to the issuer pool
    net.push_tx(
        vec![Operation::AssetReserve(AssetReserveOperation {
            issuer: "label".to_owned(),
            payer: "fan".to_owned(),
            amount_to_reserve: Asset::new(100_000, gold),
        })],
        &["label"],
    )
    .expect("reserve");
    assert_eq!(net.balance("fan", gold), 400_000);
    assert_eq!(net.db.get_asset(gold).unwrap().current_supply, 400_000);
    net.db.validate_invariants().unwrap();
}

#[test]
fn duplicate_symbol_and_foreign_prefix_are_rejected() {
    let (mut net, _) = setup();
    let err = net
        .push_tx(
            vec![Operation::AssetCreate(AssetCreateOperation {
                issuer: "fan".to_owned(),
                symbol: "GOLD".to_owned(),
                precision: 6,
                common_options: AssetOptions::default(),
            })],
            &["fan"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::DuplicateEntity(_)));

    // a dotted sub-asset belongs to the parent symbol's issuer
    let err = net
        .push_tx(
            vec![Operation::AssetCreate(AssetCreateOperation {
                issuer: "fan".to_owned(),
                symbol: "GOLD.FAN".to_owned(),
                precision: 6,
                common_options: AssetOptions::default(),
            })],
            &["fan"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    net.push_tx(
        vec![Operation::AssetCreate(AssetCreateOperation {
            issuer: "label".to_owned(),
            symbol: "GOLD.VIP".to_owned(),
            precision: 6,
            common_options: AssetOptions::default(),
        })],
        &["label"],
    )
    .expect("issuer of the prefix may create sub-assets");
}

#[test]
fn permissions_only_shrink_and_gate_flags() {
    let (mut net, gold) = setup();

    // flipping transfer_restricted is allowed while permitted
    net.push_tx(
        vec![Operation::AssetUpdate(AssetUpdateOperation {
            issuer: "label".to_owned(),
            asset_to_update: gold,
            new_issuer: None,
            new_options: AssetOptions {
                max_supply: 1_000_000,
                flags: TRANSFER_RESTRICTED,
                issuer_permissions: TRANSFER_RESTRICTED,
                ..AssetOptions::default()
            },
        })],
        &["label"],
    )
    .expect("restrict transfers and drop other permissions");

    // permissions were narrowed to transfer_restricted only; flipping
    // market fees is now out of reach
    let err = net
        .push_tx(
            vec![Operation::AssetUpdate(AssetUpdateOperation {
                issuer: "label".to_owned(),
                asset_to_update: gold,
                new_issuer: None,
                new_options: AssetOptions {
                    max_supply: 1_000_000,
                    flags: TRANSFER_RESTRICTED | CHARGE_MARKET_FEE,
                    issuer_permissions: TRANSFER_RESTRICTED,
                    ..AssetOptions::default()
                },
            })],
            &["label"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    // and revoked permissions cannot come back
    let err = net
        .push_tx(
            vec![Operation::AssetUpdate(AssetUpdateOperation {
                issuer: "label".to_owned(),
                asset_to_update: gold,
                new_issuer: None,
                new_options: AssetOptions {
                    max_supply: 1_000_000,
                    issuer_permissions: UIA_ASSET_ISSUER_PERMISSION_MASK,
                    ..AssetOptions::default()
                },
            })],
            &["label"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
}

#[test]
fn restricted_assets_move_only_through_the_issuer() {
    let (mut net, gold) = setup();
    net.create_account("friend");

    net.push_tx(
        vec![
            Operation::AssetUpdate(AssetUpdateOperation {
                issuer: "label".to_owned(),
                asset_to_update: gold,
                new_issuer: None,
                new_options: AssetOptions {
                    max_supply: 1_000_000,
                    flags: TRANSFER_RESTRICTED,
                    ..AssetOptions::default()
                },
            }),
            Operation::AssetIssue(AssetIssueOperation {
                issuer: "label".to_owned(),
                asset_to_issue: Asset::new(1_000, gold),
                issue_to_account: "fan".to_owned(),
            }),
        ],
        &["label"],
    )
    .expect("restrict and issue");

    // fan -> friend is blocked, fan -> label is fine
    let err = net
        .push_tx(
            vec![Operation::Transfer(TransferOperation {
                from: "fan".to_owned(),
                to: "friend".to_owned(),
                amount: Asset::new(100, gold),
                memo: String::new(),
            })],
            &["fan"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    net.push_tx(
        vec![Operation::Transfer(TransferOperation {
            from: "fan".to_owned(),
            to: "label".to_owned(),
            amount: Asset::new(100, gold),
            memo: String::new(),
        })],
        &["fan"],
    )
    .expect("issuer-bound transfer");
    assert_eq!(net.balance("label", gold), 100);

    // MUSE itself stays unrestricted
    net.fund("fan", 1_000);
    net.push_tx(
        vec![Operation::Transfer(TransferOperation {
            from: "fan".to_owned(),
            to: "friend".to_owned(),
            amount: Asset::new(500, MUSE_SYMBOL),
            memo: String::new(),
        })],
        &["fan"],
    )
    .expect("MUSE transfer");
}
