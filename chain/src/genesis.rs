use muse_common::{
    authority::Authority,
    config::{
        INIT_MINER_NAME, MINER_ACCOUNT, NULL_ACCOUNT, TEMP_ACCOUNT,
    },
    crypto::{PrivateKey, PublicKey},
};

use crate::{database::Database, error::BlockchainError};

// Deterministic bootstrap key, the same one the test networks use
pub fn init_key() -> PrivateKey {
    PrivateKey::from_seed("init_key")
}

/// Populate an empty database with the built-in assets, the reserved
/// accounts, the bootstrap witness and the singleton property rows.
/// Everything here is committed state, outside any undo session.
pub fn init_genesis(db: &mut Database) -> Result<(), BlockchainError> {
    init_genesis_with_key(db, &init_key().public_key())
}

pub fn init_genesis_with_key(
    db: &mut Database,
    init_public: &PublicKey,
) -> Result<(), BlockchainError> {
    assert!(db.assets.is_empty(), "genesis runs once on an empty store");

    // built-in assets claim instances 0, 1 and 2: MUSE, VESTS, MBD
    db.assets.create(|asset| {
        asset.symbol = "MUSE".to_owned();
        asset.issuer = NULL_ACCOUNT.to_owned();
    });
    db.assets.create(|asset| {
        asset.symbol = "VESTS".to_owned();
        asset.issuer = NULL_ACCOUNT.to_owned();
    });
    db.assets.create(|asset| {
        asset.symbol = "MBD".to_owned();
        asset.issuer = NULL_ACCOUNT.to_owned();
    });

    // reserved accounts: miners, null and temp carry impossible or
    // wildcard authorities and are never signed for
    let impossible = Authority::new(1);
    for name in [MINER_ACCOUNT, NULL_ACCOUNT, TEMP_ACCOUNT] {
        db.accounts.create(|account| {
            account.name = name.to_owned();
            account.owner = impossible.clone();
            account.active = impossible.clone();
            account.basic = impossible.clone();
        });
    }

    let init_authority = Authority::single_key(init_public.clone());
    db.accounts.create(|account| {
        account.name = INIT_MINER_NAME.to_owned();
        account.owner = init_authority.clone();
        account.active = init_authority.clone();
        account.basic = init_authority.clone();
        account.memo_key = init_public.clone();
        account.recovery_account = INIT_MINER_NAME.to_owned();
    });

    db.witnesses.create(|witness| {
        witness.owner = INIT_MINER_NAME.to_owned();
        witness.signing_key = init_public.clone();
    });

    db.dynamic_globals.create(|dgp| {
        dgp.current_witness = INIT_MINER_NAME.to_owned();
        dgp.time = muse_common::time::TimePointSec::new(muse_common::config::GENESIS_TIME);
    });
    db.feed_histories.create(|_| {});
    db.witness_schedules.create(|schedule| {
        schedule.current_shuffled_witnesses = vec![INIT_MINER_NAME.to_owned()];
    });

    Ok(())
}
