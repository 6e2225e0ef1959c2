use lazy_static::lazy_static;

use crate::{asset::AssetId, crypto::hash, crypto::Hash};

// Protocol version encoded into block header extensions
pub const BLOCKCHAIN_VERSION: (u8, u8, u16) = (0, 0, 1);

// ===== BLOCK PRODUCTION =====

pub const GENESIS_TIME: u32 = 1_458_835_200;

// 3 second block interval
pub const BLOCK_INTERVAL: u64 = 3;
pub const BLOCKS_PER_YEAR: u64 = 365 * 24 * 60 * 60 / BLOCK_INTERVAL;
pub const BLOCKS_PER_DAY: u64 = 24 * 60 * 60 / BLOCK_INTERVAL;
pub const BLOCKS_PER_HOUR: u64 = 60 * 60 / BLOCK_INTERVAL;

// 21 witnesses per round: 20 voted in, 1 timeshare slot
pub const MAX_VOTED_WITNESSES: usize = 20;
pub const MAX_RUNNER_WITNESSES: usize = 1;
pub const MAX_WITNESSES: usize = MAX_VOTED_WITNESSES + MAX_RUNNER_WITNESSES;
pub const HARDFORK_REQUIRED_WITNESSES: usize = 17;

// 51% of witness confirmations make a block irreversible
pub const IRREVERSIBLE_THRESHOLD: u32 = 51 * ONE_PERCENT;

pub const MAX_UNDO_HISTORY: usize = 10_000;
pub const MIN_UNDO_HISTORY: usize = 10;

// ===== AMOUNTS AND SUPPLY =====

// 6 decimal digits, 1_000_000 satoshis per whole unit
pub const ASSET_PRECISION: u8 = 6;
pub const ASSET_PRECISION_SCALE: i64 = 1_000_000;
pub const MAX_SHARE_SUPPLY: i64 = 30_000_000_000_000;

// Built-in assets, instances in table 2.28
pub const MUSE_SYMBOL: AssetId = AssetId::new(0);
pub const VESTS_SYMBOL: AssetId = AssetId::new(1);
pub const MBD_SYMBOL: AssetId = AssetId::new(2);

pub const MIN_ASSET_SYMBOL_LENGTH: usize = 3;
pub const MAX_ASSET_SYMBOL_LENGTH: usize = 8;
pub const MAX_ASSET_PRECISION: u8 = 12;

// ===== PERCENTAGES =====

// basis points
pub const HUNDRED_PERCENT: u32 = 10_000;
pub const ONE_PERCENT: u32 = HUNDRED_PERCENT / 100;

pub const DEFAULT_MBD_INTEREST_RATE: u32 = 10 * ONE_PERCENT; // 10% APR
pub const MBD_INTEREST_COMPOUND_INTERVAL_SEC: u32 = 60 * 60 * 24 * 30;

// ===== ACCOUNTS =====

pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;

pub const MIN_ACCOUNT_CREATION_FEE: i64 = 1;
pub const MAX_MEMO_SIZE: usize = 2048;

// Bond posted with an authority challenge, burned on success
pub const ACTIVE_CHALLENGE_FEE: i64 = 20_000;
pub const OWNER_CHALLENGE_FEE: i64 = 300_000;

pub const MAX_AUTHORITY_MEMBERSHIP: usize = 10;
pub const MAX_SIG_CHECK_DEPTH: u32 = 2;

pub const MAX_ACCOUNT_WITNESS_VOTES: usize = 30;
pub const MAX_PROXY_RECURSION_DEPTH: u32 = 4;

pub const OWNER_AUTH_RECOVERY_PERIOD_SEC: u32 = 60 * 60 * 24 * 30; // 30 days
pub const ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD_SEC: u32 = 60 * 60 * 24; // 1 day
pub const OWNER_UPDATE_LIMIT_SEC: u32 = 60 * 60; // 60 minutes
pub const CHANGE_RECOVERY_ACCOUNT_DELAY_SEC: u32 = 60 * 60 * 24 * 30; // 30 days

// ===== VESTING =====

// 13 weekly withdrawal tranches
pub const VESTING_WITHDRAW_INTERVALS: u32 = 13;
pub const VESTING_WITHDRAW_INTERVAL_SECONDS: u32 = 60 * 60 * 24 * 7; // 1 week
pub const MAX_WITHDRAW_ROUTES: usize = 10;

// ===== CONTENT AND STREAMING =====

pub const MAX_URL_LENGTH: usize = 127;
pub const MAX_WITNESS_URL_LENGTH: usize = 2048;
pub const MAX_STREAMING_PLATFORM_URL_LENGTH: usize = 2048;

pub const MAX_VOTE_CHANGES: u8 = 5;
pub const CASHOUT_WINDOW_SECONDS: u32 = 60 * 60 * 12; // 12 hours

// A single play may not report more than one hour of listening
pub const MAX_LISTENING_PERIOD: u32 = 3600;

pub const MIN_STREAMING_PLATFORM_CREATION_FEE: i64 = 10_000_000;
pub const MAX_VOTED_STREAMING_PLATFORMS: usize = 10;

pub const CURATION_THRESHOLD_1: u32 = 1000;
pub const CURATION_THRESHOLD_2: u32 = 2000;
pub const CURATION_DURATION_SEC: u32 = 14 * 24 * 60 * 60;

// ===== MARKET AND FEEDS =====

pub const MAX_TIME_UNTIL_EXPIRATION: u32 = 60 * 60; // 1 hour
pub const MIN_TRANSACTION_EXPIRATION_LIMIT: u32 = (BLOCK_INTERVAL * 5) as u32;

pub const FEED_INTERVAL_BLOCKS: u64 = BLOCKS_PER_HOUR;
pub const FEED_HISTORY_WINDOW: usize = 24 * 7; // 7 days of hourly medians
pub const MAX_FEED_AGE_SEC: u32 = 60 * 60 * 24 * 7;
pub const MIN_FEEDS: usize = 1;
pub const CONVERSION_DELAY_SEC: u32 = 60 * 60 * (3 * 24 + 12); // 3.5 days

pub const LIQUIDITY_REWARD_PERIOD_SEC: u64 = 60 * 60;
pub const LIQUIDITY_REWARD_BLOCKS: u64 = LIQUIDITY_REWARD_PERIOD_SEC / BLOCK_INTERVAL;

// ===== INFLATION =====

// Fixed-point APR multipliers: calc(percent, supply) yields
// supply * percent / 10000 spread over the periods of one year.
// The multiplier/shift pairs are chosen so the 128 bit product
// supply * multiplier * percent stays below 2^128.
pub const APR_PERCENT_SHIFT_PER_BLOCK: u32 = 87;
pub const APR_PERCENT_MULTIPLY_PER_BLOCK: u128 =
    (1u128 << APR_PERCENT_SHIFT_PER_BLOCK) / (HUNDRED_PERCENT as u128 * BLOCKS_PER_YEAR as u128);

pub const APR_PERCENT_SHIFT_PER_HOUR: u32 = 77;
pub const APR_PERCENT_MULTIPLY_PER_HOUR: u128 =
    (1u128 << APR_PERCENT_SHIFT_PER_HOUR) / (HUNDRED_PERCENT as u128 * (365 * 24 + 6) as u128);

pub const APR_PERCENT_SHIFT_PER_DAY: u32 = 73;
pub const APR_PERCENT_MULTIPLY_PER_DAY: u128 =
    (1u128 << APR_PERCENT_SHIFT_PER_DAY) / (HUNDRED_PERCENT as u128 * 365u128);

// Units of 0.01%: producers 0.95%, vesting 1.425%, content 7.12% a year
pub const PRODUCER_APR_PERCENT: u32 = 95;
pub const VESTING_APR_PERCENT: u32 = 143;
pub const CONTENT_APR_PERCENT: u32 = 712;
pub const CURATE_APR_PERCENT: u32 = 1;
pub const LIQUIDITY_APR_PERCENT: u32 = 0;

// ===== RESERVED ACCOUNTS =====

pub const INIT_MINER_NAME: &str = "initminer";
// Represents the current witnesses
pub const MINER_ACCOUNT: &str = "miners";
// Canonical account with NO authority, funds sent here are burned
pub const NULL_ACCOUNT: &str = "null";
// Canonical account with wildcard authority
pub const TEMP_ACCOUNT: &str = "temp";
// Empty proxy means voting directly
pub const PROXY_TO_SELF_ACCOUNT: &str = "";

pub const NUM_INIT_MINERS: usize = 1;

lazy_static! {
    // The chain id is mixed into every transaction digest
    pub static ref MAINNET_CHAIN_ID: Hash = hash(b"muse mainchain");
    pub static ref TESTNET_CHAIN_ID: Hash = hash(b"muse testnet");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_differ() {
        assert_ne!(*MAINNET_CHAIN_ID, *TESTNET_CHAIN_ID);
    }

    #[test]
    fn apr_multipliers_fit_u128() {
        // worst case product: max supply * multiplier * 10000
        let product = (MAX_SHARE_SUPPLY as u128)
            .checked_mul(APR_PERCENT_MULTIPLY_PER_BLOCK)
            .and_then(|v| v.checked_mul(HUNDRED_PERCENT as u128));
        assert!(product.is_some());
    }
}
