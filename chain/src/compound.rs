// Fixed-point inflation helpers. Each multiplier/shift pair spreads an
// annual rate over its period so that summing a year of payouts lands on
// `supply * percent / 10000`, with all intermediates in u128.

use muse_common::config::{
    APR_PERCENT_MULTIPLY_PER_BLOCK, APR_PERCENT_MULTIPLY_PER_DAY, APR_PERCENT_MULTIPLY_PER_HOUR,
    APR_PERCENT_SHIFT_PER_BLOCK, APR_PERCENT_SHIFT_PER_DAY, APR_PERCENT_SHIFT_PER_HOUR,
};

fn calc_percent_reward(percent: u32, multiplier: u128, shift: u32, virtual_supply: i64) -> i64 {
    if virtual_supply <= 0 {
        return 0;
    }
    let reward = (virtual_supply as u128)
        .saturating_mul(multiplier)
        .saturating_mul(percent as u128)
        >> shift;
    reward.min(i64::MAX as u128) as i64
}

/// Per-block payout for an APR expressed in units of 0.01%.
pub fn calc_percent_reward_per_block(percent: u32, virtual_supply: i64) -> i64 {
    calc_percent_reward(
        percent,
        APR_PERCENT_MULTIPLY_PER_BLOCK,
        APR_PERCENT_SHIFT_PER_BLOCK,
        virtual_supply,
    )
}

/// Per-hour payout for an APR expressed in units of 0.01%.
pub fn calc_percent_reward_per_hour(percent: u32, virtual_supply: i64) -> i64 {
    calc_percent_reward(
        percent,
        APR_PERCENT_MULTIPLY_PER_HOUR,
        APR_PERCENT_SHIFT_PER_HOUR,
        virtual_supply,
    )
}

/// Per-day payout for an APR expressed in units of 0.01%.
pub fn calc_percent_reward_per_day(percent: u32, virtual_supply: i64) -> i64 {
    calc_percent_reward(
        percent,
        APR_PERCENT_MULTIPLY_PER_DAY,
        APR_PERCENT_SHIFT_PER_DAY,
        virtual_supply,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use muse_common::config::{
        BLOCKS_PER_YEAR, CONTENT_APR_PERCENT, PRODUCER_APR_PERCENT, VESTING_APR_PERCENT,
    };

    // The inflation target is roughly 9.5% a year: 10% of it to
    // witnesses, 15% to vesting and 75% to content, so 0.95%, 1.425%
    // (rounded to 1.43) and 7.125% (rounded to 7.12) respectively. The
    // average supply over a year is about 1.0475 times the starting
    // supply.

    const SUPPLY: i64 = 18_000_000 * 1_000_000;

    fn avg_supply() -> i64 {
        (SUPPLY as f64 * 1.0475) as i64
    }

    fn within_five_percent(actual: i64, expected: i64) -> bool {
        let expected = expected as f64;
        let actual = actual as f64;
        expected * 0.95 < actual && actual < expected * 1.05
    }

    #[test]
    fn witness_reward_calibration() {
        let expected = (SUPPLY as f64 * 0.0095) as i64;
        let per_block = calc_percent_reward_per_block(PRODUCER_APR_PERCENT, avg_supply());
        let per_year = per_block * BLOCKS_PER_YEAR as i64;
        assert!(
            within_five_percent(per_year, expected),
            "expected ~{expected}, got {per_year}"
        );
    }

    #[test]
    fn vesting_reward_calibration() {
        let expected = (SUPPLY as f64 * 0.0143) as i64;
        let per_block = calc_percent_reward_per_block(VESTING_APR_PERCENT, avg_supply());
        let per_year = per_block * BLOCKS_PER_YEAR as i64;
        assert!(
            within_five_percent(per_year, expected),
            "expected ~{expected}, got {per_year}"
        );
    }

    #[test]
    fn content_reward_calibration() {
        let expected = (SUPPLY as f64 * 0.0712) as i64;
        let per_day = calc_percent_reward_per_day(CONTENT_APR_PERCENT, avg_supply());
        let per_year = per_day * 365;
        assert!(
            within_five_percent(per_year, expected),
            "expected ~{expected}, got {per_year}"
        );
    }

    #[test]
    fn zero_and_negative_supply_pay_nothing() {
        assert_eq!(calc_percent_reward_per_block(PRODUCER_APR_PERCENT, 0), 0);
        assert_eq!(calc_percent_reward_per_block(PRODUCER_APR_PERCENT, -1), 0);
    }
}
