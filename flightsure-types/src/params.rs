//! Fixed ledger parameters. These are read-only; there is no governance path
//! that changes them.

use crate::Amount;

pub const WEI_PER_ETHER: Amount = 1_000_000_000_000_000_000;

/// Minimum contribution an airline must escrow before it can participate.
pub const MIN_AIRLINE_FUNDING: Amount = 10 * WEI_PER_ETHER;

/// Upper bound on a single insurance premium.
pub const INSURANCE_CAP: Amount = WEI_PER_ETHER;

/// Payout = premium * CREDIT_NUMERATOR / CREDIT_DENOMINATOR (1.5x).
pub const CREDIT_NUMERATOR: Amount = 3;
pub const CREDIT_DENOMINATOR: Amount = 2;

/// Number of registered airlines admitted without a vote.
pub const CONSENSUS_THRESHOLD: usize = 4;

pub const ORACLE_REGISTRATION_FEE: Amount = WEI_PER_ETHER;

/// Matching reports needed to finalize a flight status.
pub const ORACLE_QUORUM: usize = 3;

/// Oracle sampling indexes are drawn from `0..ORACLE_INDEX_RANGE`.
pub const ORACLE_INDEX_RANGE: u8 = 10;

pub const ORACLE_INDEX_COUNT: usize = 3;

pub fn credit_for(premium: Amount) -> Amount {
    premium.saturating_mul(CREDIT_NUMERATOR) / CREDIT_DENOMINATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_is_one_and_a_half_times_premium() {
        assert_eq!(credit_for(WEI_PER_ETHER / 2), 750_000_000_000_000_000);
        assert_eq!(credit_for(INSURANCE_CAP), 1_500_000_000_000_000_000);
        assert_eq!(credit_for(1), 1);
    }
}
