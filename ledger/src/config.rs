//! # Platform Constants
//!
//! Every magic number in the commerce core lives here. If you're hardcoding
//! a threshold somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! These values shape observable behavior — the deposit floor and the
//! pending threshold are part of the product contract with users, so treat
//! changes here as product decisions, not refactors.

use chrono::Duration;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Minimum deposit amount, in smallest units.
///
/// Deposits strictly below this floor are rejected outright. Depositing
/// exactly the floor is fine — the check is `amount < MIN_DEPOSIT`, and the
/// boundary is covered by tests because off-by-one bugs on money are how
/// you end up on the front page.
pub const MIN_DEPOSIT: u64 = 10;

/// The amount above which a transaction starts out PENDING instead of
/// COMPLETED.
///
/// Classification is a pure function of the amount against this constant:
/// `amount > PENDING_THRESHOLD` means the transaction needs human
/// confirmation through a verification token before funds are released to
/// the recipient. Nothing else — not the kind, not the parties — influences
/// the initial status.
pub const PENDING_THRESHOLD: u64 = 1_500;

// ---------------------------------------------------------------------------
// Verification Tokens
// ---------------------------------------------------------------------------

/// How long a verification token stays redeemable after issuance.
///
/// Ten minutes. Long enough to open an email, short enough that a leaked
/// token is stale before anyone can do much with it. Expiry is evaluated
/// lazily at redemption time; there is no background sweeper.
pub fn token_ttl() -> Duration {
    Duration::minutes(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_floor_below_pending_threshold() {
        // A minimum deposit that already requires verification would make
        // every deposit pending. That would be a product bug.
        assert!(MIN_DEPOSIT < PENDING_THRESHOLD);
    }

    #[test]
    fn token_ttl_is_positive() {
        assert!(token_ttl() > Duration::zero());
    }

    #[test]
    fn token_ttl_is_ten_minutes() {
        assert_eq!(token_ttl().num_minutes(), 10);
    }
}
