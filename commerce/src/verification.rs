//! # Verification Tokens
//!
//! A [`VerificationToken`] is a single-use, time-limited secret that gates
//! the two human-in-the-loop flows on the platform:
//!
//! 1. **Registration** — a fresh account stays disabled until its token is
//!    redeemed.
//! 2. **High-value confirmation** — a transaction above the pending
//!    threshold stays PENDING until its token is redeemed.
//!
//! ## State Machine
//!
//! ```text
//!    ┌──────────┐   redeem    ┌────────────┐
//!    │  Issued   │ ──────────► │  Redeemed  │ ← terminal, record deleted
//!    └────┬──────┘            └────────────┘
//!         │ clock passes expires_at
//!    ┌────▼──────┐
//!    │  Expired   │ ← terminal, implicit; redemption now fails
//!    └────────────┘
//! ```
//!
//! Expiry is lazy: nothing sweeps expired tokens, the check happens at
//! redemption time against the wall clock. Redemption itself — the lookup,
//! the side effect (activation or completion), and the deletion — is one
//! atomic hub operation so a retried redemption can never double-apply.
//!
//! The token string is a freshly generated UUIDv4. Not guessable in
//! practice within a ten-minute window, and trivially unique.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campus_ledger::config::token_ttl;
use campus_ledger::identity::UserId;

use crate::transaction::TransactionId;

/// A single-use verification token.
///
/// Linked either to a bare user (registration) or to a pending transaction
/// (high-value confirmation) — never both. The `verifier` is the only user
/// allowed to redeem it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationToken {
    /// The opaque secret handed to the user out-of-band.
    pub token: String,

    /// The user who must redeem this token.
    pub verifier: UserId,

    /// The pending transaction this token finalizes, if any. `None` for
    /// registration tokens.
    pub transaction: Option<TransactionId>,

    /// When the token was issued.
    pub issued_at: DateTime<Utc>,

    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Issues a registration token for a newly created account.
    pub fn for_registration(user: UserId) -> Self {
        Self::issue(user, None)
    }

    /// Issues a confirmation token for a pending transaction. The verifier
    /// is the transaction's sender — the person whose money is held.
    pub fn for_transaction(transaction: TransactionId, sender: UserId) -> Self {
        Self::issue(sender, Some(transaction))
    }

    fn issue(verifier: UserId, transaction: Option<TransactionId>) -> Self {
        let now = Utc::now();
        Self {
            token: Uuid::new_v4().to_string(),
            verifier,
            transaction,
            issued_at: now,
            expires_at: now + token_ttl(),
        }
    }

    /// Returns `true` if the token is past its expiry at `now`.
    ///
    /// Takes the clock as a parameter so tests don't have to sleep for ten
    /// minutes.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Shifts the expiry backward. Test-only hook for exercising the
    /// expired-redemption path without waiting.
    pub fn backdate(&mut self, by: Duration) {
        self.issued_at -= by;
        self.expires_at -= by;
    }
}
