//! # Wallet — The Balance Primitive
//!
//! A [`Wallet`] holds one user's balance in smallest-unit denomination and
//! exposes exactly two mutations: [`credit`](Wallet::credit) and
//! [`debit`](Wallet::debit). Both use checked arithmetic, both reject zero
//! amounts, and a debit that would take the balance below zero fails before
//! touching anything. The ledger's core invariant — a balance is never
//! negative — holds by construction, not by convention.
//!
//! Business rules that are *not* balance rules live upstream: the minimum
//! deposit floor, the pending threshold, and authorization are all enforced
//! by the commerce layer before it ever calls into here.
//!
//! ## Persistence
//!
//! The struct derives `Serialize`/`Deserialize` and is stored by the hub as
//! a plain record keyed by owner id. Concurrent access is coordinated at
//! the hub level; a `Wallet` by itself is just data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::UserId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during balance operations.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The requested amount is zero, which is a no-op and likely indicates
    /// a bug in the caller.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// Attempted to debit more than the available balance.
    #[error("insufficient funds: available {available}, requested {requested} (wallet {wallet_id})")]
    InsufficientFunds {
        /// The wallet that was being debited.
        wallet_id: WalletId,
        /// The current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// Arithmetic overflow during a credit.
    ///
    /// If you're hitting this, someone is trying to credit more than
    /// 18.4 quintillion units. That's either a bug or an attack.
    #[error("balance overflow: current {current}, credit {credit} (wallet {wallet_id})")]
    Overflow {
        /// The wallet that was being credited.
        wallet_id: WalletId,
        /// The balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// WalletId
// ---------------------------------------------------------------------------

/// Unique identifier for a wallet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Generates a fresh random wallet id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self.0)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A single user's wallet.
///
/// Exactly one wallet exists per activated user. It is created with a zero
/// balance at account activation, mutated only through [`credit`](Self::credit)
/// and [`debit`](Self::debit), and never deleted while the owner remains
/// active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet identifier.
    id: WalletId,

    /// The user who owns this wallet. 1:1 — a user has at most one wallet.
    owner: UserId,

    /// Current balance in smallest units. Never negative.
    balance: u64,

    /// When this wallet was created (account activation time).
    created_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new zero-balance wallet for the given owner.
    pub fn new(owner: UserId) -> Self {
        Self {
            id: WalletId::new(),
            owner,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    /// Returns the wallet id.
    pub fn id(&self) -> WalletId {
        self.id
    }

    /// Returns the owning user's id.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Returns the current balance in smallest units.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Returns when this wallet was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` if the wallet can cover a debit of `amount`.
    pub fn can_cover(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Credits (adds) funds to the wallet.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::ZeroAmount`] if `amount` is 0 and
    /// [`WalletError::Overflow`] if the credit would exceed `u64::MAX`.
    pub fn credit(&mut self, amount: u64) -> Result<u64, WalletError> {
        if amount == 0 {
            return Err(WalletError::ZeroAmount);
        }

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(WalletError::Overflow {
                wallet_id: self.id,
                current: self.balance,
                credit: amount,
            })?;

        Ok(self.balance)
    }

    /// Debits (subtracts) funds from the wallet.
    ///
    /// The sufficient-funds precondition and the subtraction happen on the
    /// same in-memory value; callers that need this atomic with respect to
    /// other operations hold the hub lock around the whole operation.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::ZeroAmount`] if `amount` is 0 and
    /// [`WalletError::InsufficientFunds`] if `balance < amount`.
    pub fn debit(&mut self, amount: u64) -> Result<u64, WalletError> {
        if amount == 0 {
            return Err(WalletError::ZeroAmount);
        }

        if self.balance < amount {
            return Err(WalletError::InsufficientFunds {
                wallet_id: self.id,
                available: self.balance,
                requested: amount,
            });
        }

        self.balance -= amount;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Wallet {
        Wallet::new(UserId::new())
    }

    #[test]
    fn new_wallet_is_empty() {
        let w = wallet();
        assert_eq!(w.balance(), 0);
    }

    #[test]
    fn credit_increases_balance() {
        let mut w = wallet();
        assert_eq!(w.credit(500).unwrap(), 500);
        assert_eq!(w.credit(250).unwrap(), 750);
        assert_eq!(w.balance(), 750);
    }

    #[test]
    fn credit_zero_rejected() {
        let mut w = wallet();
        assert!(matches!(w.credit(0), Err(WalletError::ZeroAmount)));
    }

    #[test]
    fn credit_overflow_rejected() {
        let mut w = wallet();
        w.credit(u64::MAX).unwrap();
        let result = w.credit(1);
        assert!(matches!(result, Err(WalletError::Overflow { .. })));
        // Balance unchanged by the failed credit.
        assert_eq!(w.balance(), u64::MAX);
    }

    #[test]
    fn debit_decreases_balance() {
        let mut w = wallet();
        w.credit(1_000).unwrap();
        assert_eq!(w.debit(400).unwrap(), 600);
        assert_eq!(w.balance(), 600);
    }

    #[test]
    fn debit_to_zero() {
        let mut w = wallet();
        w.credit(500).unwrap();
        assert_eq!(w.debit(500).unwrap(), 0);
    }

    #[test]
    fn debit_insufficient_funds_rejected() {
        let mut w = wallet();
        w.credit(100).unwrap();
        let result = w.debit(200);
        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds {
                available: 100,
                requested: 200,
                ..
            })
        ));
        // Failed debit must not change state.
        assert_eq!(w.balance(), 100);
    }

    #[test]
    fn debit_zero_rejected() {
        let mut w = wallet();
        w.credit(100).unwrap();
        assert!(matches!(w.debit(0), Err(WalletError::ZeroAmount)));
    }

    #[test]
    fn balance_never_negative_across_mixed_sequence() {
        let mut w = wallet();
        let ops: [(bool, u64); 7] = [
            (true, 100),
            (false, 30),
            (false, 80), // fails: only 70 left
            (true, 10),
            (false, 80),
            (false, 1), // fails: 0 left
            (true, 5),
        ];
        for (is_credit, amount) in ops {
            let _ = if is_credit {
                w.credit(amount)
            } else {
                w.debit(amount)
            };
            // u64 can't go negative; the meaningful assertion is that the
            // running total matches only the operations that succeeded.
        }
        assert_eq!(w.balance(), 5);
    }

    #[test]
    fn wallet_serialization_roundtrip() {
        let mut w = wallet();
        w.credit(42_000).unwrap();
        w.debit(2_000).unwrap();

        let json = serde_json::to_string(&w).expect("serialize");
        let recovered: Wallet = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.id(), w.id());
        assert_eq!(recovered.owner(), w.owner());
        assert_eq!(recovered.balance(), 40_000);
    }
}
