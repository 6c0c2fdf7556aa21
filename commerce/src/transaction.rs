//! # Transaction Records
//!
//! Every movement of money on the platform produces exactly one
//! [`Transaction`] record: a deposit into a wallet, a transfer between
//! users, a course purchase, or an exchange offer for a minted course slot.
//!
//! ## Status Classification
//!
//! Initial status is a pure function of the amount against
//! [`PENDING_THRESHOLD`]: strictly above it, the transaction starts
//! PENDING and waits for a verification token; at or below it, COMPLETED.
//! Nothing else — not the kind, not the parties, not the time of day —
//! influences the initial status.
//!
//! A PENDING transaction has already debited the sender (funds are held);
//! only the recipient's credit is deferred. The status may move
//! PENDING → COMPLETED exactly once and never backward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use campus_ledger::config::PENDING_THRESHOLD;
use campus_ledger::wallet::WalletId;

use crate::minting::CourseId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when constructing or transitioning a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Transactions must move a positive amount.
    #[error("zero-amount transactions are not permitted")]
    ZeroAmount,

    /// Attempted to complete a transaction that is already COMPLETED.
    /// Completion is not idempotent — a second completion would mean a
    /// second credit.
    #[error("transaction {0} is already completed")]
    AlreadyCompleted(TransactionId),
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Unique identifier for a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generates a fresh random transaction id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Kind & Status
// ---------------------------------------------------------------------------

/// What a transaction represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// User adds funds to their own wallet. Sender equals recipient.
    Deposit,
    /// User sends money to another user, not expecting anything back.
    Transfer,
    /// User pays for a course; an ownership slot is minted alongside.
    Purchase,
    /// Money offered for another user's minted course slot.
    Exchange,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "Deposit"),
            TransactionKind::Transfer => write!(f, "Transfer"),
            TransactionKind::Purchase => write!(f, "Purchase"),
            TransactionKind::Exchange => write!(f, "Exchange"),
        }
    }
}

/// Lifecycle status of a transaction. Strictly one-way:
/// Pending → Completed, never backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Awaiting verification-token confirmation. The sender's funds are
    /// already held; the recipient has not been credited yet.
    Pending,
    /// Fully settled. Immutable from here on.
    Completed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Computes the initial status for a transaction of the given amount.
///
/// Pure function: `amount > PENDING_THRESHOLD` means PENDING.
pub fn classify(amount: u64) -> TransactionStatus {
    if amount > PENDING_THRESHOLD {
        TransactionStatus::Pending
    } else {
        TransactionStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A single money-movement record.
///
/// References both wallets by id — foreign-key-style, no embedded wallet
/// state. Once COMPLETED the record is immutable; administrative
/// corrections are out of scope for this core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// The wallet funds move out of.
    pub sender_wallet: WalletId,
    /// The wallet funds move into. Equals `sender_wallet` for deposits.
    pub recipient_wallet: WalletId,
    /// The course being purchased or exchanged, when applicable.
    pub course: Option<CourseId>,
    /// Amount in smallest units. Always positive.
    pub amount: u64,
    /// What this transaction represents.
    pub kind: TransactionKind,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    fn build(
        sender_wallet: WalletId,
        recipient_wallet: WalletId,
        course: Option<CourseId>,
        amount: u64,
        kind: TransactionKind,
    ) -> Result<Self, TransactionError> {
        if amount == 0 {
            return Err(TransactionError::ZeroAmount);
        }
        Ok(Self {
            id: TransactionId::new(),
            sender_wallet,
            recipient_wallet,
            course,
            amount,
            kind,
            status: classify(amount),
            created_at: Utc::now(),
        })
    }

    /// Creates a deposit record. Sender and recipient are the same wallet.
    pub fn deposit(wallet: WalletId, amount: u64) -> Result<Self, TransactionError> {
        Self::build(wallet, wallet, None, amount, TransactionKind::Deposit)
    }

    /// Creates a transfer record between two wallets.
    pub fn transfer(
        sender: WalletId,
        recipient: WalletId,
        amount: u64,
    ) -> Result<Self, TransactionError> {
        Self::build(sender, recipient, None, amount, TransactionKind::Transfer)
    }

    /// Creates a course-purchase record from the buyer toward the course
    /// creator's wallet.
    pub fn purchase(
        buyer: WalletId,
        creator: WalletId,
        course: CourseId,
        amount: u64,
    ) -> Result<Self, TransactionError> {
        Self::build(
            buyer,
            creator,
            Some(course),
            amount,
            TransactionKind::Purchase,
        )
    }

    /// Creates an exchange-offer record: `initiator` offers `amount` for a
    /// minted slot of `course` owned by the holder of `owner` wallet.
    ///
    /// Exchange offers always start PENDING regardless of amount — the gate
    /// here is the slot owner's acceptance, not the verification threshold.
    pub fn exchange(
        initiator: WalletId,
        owner: WalletId,
        course: CourseId,
        amount: u64,
    ) -> Result<Self, TransactionError> {
        let mut txn = Self::build(
            initiator,
            owner,
            Some(course),
            amount,
            TransactionKind::Exchange,
        )?;
        txn.status = TransactionStatus::Pending;
        Ok(txn)
    }

    /// Returns `true` if this is a deposit (sender == recipient).
    pub fn is_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit
    }

    /// Returns `true` if this is a transfer between two users.
    pub fn is_transfer(&self) -> bool {
        self.kind == TransactionKind::Transfer
    }

    /// Returns `true` if this is a course purchase.
    pub fn is_purchase(&self) -> bool {
        self.kind == TransactionKind::Purchase
    }

    /// Returns `true` if this is an exchange offer.
    pub fn is_exchange(&self) -> bool {
        self.kind == TransactionKind::Exchange
    }

    /// Returns `true` if the transaction still awaits confirmation.
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// Transitions PENDING → COMPLETED.
    ///
    /// The caller performs the deferred recipient credit in the same
    /// atomic unit as this call.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::AlreadyCompleted`] if the transaction is
    /// not PENDING — completion means a credit, and a credit must happen
    /// exactly once.
    pub fn complete(&mut self) -> Result<(), TransactionError> {
        if self.status == TransactionStatus::Completed {
            return Err(TransactionError::AlreadyCompleted(self.id));
        }
        self.status = TransactionStatus::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallets() -> (WalletId, WalletId) {
        (WalletId::new(), WalletId::new())
    }

    #[test]
    fn classify_at_threshold_is_completed() {
        assert_eq!(classify(PENDING_THRESHOLD), TransactionStatus::Completed);
    }

    #[test]
    fn classify_above_threshold_is_pending() {
        assert_eq!(classify(PENDING_THRESHOLD + 1), TransactionStatus::Pending);
    }

    #[test]
    fn classify_small_amount_is_completed() {
        assert_eq!(classify(1), TransactionStatus::Completed);
    }

    #[test]
    fn deposit_has_same_sender_and_recipient() {
        let w = WalletId::new();
        let txn = Transaction::deposit(w, 100).unwrap();
        assert_eq!(txn.sender_wallet, txn.recipient_wallet);
        assert!(txn.is_deposit());
        assert_eq!(txn.status, TransactionStatus::Completed);
    }

    #[test]
    fn zero_amount_rejected() {
        let (a, b) = wallets();
        assert!(matches!(
            Transaction::transfer(a, b, 0),
            Err(TransactionError::ZeroAmount)
        ));
    }

    #[test]
    fn large_transfer_starts_pending() {
        let (a, b) = wallets();
        let txn = Transaction::transfer(a, b, PENDING_THRESHOLD + 500).unwrap();
        assert!(txn.is_pending());
    }

    #[test]
    fn purchase_references_course() {
        let (a, b) = wallets();
        let course = CourseId::new();
        let txn = Transaction::purchase(a, b, course, 300).unwrap();
        assert_eq!(txn.course, Some(course));
        assert!(txn.is_purchase());
    }

    #[test]
    fn complete_transitions_pending_to_completed() {
        let (a, b) = wallets();
        let mut txn = Transaction::transfer(a, b, 2_000).unwrap();
        assert!(txn.is_pending());
        txn.complete().unwrap();
        assert_eq!(txn.status, TransactionStatus::Completed);
    }

    #[test]
    fn double_complete_rejected() {
        let (a, b) = wallets();
        let mut txn = Transaction::transfer(a, b, 2_000).unwrap();
        txn.complete().unwrap();
        let result = txn.complete();
        assert!(matches!(result, Err(TransactionError::AlreadyCompleted(_))));
    }

    #[test]
    fn completing_an_immediately_completed_transaction_rejected() {
        let (a, b) = wallets();
        let mut txn = Transaction::transfer(a, b, 50).unwrap();
        assert_eq!(txn.status, TransactionStatus::Completed);
        assert!(txn.complete().is_err());
    }

    #[test]
    fn transaction_serialization_roundtrip() {
        let (a, b) = wallets();
        let txn = Transaction::transfer(a, b, 2_000).unwrap();
        let json = serde_json::to_string(&txn).expect("serialize");
        let recovered: Transaction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.id, txn.id);
        assert_eq!(recovered.amount, 2_000);
        assert_eq!(recovered.status, TransactionStatus::Pending);
        assert_eq!(recovered.kind, TransactionKind::Transfer);
    }
}
