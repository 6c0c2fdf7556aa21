//! # Campus Commerce — Transactions, Verification, Minting
//!
//! The commerce and verification core of the Campus e-learning platform.
//! This crate implements the financial primitives that sit on top of
//! [`campus_ledger`]:
//!
//! - **Transaction Engine** — creates and classifies money-movement records
//!   (deposit, transfer, purchase, exchange) and decides whether a
//!   transaction completes immediately or lands in PENDING awaiting human
//!   confirmation.
//! - **Verification Token Workflow** — single-use, time-limited tokens that
//!   activate fresh accounts and finalize high-value pending transactions.
//! - **Course-Ownership Minting** — a fixed inventory of ownership slots
//!   per course, claimed in ascending drop-number order, never
//!   double-allocated.
//! - **Commerce Hub** — the orchestration layer that runs each externally
//!   triggered operation as one atomic critical section.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — we use `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do
//!    not mix.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Authorization gates every operation, read or write.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.
//! 5. A failed operation leaves state exactly as if it never started.

pub mod hub;
pub mod minting;
pub mod notify;
pub mod transaction;
pub mod verification;

pub use hub::{CommerceError, CommerceHub, Course, Redemption};
pub use minting::{CourseId, MintError, OwnershipSlot, SlotId, SlotInventory};
pub use notify::{Notification, Notifier, NotifyError, NullNotifier, RecordingNotifier};
pub use transaction::{
    Transaction, TransactionError, TransactionId, TransactionKind, TransactionStatus,
};
pub use verification::VerificationToken;
