//! # Campus Ledger — Core Library
//!
//! The money-and-identity layer of the Campus e-learning platform. Courses,
//! lectures, and assignments live elsewhere; this crate owns the parts where
//! a bug costs somebody actual funds.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the real concerns of the
//! commerce core:
//!
//! - **config** — Protocol constants: deposit floor, pending threshold,
//!   verification-token lifetime. Every magic number lives here.
//! - **identity** — User ids, the closed role set, and the acting user
//!   abstraction the web layer hands us after authentication.
//! - **policy** — Pure authorization predicates. Owner-or-privileged, no
//!   virtual dispatch, no surprises.
//! - **wallet** — The balance primitive. Checked arithmetic only; a balance
//!   can never go negative, full stop.
//!
//! ## Design Philosophy
//!
//! 1. All amounts are `u64` in smallest-unit denomination. No floating
//!    point anywhere near a balance.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Every failure is a typed error surfaced to the caller — nothing is
//!    swallowed, nothing is retried here.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod identity;
pub mod policy;
pub mod wallet;

pub use identity::{Actor, Role, UserId};
pub use policy::PolicyError;
pub use wallet::{Wallet, WalletError, WalletId};
