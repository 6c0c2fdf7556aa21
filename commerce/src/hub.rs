//! # Commerce Hub
//!
//! The orchestration layer. Every externally triggered operation — a
//! registration, a deposit, a purchase, a token redemption — enters through
//! a [`CommerceHub`] method and runs as one critical section over the whole
//! platform state: authorization first, then every invariant check, then
//! the mutations. A failed operation leaves state exactly as if it never
//! started.
//!
//! ## Concurrency
//!
//! One `parking_lot::Mutex` guards all state. That is a deliberate trade:
//! commerce operations are short, purely in-memory, and heavily
//! cross-entity (a purchase touches two wallets, an inventory, and the
//! transaction log), so a single lock buys whole-operation atomicity
//! without any ordering protocol between finer locks. Two concurrent
//! purchases of the last slot serialize here; exactly one passes the
//! availability check.
//!
//! Outbound notifications are the one thing that happens *outside* the
//! lock. By the time the notifier runs, the state change is committed; a
//! failed delivery is logged and the token stays redeemable through other
//! channels.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use campus_ledger::config::MIN_DEPOSIT;
use campus_ledger::identity::{Actor, Role, UserId};
use campus_ledger::policy::{self, PolicyError};
use campus_ledger::wallet::{Wallet, WalletError, WalletId};

use crate::minting::{CourseId, MintError, OwnershipSlot, SlotInventory};
use crate::notify::Notifier;
use crate::transaction::{Transaction, TransactionError, TransactionId, TransactionStatus};
use crate::verification::VerificationToken;

/// Redemption context handed to the notifier for registration tokens.
const REGISTRATION_VERIFY_URL: &str = "/verify/registration";

/// Redemption context handed to the notifier for transaction tokens.
const TRANSACTION_VERIFY_URL: &str = "/verify/transaction";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The unified error surface of the commerce hub.
///
/// Lower-layer errors fold into this taxonomy: a policy rejection becomes
/// [`Unauthorized`](CommerceError::Unauthorized), a failed debit becomes
/// [`InsufficientFunds`](CommerceError::InsufficientFunds), and business
/// rules that don't fit a structured shape (duplicate claims, exhausted
/// inventories, double completions) land in
/// [`ImpossibleOperation`](CommerceError::ImpossibleOperation).
#[derive(Debug, Error)]
pub enum CommerceError {
    /// A referenced entity does not exist.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Entity label ("user", "wallet", "transaction", ...).
        entity: &'static str,
        /// The key that failed to resolve.
        key: String,
    },

    /// The acting user may not perform this operation.
    #[error(transparent)]
    Unauthorized(#[from] PolicyError),

    /// The operation violates a business rule.
    #[error("{0}")]
    ImpossibleOperation(String),

    /// A debit exceeded the available balance.
    #[error("insufficient funds: available {available}, requested {requested} (wallet {wallet_id})")]
    InsufficientFunds {
        /// The wallet that could not cover the debit.
        wallet_id: WalletId,
        /// The balance at the time of the attempt.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// An entity with this identity already exists.
    #[error("{entity} {key} already exists")]
    DuplicateEntity {
        /// Entity label.
        entity: &'static str,
        /// The conflicting key.
        key: String,
    },

    /// The verification token is past its expiry.
    #[error("verification token expired at {expired_at}")]
    ExpiredToken {
        /// When the token stopped being redeemable.
        expired_at: DateTime<Utc>,
    },
}

impl From<WalletError> for CommerceError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InsufficientFunds {
                wallet_id,
                available,
                requested,
            } => CommerceError::InsufficientFunds {
                wallet_id,
                available,
                requested,
            },
            other => CommerceError::ImpossibleOperation(other.to_string()),
        }
    }
}

impl From<MintError> for CommerceError {
    fn from(err: MintError) -> Self {
        CommerceError::ImpossibleOperation(err.to_string())
    }
}

impl From<TransactionError> for CommerceError {
    fn from(err: TransactionError) -> Self {
        CommerceError::ImpossibleOperation(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// A course as the commerce core sees it: a creator, a price, and (once
/// initialized) a slot inventory. Curriculum content lives elsewhere.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier.
    pub id: CourseId,
    /// The teacher who created the course and receives purchase proceeds.
    pub creator: UserId,
    /// Purchase price in smallest units. Always positive.
    pub price: u64,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Redemption outcome
// ---------------------------------------------------------------------------

/// What redeeming a verification token accomplished.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Redemption {
    /// A registration token: the account is now enabled and has a wallet.
    AccountActivated(UserId),
    /// A transaction token: the pending transaction is now settled.
    TransactionCompleted(Transaction),
}

// ---------------------------------------------------------------------------
// Hub state
// ---------------------------------------------------------------------------

/// Everything the hub owns, guarded by one lock.
#[derive(Default)]
struct HubState {
    /// All known users, enabled or not.
    actors: HashMap<UserId, Actor>,
    /// Wallets keyed by owner. 1:1 with activated users.
    wallets: HashMap<UserId, Wallet>,
    /// The full transaction log.
    transactions: HashMap<TransactionId, Transaction>,
    /// Live verification tokens keyed by their secret string.
    tokens: HashMap<String, VerificationToken>,
    /// Course records.
    courses: HashMap<CourseId, Course>,
    /// Slot inventories, present once the creator initializes them.
    inventories: HashMap<CourseId, SlotInventory>,
}

impl HubState {
    fn actor(&self, user: UserId) -> Result<&Actor, CommerceError> {
        self.actors.get(&user).ok_or_else(|| CommerceError::NotFound {
            entity: "user",
            key: user.to_string(),
        })
    }

    fn actor_mut(&mut self, user: UserId) -> Result<&mut Actor, CommerceError> {
        self.actors
            .get_mut(&user)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "user",
                key: user.to_string(),
            })
    }

    fn wallet(&self, owner: UserId) -> Result<&Wallet, CommerceError> {
        self.wallets
            .get(&owner)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "wallet",
                key: owner.to_string(),
            })
    }

    fn wallet_mut(&mut self, owner: UserId) -> Result<&mut Wallet, CommerceError> {
        self.wallets
            .get_mut(&owner)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "wallet",
                key: owner.to_string(),
            })
    }

    /// Reverse lookup: wallet id to owning user.
    fn owner_of(&self, wallet: WalletId) -> Result<UserId, CommerceError> {
        self.wallets
            .values()
            .find(|w| w.id() == wallet)
            .map(|w| w.owner())
            .ok_or_else(|| CommerceError::NotFound {
                entity: "wallet",
                key: wallet.to_string(),
            })
    }

    fn course(&self, id: CourseId) -> Result<&Course, CommerceError> {
        self.courses.get(&id).ok_or_else(|| CommerceError::NotFound {
            entity: "course",
            key: id.to_string(),
        })
    }

    fn inventory(&self, course: CourseId) -> Result<&SlotInventory, CommerceError> {
        self.inventories
            .get(&course)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "course inventory",
                key: course.to_string(),
            })
    }

    fn inventory_mut(&mut self, course: CourseId) -> Result<&mut SlotInventory, CommerceError> {
        self.inventories
            .get_mut(&course)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "course inventory",
                key: course.to_string(),
            })
    }

    fn txn(&self, id: TransactionId) -> Result<&Transaction, CommerceError> {
        self.transactions
            .get(&id)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "transaction",
                key: id.to_string(),
            })
    }

    fn txn_mut(&mut self, id: TransactionId) -> Result<&mut Transaction, CommerceError> {
        self.transactions
            .get_mut(&id)
            .ok_or_else(|| CommerceError::NotFound {
                entity: "transaction",
                key: id.to_string(),
            })
    }

    /// Settles a pending transaction: credits the recipient and flips the
    /// status, in that order, so a failed credit leaves the transaction
    /// pending and retryable.
    ///
    /// Exchange offers never settle here; they carry a slot transfer and
    /// go through the owner-response path instead.
    fn settle(&mut self, id: TransactionId) -> Result<Transaction, CommerceError> {
        let (recipient_wallet, amount) = {
            let txn = self.txn(id)?;
            if txn.is_exchange() {
                return Err(CommerceError::ImpossibleOperation(format!(
                    "exchange offer {id} settles through the slot owner's response"
                )));
            }
            if !txn.is_pending() {
                return Err(TransactionError::AlreadyCompleted(id).into());
            }
            (txn.recipient_wallet, txn.amount)
        };

        let recipient = self.owner_of(recipient_wallet)?;
        self.wallet_mut(recipient)?.credit(amount)?;

        let txn = self.txn_mut(id)?;
        txn.complete()?;
        Ok(txn.clone())
    }
}

// ---------------------------------------------------------------------------
// CommerceHub
// ---------------------------------------------------------------------------

/// The commerce core's single entry point.
///
/// Generic over the [`Notifier`] so the web layer can plug in a real mail
/// sender while tests plug in a recorder.
pub struct CommerceHub<N: Notifier> {
    state: Mutex<HubState>,
    notifier: N,
}

impl<N: Notifier> CommerceHub<N> {
    /// Creates an empty hub with the given notification channel.
    pub fn new(notifier: N) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            notifier,
        }
    }

    /// Returns the notification channel. Mostly useful for asserting on
    /// deliveries in tests.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Delivers a token outside the state lock. The mutation is already
    /// committed; a failed delivery is logged, not propagated.
    fn dispatch(&self, recipient: UserId, token: &str, context_url: &str) {
        if let Err(err) = self.notifier.notify(recipient, token, context_url) {
            warn!(%recipient, error = %err, "verification token delivery failed");
        }
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Registers a new account.
    ///
    /// The account starts disabled and without a wallet; both arrive when
    /// the registration token is redeemed. An empty role list defaults to
    /// student. Returns the new user id and the token secret.
    pub fn register_user(&self, roles: Vec<Role>) -> (UserId, String) {
        let roles = if roles.is_empty() {
            vec![Role::Student]
        } else {
            roles
        };
        let actor = Actor::new(roles);
        let user = actor.id;
        let token = VerificationToken::for_registration(user);
        let secret = token.token.clone();

        {
            let mut state = self.state.lock();
            state.actors.insert(user, actor);
            state.tokens.insert(secret.clone(), token);
        }

        info!(user = %user, "user registered, awaiting activation");
        self.dispatch(user, &secret, REGISTRATION_VERIFY_URL);
        (user, secret)
    }

    /// Returns the actor record for a user.
    pub fn actor(&self, user: UserId) -> Result<Actor, CommerceError> {
        let state = self.state.lock();
        Ok(state.actor(user)?.clone())
    }

    /// Creates a zero-balance wallet for an existing user.
    ///
    /// Activation does this automatically; the explicit operation exists
    /// for accounts enabled through administrative channels.
    pub fn create_wallet(&self, user: UserId) -> Result<Wallet, CommerceError> {
        let mut state = self.state.lock();
        state.actor(user)?;
        if state.wallets.contains_key(&user) {
            return Err(CommerceError::DuplicateEntity {
                entity: "wallet",
                key: user.to_string(),
            });
        }
        let wallet = Wallet::new(user);
        state.wallets.insert(user, wallet.clone());
        info!(user = %user, wallet = %wallet.id(), "wallet created");
        Ok(wallet)
    }

    /// Returns a user's wallet. Owner, teacher, or admin only.
    pub fn wallet_of(&self, acting: UserId, owner: UserId) -> Result<Wallet, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_access(actor, owner, "wallet")?;
        Ok(state.wallet(owner)?.clone())
    }

    /// Returns a user's balance. Same access rule as [`wallet_of`](Self::wallet_of).
    pub fn balance_of(&self, acting: UserId, owner: UserId) -> Result<u64, CommerceError> {
        Ok(self.wallet_of(acting, owner)?.balance())
    }

    // -----------------------------------------------------------------------
    // Money movement
    // -----------------------------------------------------------------------

    /// Deposits funds into the acting user's own wallet.
    ///
    /// Deposits below [`MIN_DEPOSIT`] are rejected outright. A deposit at
    /// or below the pending threshold credits immediately; above it, the
    /// wallet stays untouched until the verification token is redeemed —
    /// the money comes from outside the ledger, so nothing is held.
    pub fn deposit(&self, acting: UserId, amount: u64) -> Result<Transaction, CommerceError> {
        let (txn, note) = {
            let mut state = self.state.lock();
            state.actor(acting)?;
            if amount < MIN_DEPOSIT {
                return Err(CommerceError::ImpossibleOperation(format!(
                    "deposit of {amount} is below the minimum of {MIN_DEPOSIT}"
                )));
            }
            let wallet_id = state.wallet(acting)?.id();
            let txn = Transaction::deposit(wallet_id, amount)?;

            let mut note = None;
            if txn.is_pending() {
                let token = VerificationToken::for_transaction(txn.id, acting);
                note = Some((acting, token.token.clone()));
                state.tokens.insert(token.token.clone(), token);
            } else {
                state.wallet_mut(acting)?.credit(amount)?;
            }
            state.transactions.insert(txn.id, txn.clone());
            info!(user = %acting, amount, status = %txn.status, "deposit recorded");
            (txn, note)
        };

        if let Some((user, token)) = note {
            self.dispatch(user, &token, TRANSACTION_VERIFY_URL);
        }
        Ok(txn)
    }

    /// Transfers funds from the acting user to another user.
    ///
    /// The sender is debited immediately regardless of status; above the
    /// pending threshold the recipient's credit waits for the sender's
    /// verification token. Transfers to one's own wallet are rejected.
    pub fn transfer(
        &self,
        acting: UserId,
        recipient: UserId,
        amount: u64,
    ) -> Result<Transaction, CommerceError> {
        let (txn, note) = {
            let mut state = self.state.lock();
            state.actor(acting)?;
            if acting == recipient {
                return Err(CommerceError::ImpossibleOperation(
                    "transfers to your own wallet are not permitted; use a deposit".into(),
                ));
            }
            let sender_id = state.wallet(acting)?.id();
            let recipient_wallet = state.wallet(recipient)?;
            let recipient_id = recipient_wallet.id();
            if recipient_wallet.balance().checked_add(amount).is_none() {
                return Err(CommerceError::ImpossibleOperation(
                    "transfer would overflow the recipient's balance".into(),
                ));
            }

            let txn = Transaction::transfer(sender_id, recipient_id, amount)?;
            state.wallet_mut(acting)?.debit(amount)?;

            let mut note = None;
            if txn.is_pending() {
                let token = VerificationToken::for_transaction(txn.id, acting);
                note = Some((acting, token.token.clone()));
                state.tokens.insert(token.token.clone(), token);
            } else {
                state.wallet_mut(recipient)?.credit(amount)?;
            }
            state.transactions.insert(txn.id, txn.clone());
            info!(
                sender = %acting,
                recipient = %recipient,
                amount,
                status = %txn.status,
                "transfer recorded"
            );
            (txn, note)
        };

        if let Some((user, token)) = note {
            self.dispatch(user, &token, TRANSACTION_VERIFY_URL);
        }
        Ok(txn)
    }

    /// Administrative settlement of a pending transaction, bypassing the
    /// token loop. Admin only; any outstanding token for the transaction
    /// is invalidated.
    pub fn complete_transaction(
        &self,
        acting: UserId,
        id: TransactionId,
    ) -> Result<Transaction, CommerceError> {
        let mut state = self.state.lock();
        let actor = state.actor(acting)?;
        if !actor.is_admin() {
            return Err(PolicyError::Unauthorized {
                actor: acting,
                resource: "transaction settlement",
            }
            .into());
        }
        let txn = state.settle(id)?;
        state.tokens.retain(|_, t| t.transaction != Some(id));
        info!(transaction = %id, admin = %acting, "transaction settled administratively");
        Ok(txn)
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Redeems a verification token.
    ///
    /// The lookup, the expiry check, the side effect, and the deletion all
    /// happen in one critical section, so a token applies its effect
    /// exactly once; a second redemption finds nothing. An expired token
    /// fails with [`CommerceError::ExpiredToken`] and stays in place — the
    /// distinct error tells the caller to request a fresh one.
    pub fn redeem(&self, token_string: &str) -> Result<Redemption, CommerceError> {
        let mut state = self.state.lock();
        let (verifier, linked) = {
            let token =
                state
                    .tokens
                    .get(token_string)
                    .ok_or_else(|| CommerceError::NotFound {
                        entity: "verification token",
                        key: token_string.to_string(),
                    })?;
            if token.is_expired(Utc::now()) {
                return Err(CommerceError::ExpiredToken {
                    expired_at: token.expires_at,
                });
            }
            (token.verifier, token.transaction)
        };

        let outcome = match linked {
            None => {
                let actor = state.actor_mut(verifier)?;
                actor.activate();
                if !state.wallets.contains_key(&verifier) {
                    state.wallets.insert(verifier, Wallet::new(verifier));
                }
                info!(user = %verifier, "account activated");
                Redemption::AccountActivated(verifier)
            }
            Some(txn_id) => {
                let txn = state.settle(txn_id)?;
                info!(transaction = %txn_id, amount = txn.amount, "pending transaction confirmed");
                Redemption::TransactionCompleted(txn)
            }
        };

        state.tokens.remove(token_string);
        Ok(outcome)
    }

    /// Returns the live token attached to a transaction. Only the token's
    /// verifier may read it.
    pub fn token_for_transaction(
        &self,
        acting: UserId,
        id: TransactionId,
    ) -> Result<VerificationToken, CommerceError> {
        let state = self.state.lock();
        state.actor(acting)?;
        let token = state
            .tokens
            .values()
            .find(|t| t.transaction == Some(id))
            .ok_or_else(|| CommerceError::NotFound {
                entity: "verification token",
                key: id.to_string(),
            })?;
        if token.verifier != acting {
            return Err(PolicyError::Unauthorized {
                actor: acting,
                resource: "verification token",
            }
            .into());
        }
        Ok(token.clone())
    }

    /// Shifts a stored token's validity window backward. Test hook for
    /// exercising expiry paths without a ten-minute wait.
    #[doc(hidden)]
    pub fn backdate_token(&self, token: &str, by: Duration) -> bool {
        let mut state = self.state.lock();
        match state.tokens.get_mut(token) {
            Some(t) => {
                t.backdate(by);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Courses & minting
    // -----------------------------------------------------------------------

    /// Creates a course with the acting user as creator. Teacher or admin
    /// only; the price must be positive.
    pub fn create_course(&self, acting: UserId, price: u64) -> Result<Course, CommerceError> {
        let mut state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_privileged(actor, "course creation")?;
        if price == 0 {
            return Err(CommerceError::ImpossibleOperation(
                "courses must have a positive price".into(),
            ));
        }
        let course = Course {
            id: CourseId::new(),
            creator: acting,
            price,
            created_at: Utc::now(),
        };
        state.courses.insert(course.id, course.clone());
        info!(course = %course.id, creator = %acting, price, "course created");
        Ok(course)
    }

    /// Returns a course record. The catalog is public; no gate.
    pub fn course(&self, id: CourseId) -> Result<Course, CommerceError> {
        let state = self.state.lock();
        Ok(state.course(id)?.clone())
    }

    /// Sets a course's slot inventory, once. Creator or admin only.
    pub fn initialize_inventory(
        &self,
        acting: UserId,
        course_id: CourseId,
        slot_count: u32,
    ) -> Result<(), CommerceError> {
        let mut state = self.state.lock();
        let actor = state.actor(acting)?;
        let creator = state.course(course_id)?.creator;
        policy::require_course_management(actor, creator)?;
        if state.inventories.contains_key(&course_id) {
            return Err(CommerceError::DuplicateEntity {
                entity: "course inventory",
                key: course_id.to_string(),
            });
        }
        let inventory = SlotInventory::initialize(course_id, slot_count)?;
        state.inventories.insert(course_id, inventory);
        info!(course = %course_id, slot_count, "slot inventory initialized");
        Ok(())
    }

    /// Purchases a course: claims the lowest available slot for the buyer
    /// and moves the price toward the creator's wallet.
    ///
    /// Order inside the critical section: duplicate-ownership,
    /// availability, and funds checks all pass before anything mutates,
    /// then the slot is claimed and the buyer charged. A purchase above
    /// the pending threshold holds the buyer's payment until the token is
    /// redeemed; the slot is theirs immediately either way.
    pub fn purchase_course(
        &self,
        acting: UserId,
        course_id: CourseId,
    ) -> Result<Transaction, CommerceError> {
        let (txn, note) = {
            let mut state = self.state.lock();
            state.actor(acting)?;
            let (creator, price) = {
                let course = state.course(course_id)?;
                (course.creator, course.price)
            };

            let buyer_wallet = state.wallet(acting)?;
            let (buyer_wid, available) = (buyer_wallet.id(), buyer_wallet.balance());
            if !buyer_wallet.can_cover(price) {
                return Err(CommerceError::InsufficientFunds {
                    wallet_id: buyer_wid,
                    available,
                    requested: price,
                });
            }
            let creator_wallet = state.wallet(creator)?;
            let creator_wid = creator_wallet.id();

            let txn = Transaction::purchase(buyer_wid, creator_wid, course_id, price)?;
            if !txn.is_pending() && creator_wallet.balance().checked_add(price).is_none() {
                return Err(CommerceError::ImpossibleOperation(
                    "purchase would overflow the creator's balance".into(),
                ));
            }

            let drop_number = state.inventory_mut(course_id)?.claim(acting)?.drop_number;
            state.wallet_mut(acting)?.debit(price)?;

            let mut note = None;
            if txn.is_pending() {
                let token = VerificationToken::for_transaction(txn.id, acting);
                note = Some((acting, token.token.clone()));
                state.tokens.insert(token.token.clone(), token);
            } else {
                state.wallet_mut(creator)?.credit(price)?;
            }
            state.transactions.insert(txn.id, txn.clone());
            info!(
                user = %acting,
                course = %course_id,
                drop_number,
                amount = price,
                status = %txn.status,
                "course slot minted"
            );
            (txn, note)
        };

        if let Some((user, token)) = note {
            self.dispatch(user, &token, TRANSACTION_VERIFY_URL);
        }
        Ok(txn)
    }

    /// Releases the acting user's slot back into the course inventory.
    /// No refund; the recycled slot becomes the next one claimed. Returns
    /// the released drop number.
    pub fn leave_course(&self, acting: UserId, course_id: CourseId) -> Result<u32, CommerceError> {
        let mut state = self.state.lock();
        state.actor(acting)?;
        let drop_number = state.inventory_mut(course_id)?.release(acting)?;
        info!(user = %acting, course = %course_id, drop_number, "course slot released");
        Ok(drop_number)
    }

    /// Marks the acting user's slot as completed. Idempotent.
    pub fn complete_course(&self, acting: UserId, course_id: CourseId) -> Result<(), CommerceError> {
        let mut state = self.state.lock();
        state.actor(acting)?;
        state.inventory_mut(course_id)?.mark_completed(acting)?;
        info!(user = %acting, course = %course_id, "course marked completed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Exchanges
    // -----------------------------------------------------------------------

    /// Opens an exchange offer: the acting user offers `amount` for
    /// `owner`'s minted slot in the course. The offered funds are held
    /// immediately and stay held until the owner responds.
    pub fn offer_exchange(
        &self,
        acting: UserId,
        course_id: CourseId,
        owner: UserId,
        amount: u64,
    ) -> Result<Transaction, CommerceError> {
        let mut state = self.state.lock();
        state.actor(acting)?;
        if acting == owner {
            return Err(CommerceError::ImpossibleOperation(
                "cannot offer an exchange for your own slot".into(),
            ));
        }
        {
            let inventory = state.inventory(course_id)?;
            if inventory.slot_of(owner).is_none() {
                return Err(MintError::NotOwned {
                    user: owner,
                    course: course_id,
                }
                .into());
            }
            if inventory.slot_of(acting).is_some() {
                return Err(MintError::AlreadyOwned {
                    user: acting,
                    course: course_id,
                }
                .into());
            }
        }
        let initiator_wid = state.wallet(acting)?.id();
        let owner_wid = state.wallet(owner)?.id();

        let txn = Transaction::exchange(initiator_wid, owner_wid, course_id, amount)?;
        state.wallet_mut(acting)?.debit(amount)?;
        state.transactions.insert(txn.id, txn.clone());
        info!(
            initiator = %acting,
            owner = %owner,
            course = %course_id,
            amount,
            "exchange offer opened"
        );
        Ok(txn)
    }

    /// Resolves an exchange offer. Only the slot owner may respond.
    ///
    /// Accepting moves the held funds to the owner and the slot to the
    /// initiator, and completes the transaction; the settled record is
    /// returned. Declining returns the held funds to the initiator and
    /// deletes the offer; `None` is returned.
    pub fn respond_to_exchange(
        &self,
        acting: UserId,
        id: TransactionId,
        accept: bool,
    ) -> Result<Option<Transaction>, CommerceError> {
        let mut state = self.state.lock();
        state.actor(acting)?;
        let (sender_wallet, recipient_wallet, amount, course_id) = {
            let txn = state.txn(id)?;
            if !txn.is_exchange() || !txn.is_pending() {
                return Err(CommerceError::ImpossibleOperation(format!(
                    "transaction {id} is not an open exchange offer"
                )));
            }
            let course = txn.course.ok_or_else(|| {
                CommerceError::ImpossibleOperation(format!(
                    "exchange offer {id} references no course"
                ))
            })?;
            (txn.sender_wallet, txn.recipient_wallet, txn.amount, course)
        };
        let initiator = state.owner_of(sender_wallet)?;
        let owner = state.owner_of(recipient_wallet)?;
        if acting != owner {
            return Err(PolicyError::Unauthorized {
                actor: acting,
                resource: "exchange offer",
            }
            .into());
        }

        if accept {
            if state.wallet(owner)?.balance().checked_add(amount).is_none() {
                return Err(CommerceError::ImpossibleOperation(
                    "accepting this offer would overflow the owner's balance".into(),
                ));
            }
            state.inventory_mut(course_id)?.transfer(owner, initiator)?;
            state.wallet_mut(owner)?.credit(amount)?;
            let txn = state.txn_mut(id)?;
            txn.complete()?;
            let txn = txn.clone();
            info!(offer = %id, new_owner = %initiator, amount, "exchange offer accepted");
            Ok(Some(txn))
        } else {
            state.wallet_mut(initiator)?.credit(amount)?;
            state.transactions.remove(&id);
            info!(offer = %id, "exchange offer declined, held funds returned");
            Ok(None)
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns one transaction. Participants, teachers, and admins only.
    pub fn transaction(
        &self,
        acting: UserId,
        id: TransactionId,
    ) -> Result<Transaction, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        let txn = state.txn(id)?;
        let sender = state.owner_of(txn.sender_wallet)?;
        let recipient = state.owner_of(txn.recipient_wallet)?;
        policy::require_transaction_access(actor, sender, recipient)?;
        Ok(txn.clone())
    }

    /// Returns a user's transactions, newest first. Owner, teacher, or
    /// admin only.
    pub fn transactions_for_user(
        &self,
        acting: UserId,
        user: UserId,
    ) -> Result<Vec<Transaction>, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_access(actor, user, "transaction history")?;
        let wallet_id = state.wallet(user)?.id();
        let mut list: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.sender_wallet == wallet_id || t.recipient_wallet == wallet_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Returns a course's transactions, newest first. Creator, teacher,
    /// or admin only.
    pub fn transactions_for_course(
        &self,
        acting: UserId,
        course_id: CourseId,
    ) -> Result<Vec<Transaction>, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        let creator = state.course(course_id)?.creator;
        policy::require_access(actor, creator, "course transactions")?;
        let mut list: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.course == Some(course_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Returns all transactions in a given status, newest first. Teacher
    /// or admin only.
    pub fn transactions_by_status(
        &self,
        acting: UserId,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_privileged(actor, "transaction listing")?;
        let mut list: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    /// Returns a user's slots across all courses, optionally filtered by
    /// completion. Owner, teacher, or admin only.
    pub fn slots_for_user(
        &self,
        acting: UserId,
        user: UserId,
        completed: Option<bool>,
    ) -> Result<Vec<OwnershipSlot>, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_access(actor, user, "course slots")?;
        let slots = state
            .inventories
            .values()
            .filter_map(|inv| inv.slot_of(user))
            .filter(|s| completed.map_or(true, |c| s.completed == c))
            .cloned()
            .collect();
        Ok(slots)
    }

    /// Returns a course's minted slots, optionally filtered by completion.
    /// Teacher or admin only.
    pub fn slots_for_course(
        &self,
        acting: UserId,
        course_id: CourseId,
        completed: Option<bool>,
    ) -> Result<Vec<OwnershipSlot>, CommerceError> {
        let state = self.state.lock();
        let actor = state.actor(acting)?;
        policy::require_privileged(actor, "slot listing")?;
        let inventory = state.inventory(course_id)?;
        Ok(inventory
            .minted_slots(completed)
            .into_iter()
            .cloned()
            .collect())
    }
}

impl Default for CommerceHub<crate::notify::NullNotifier> {
    fn default() -> Self {
        Self::new(crate::notify::NullNotifier)
    }
}
