//! # Course-Ownership Minting
//!
//! Every course sells a fixed number of ownership slots — NFT-style proofs
//! of purchase with a scarce, ordered supply. The course creator sets the
//! inventory size once; buyers then claim slots one at a time in ascending
//! drop-number order (first available, never random), and a user can hold
//! at most one slot per course.
//!
//! ## Invariants
//!
//! - Drop numbers within a course are contiguous starting at 1, forever.
//!   Releasing a slot recycles it (owner cleared, minted cleared) instead
//!   of deleting the record, precisely so this invariant survives churn.
//! - The number of minted slots never exceeds the initialized inventory.
//! - No two owners ever hold the same drop number.
//!
//! Claiming is check-then-mutate inside a single `&mut self` call; the hub
//! serializes those calls, so two concurrent purchases of the last slot
//! can't both pass the availability check.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use campus_ledger::identity::UserId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during slot inventory operations.
#[derive(Debug, Error)]
pub enum MintError {
    /// The buyer already holds a slot for this course.
    #[error("user {user} already owns a slot for course {course}")]
    AlreadyOwned {
        /// The buyer who was turned away.
        user: UserId,
        /// The course in question.
        course: CourseId,
    },

    /// Every slot in the inventory is minted.
    #[error("there are no available mints for course {0}")]
    Exhausted(CourseId),

    /// The user holds no slot for this course, so there is nothing to
    /// release or complete.
    #[error("user {user} holds no slot for course {course}")]
    NotOwned {
        /// The user without a slot.
        user: UserId,
        /// The course in question.
        course: CourseId,
    },

    /// Inventory size must be at least one slot.
    #[error("cannot initialize an empty inventory for course {0}")]
    EmptyInventory(CourseId),
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Unique identifier for a course.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Generates a fresh random course id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an ownership slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(Uuid);

impl SlotId {
    /// Generates a fresh random slot id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// OwnershipSlot
// ---------------------------------------------------------------------------

/// A single ownership slot within a course's inventory.
///
/// Unminted slots have no owner. Minting attaches an owner and sets the
/// flag in the same step — there is never a minted slot without an owner
/// or an owner on an unminted slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnershipSlot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// The course this slot belongs to. Fixed for the slot's lifetime.
    pub course: CourseId,
    /// Position within the course's drop sequence, starting at 1.
    pub drop_number: u32,
    /// Whether the slot has been sold.
    pub minted: bool,
    /// Whether the owner finished all of the course's lectures.
    pub completed: bool,
    /// Current owner, `None` until minted.
    pub owner: Option<UserId>,
}

impl OwnershipSlot {
    fn new(course: CourseId, drop_number: u32) -> Self {
        Self {
            id: SlotId::new(),
            course,
            drop_number,
            minted: false,
            completed: false,
            owner: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SlotInventory
// ---------------------------------------------------------------------------

/// The complete slot inventory of one course.
///
/// Slots are created in bulk when the creator sets the inventory size and
/// kept in ascending drop-number order. Claims consume the lowest unminted
/// drop number; releases recycle the slot back into inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotInventory {
    /// The course this inventory belongs to.
    course: CourseId,
    /// All slots, ordered by drop number (index `i` holds drop `i + 1`).
    slots: Vec<OwnershipSlot>,
}

impl SlotInventory {
    /// Creates an inventory of `slot_count` unminted slots with contiguous
    /// drop numbers `1..=slot_count`.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::EmptyInventory`] if `slot_count` is 0.
    pub fn initialize(course: CourseId, slot_count: u32) -> Result<Self, MintError> {
        if slot_count == 0 {
            return Err(MintError::EmptyInventory(course));
        }
        let slots = (1..=slot_count)
            .map(|drop| OwnershipSlot::new(course, drop))
            .collect();
        Ok(Self { course, slots })
    }

    /// Returns the course this inventory belongs to.
    pub fn course(&self) -> CourseId {
        self.course
    }

    /// Returns the total number of slots (minted or not).
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of minted slots.
    pub fn minted_count(&self) -> usize {
        self.slots.iter().filter(|s| s.minted).count()
    }

    /// Returns the number of unminted slots still available.
    pub fn available(&self) -> usize {
        self.size() - self.minted_count()
    }

    /// Returns the slot owned by `user`, if any.
    pub fn slot_of(&self, user: UserId) -> Option<&OwnershipSlot> {
        self.slots
            .iter()
            .find(|s| s.minted && s.owner == Some(user))
    }

    /// Returns all slots, ordered by drop number.
    pub fn all_slots(&self) -> &[OwnershipSlot] {
        &self.slots
    }

    /// Returns minted slots, optionally filtered by completion state.
    pub fn minted_slots(&self, completed: Option<bool>) -> Vec<&OwnershipSlot> {
        self.slots
            .iter()
            .filter(|s| s.minted && completed.map_or(true, |c| s.completed == c))
            .collect()
    }

    /// Claims the lowest-drop-number unminted slot for `buyer`.
    ///
    /// Check-then-mutate in one call: the duplicate-ownership check, the
    /// slot selection, and the claim happen on the same exclusive borrow.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::AlreadyOwned`] if `buyer` already holds a slot
    /// for this course and [`MintError::Exhausted`] if no unminted slot
    /// remains. Neither failure mutates anything.
    pub fn claim(&mut self, buyer: UserId) -> Result<&OwnershipSlot, MintError> {
        if self.slot_of(buyer).is_some() {
            return Err(MintError::AlreadyOwned {
                user: buyer,
                course: self.course,
            });
        }

        let course = self.course;
        let slot = self
            .slots
            .iter_mut()
            .find(|s| !s.minted)
            .ok_or(MintError::Exhausted(course))?;

        slot.minted = true;
        slot.owner = Some(buyer);
        slot.completed = false;
        Ok(slot)
    }

    /// Releases `owner`'s slot back into inventory.
    ///
    /// The slot is recycled — owner cleared, minted cleared, completion
    /// cleared — rather than deleted, so drop numbers stay contiguous. The
    /// recycled slot becomes the lowest available drop and will be the
    /// next one claimed.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::NotOwned`] if `owner` holds no slot here.
    pub fn release(&mut self, owner: UserId) -> Result<u32, MintError> {
        let course = self.course;
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.minted && s.owner == Some(owner))
            .ok_or(MintError::NotOwned {
                user: owner,
                course,
            })?;

        let drop_number = slot.drop_number;
        slot.minted = false;
        slot.owner = None;
        slot.completed = false;
        Ok(drop_number)
    }

    /// Marks `owner`'s slot as completed.
    ///
    /// Idempotent: completing an already-completed slot is a no-op. This
    /// is a non-monetary flag, so at-least-once delivery is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`MintError::NotOwned`] if `owner` holds no slot here.
    pub fn mark_completed(&mut self, owner: UserId) -> Result<(), MintError> {
        let course = self.course;
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.minted && s.owner == Some(owner))
            .ok_or(MintError::NotOwned {
                user: owner,
                course,
            })?;

        slot.completed = true;
        Ok(())
    }

    /// Transfers `from`'s slot to `to` (exchange settlement).
    ///
    /// # Errors
    ///
    /// Returns [`MintError::NotOwned`] if `from` holds no slot and
    /// [`MintError::AlreadyOwned`] if `to` already holds one.
    pub fn transfer(&mut self, from: UserId, to: UserId) -> Result<u32, MintError> {
        let course = self.course;
        if self.slot_of(to).is_some() {
            return Err(MintError::AlreadyOwned { user: to, course });
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.minted && s.owner == Some(from))
            .ok_or(MintError::NotOwned {
                user: from,
                course,
            })?;

        slot.owner = Some(to);
        slot.completed = false;
        Ok(slot.drop_number)
    }
}
