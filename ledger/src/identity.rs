//! # Identity — Acting Users and Roles
//!
//! The commerce core never authenticates anyone. The web layer hands us an
//! already-authenticated [`Actor`] — an id, a role set, and an enabled flag
//! — and everything downstream reasons about that value alone.
//!
//! Roles are a small closed enumeration, not a runtime list of strings.
//! There are exactly three, there will probably always be exactly three,
//! and the compiler gets to check every match.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for a platform user.
///
/// A UUID newtype so that a user id can never be confused with a wallet,
/// transaction, or course id at compile time. Relationships between
/// entities are foreign-key-style lookups on these ids — no embedded
/// object graphs, no cyclic ownership.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random user id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The closed set of platform roles.
///
/// A user can hold more than one role (a teacher is usually also a student
/// of other courses). Privilege checks care about two facts only: "is this
/// an admin" and "is this a teacher or admin" — both are methods on
/// [`Actor`], not scattered comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Enrolls in courses, pays for them, completes lectures.
    Student,
    /// Creates courses and may inspect commerce records related to them.
    Teacher,
    /// Full access. Can read and correct anything.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Teacher => write!(f, "Teacher"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// An authenticated user as seen by the commerce core.
///
/// `enabled` starts out `false` at registration and flips to `true` exactly
/// once, when the user's registration verification token is redeemed. A
/// disabled actor exists but cannot transact — it has no wallet yet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    /// The user this actor represents.
    pub id: UserId,

    /// All roles held. Never empty in practice; a bare registration gets
    /// `[Role::Student]`.
    pub roles: Vec<Role>,

    /// Whether the account has been activated via its registration token.
    pub enabled: bool,
}

impl Actor {
    /// Creates a new, not-yet-activated actor with the given roles.
    pub fn new(roles: Vec<Role>) -> Self {
        Self {
            id: UserId::new(),
            roles,
            enabled: false,
        }
    }

    /// Creates an already-activated actor. Test and fixture convenience.
    pub fn enabled(roles: Vec<Role>) -> Self {
        Self {
            id: UserId::new(),
            roles,
            enabled: true,
        }
    }

    /// Returns `true` if the actor holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` if the actor holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns `true` if the actor holds the teacher role.
    pub fn is_teacher(&self) -> bool {
        self.has_role(Role::Teacher)
    }

    /// Returns `true` if the actor is a teacher or an admin — the
    /// privileged tier for read access to other users' commerce records.
    pub fn is_teacher_or_admin(&self) -> bool {
        self.is_teacher() || self.is_admin()
    }

    /// Marks the account as activated. Called on registration-token
    /// redemption; calling it twice is harmless.
    pub fn activate(&mut self) {
        self.enabled = true;
    }
}
