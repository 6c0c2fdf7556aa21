//! # Authorization Policy
//!
//! One rule, applied uniformly across the whole commerce core: an actor may
//! touch a resource if the actor **is** the resource's owner (or, for
//! transactions, a participant), or if the actor holds a privileged role.
//!
//! The policy is a handful of pure predicate functions plus `require_*`
//! wrappers that turn a `false` into a structured [`PolicyError`] so call
//! sites can use `?`. No dispatch, no middleware, no context objects — the
//! inputs are the acting user and the owner id, and the output is a bool.
//!
//! Every read and write endpoint in the ledger, transaction, verification,
//! and minting components calls into this module before acting. A failed
//! check is always an error surfaced to the caller, never a silent no-op.

use thiserror::Error;

use crate::identity::{Actor, UserId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The single failure mode of the policy layer.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The acting user is neither the owner/participant nor privileged.
    #[error("user {actor} is not authorized to access this {resource}")]
    Unauthorized {
        /// The acting user who was turned away.
        actor: UserId,
        /// Short resource label for the error message ("wallet",
        /// "transaction", "course inventory", ...).
        resource: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// May `actor` access a resource owned by `owner`?
///
/// True when the actor is the owner, or holds the teacher or admin role.
pub fn can_access(actor: &Actor, owner: UserId) -> bool {
    actor.id == owner || actor.is_teacher_or_admin()
}

/// May `actor` access a transaction between `sender` and `recipient`?
///
/// Participants see their own transactions; teachers and admins see all.
pub fn can_access_transaction(actor: &Actor, sender: UserId, recipient: UserId) -> bool {
    actor.id == sender || actor.id == recipient || actor.is_teacher_or_admin()
}

/// May `actor` manage a course created by `creator`?
///
/// Course management (inventory initialization, course-level transaction
/// listings) is for the creator or an admin. Being some *other* teacher is
/// not enough — a teacher's privilege over commerce records stops at
/// courses they created.
pub fn can_manage_course(actor: &Actor, creator: UserId) -> bool {
    actor.id == creator || actor.is_admin()
}

/// May `actor` use the privileged platform-wide listings (all transactions
/// by status, all owners of a course's slots)?
pub fn is_privileged(actor: &Actor) -> bool {
    actor.is_teacher_or_admin()
}

// ---------------------------------------------------------------------------
// Require wrappers
// ---------------------------------------------------------------------------

/// Errors with [`PolicyError::Unauthorized`] unless [`can_access`] holds.
pub fn require_access(actor: &Actor, owner: UserId, resource: &'static str) -> Result<(), PolicyError> {
    if can_access(actor, owner) {
        Ok(())
    } else {
        Err(PolicyError::Unauthorized {
            actor: actor.id,
            resource,
        })
    }
}

/// Errors unless [`can_access_transaction`] holds.
pub fn require_transaction_access(
    actor: &Actor,
    sender: UserId,
    recipient: UserId,
) -> Result<(), PolicyError> {
    if can_access_transaction(actor, sender, recipient) {
        Ok(())
    } else {
        Err(PolicyError::Unauthorized {
            actor: actor.id,
            resource: "transaction",
        })
    }
}

/// Errors unless [`can_manage_course`] holds.
pub fn require_course_management(actor: &Actor, creator: UserId) -> Result<(), PolicyError> {
    if can_manage_course(actor, creator) {
        Ok(())
    } else {
        Err(PolicyError::Unauthorized {
            actor: actor.id,
            resource: "course inventory",
        })
    }
}

/// Errors unless the actor is teacher or admin.
pub fn require_privileged(actor: &Actor, resource: &'static str) -> Result<(), PolicyError> {
    if is_privileged(actor) {
        Ok(())
    } else {
        Err(PolicyError::Unauthorized {
            actor: actor.id,
            resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    #[test]
    fn owner_can_access_own_resource() {
        let actor = Actor::enabled(vec![Role::Student]);
        assert!(can_access(&actor, actor.id));
        assert!(require_access(&actor, actor.id, "wallet").is_ok());
    }

    #[test]
    fn stranger_cannot_access_foreign_resource() {
        let actor = Actor::enabled(vec![Role::Student]);
        let other = UserId::new();
        assert!(!can_access(&actor, other));
        assert!(matches!(
            require_access(&actor, other, "wallet"),
            Err(PolicyError::Unauthorized { .. })
        ));
    }

    #[test]
    fn teacher_and_admin_can_access_foreign_resources() {
        let teacher = Actor::enabled(vec![Role::Teacher]);
        let admin = Actor::enabled(vec![Role::Admin]);
        let other = UserId::new();
        assert!(can_access(&teacher, other));
        assert!(can_access(&admin, other));
    }

    #[test]
    fn transaction_access_for_participants_only() {
        let sender = Actor::enabled(vec![Role::Student]);
        let recipient = Actor::enabled(vec![Role::Student]);
        let stranger = Actor::enabled(vec![Role::Student]);

        assert!(can_access_transaction(&sender, sender.id, recipient.id));
        assert!(can_access_transaction(&recipient, sender.id, recipient.id));
        assert!(!can_access_transaction(&stranger, sender.id, recipient.id));
    }

    #[test]
    fn course_management_excludes_unrelated_teachers() {
        let creator = Actor::enabled(vec![Role::Teacher]);
        let other_teacher = Actor::enabled(vec![Role::Teacher]);
        let admin = Actor::enabled(vec![Role::Admin]);

        assert!(can_manage_course(&creator, creator.id));
        assert!(!can_manage_course(&other_teacher, creator.id));
        assert!(can_manage_course(&admin, creator.id));
    }

    #[test]
    fn privileged_listings_gate() {
        let student = Actor::enabled(vec![Role::Student]);
        let teacher = Actor::enabled(vec![Role::Teacher]);
        assert!(require_privileged(&student, "status listing").is_err());
        assert!(require_privileged(&teacher, "status listing").is_ok());
    }
}
