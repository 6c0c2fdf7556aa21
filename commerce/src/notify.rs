//! # Outbound Notification
//!
//! The commerce core never sends email itself — it hands the token string
//! to an injected [`Notifier`] and moves on. The trait is the narrow
//! interface the surrounding web layer implements with a real mail sender;
//! this crate ships a [`NullNotifier`] that just logs and a
//! [`RecordingNotifier`] for asserting on deliveries in tests.
//!
//! The hub always calls the notifier *after* releasing its state lock, so
//! a slow mail server can never stall a balance or slot mutation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use campus_ledger::identity::UserId;

/// Errors that can occur while dispatching a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The delivery channel rejected the message.
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// A single outbound token delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The user the token is addressed to.
    pub recipient: UserId,
    /// The verification token string being delivered.
    pub token: String,
    /// Where redeeming the token leads ("/verify/registration",
    /// "/verify/transaction", ...). Free-form, owned by the web layer.
    pub context_url: String,
}

/// Delivery channel for verification tokens.
///
/// Implementations must be cheap to call or internally queued — the hub
/// calls this on the request path (outside its lock, but the caller is
/// still waiting).
pub trait Notifier: Send + Sync {
    /// Delivers `token` to `recipient` with a redemption context.
    fn notify(&self, recipient: UserId, token: &str, context_url: &str)
        -> Result<(), NotifyError>;
}

/// A notifier that logs the delivery and succeeds.
///
/// The default for environments without a mail channel (local development,
/// most tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(
        &self,
        recipient: UserId,
        token: &str,
        context_url: &str,
    ) -> Result<(), NotifyError> {
        info!(%recipient, context_url, token_len = token.len(), "verification token issued");
        Ok(())
    }
}

/// A notifier that records every delivery for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything sent so far, in order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Returns the most recent delivery, if any.
    pub fn last(&self) -> Option<Notification> {
        self.sent.lock().last().cloned()
    }

    /// Returns how many notifications were sent.
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        recipient: UserId,
        token: &str,
        context_url: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().push(Notification {
            recipient,
            token: token.to_string(),
            context_url: context_url.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_notifier_always_succeeds() {
        let n = NullNotifier;
        assert!(n.notify(UserId::new(), "abc", "/verify").is_ok());
    }

    #[test]
    fn recording_notifier_captures_deliveries() {
        let n = RecordingNotifier::new();
        let user = UserId::new();
        n.notify(user, "tok-1", "/verify/registration").unwrap();
        n.notify(user, "tok-2", "/verify/transaction").unwrap();

        assert_eq!(n.count(), 2);
        let last = n.last().unwrap();
        assert_eq!(last.token, "tok-2");
        assert_eq!(last.recipient, user);
        assert_eq!(last.context_url, "/verify/transaction");
    }
}
