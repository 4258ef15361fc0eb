//! Outgoing e-mail.
//!
//! Slices build an [`Email`] and hand it to the shared [`Mailer`]; the transport decides
//! what delivery means. [`LogTransport`] writes to the tracing pipeline, [`MemoryTransport`]
//! keeps messages for inspection in tests.

mod error;

pub use error::{MailError, MailErrorExt};

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { to: to.into(), subject: subject.into(), body: body.into() }
    }
}

/// Delivery backend.
pub trait MailTransport: Debug + Send + Sync {
    fn deliver(&self, email: &Email) -> Result<(), MailError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn deliver(&self, email: &Email) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, body = %email.body, "Outgoing e-mail");
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    outbox: Arc<Mutex<Vec<Email>>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn outbox(&self) -> Vec<Email> {
        self.outbox.lock().clone()
    }
}

impl MailTransport for MemoryTransport {
    fn deliver(&self, email: &Email) -> Result<(), MailError> {
        self.outbox.lock().push(email.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
}

impl Default for Mailer {
    fn default() -> Self {
        Self::log()
    }
}

impl Mailer {
    pub fn new(transport: impl MailTransport + 'static) -> Self {
        Self { transport: Arc::new(transport) }
    }

    #[must_use]
    pub fn log() -> Self {
        Self::new(LogTransport)
    }

    /// A mailer backed by memory, plus a handle to read what was sent.
    #[must_use]
    pub fn memory() -> (Self, MemoryTransport) {
        let transport = MemoryTransport::default();
        (Self::new(transport.clone()), transport)
    }

    /// Sends one message.
    ///
    /// # Errors
    /// [`MailError::Invalid`] for an empty recipient or subject, or the transport's error.
    pub fn send(&self, email: &Email) -> Result<(), MailError> {
        if email.to.trim().is_empty() || !email.to.contains('@') {
            return Err(MailError::Invalid { message: "recipient is missing".into(), context: None });
        }
        if email.subject.trim().is_empty() {
            return Err(MailError::Invalid { message: "subject is empty".into(), context: None });
        }
        self.transport.deliver(email)
    }

    /// Sends and logs failures instead of returning them. For notifications that must not
    /// fail the request that triggered them.
    pub fn notify(&self, email: &Email) {
        if let Err(err) = self.send(email) {
            warn!(to = %email.to, error = %err, "Failed to send e-mail");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_transport_captures_messages() {
        let (mailer, outbox) = Mailer::memory();
        mailer.send(&Email::new("ada@example.com", "Hello", "Body")).unwrap();
        assert_eq!(outbox.outbox(), vec![Email::new("ada@example.com", "Hello", "Body")]);
    }

    #[test]
    fn invalid_messages_are_rejected() {
        let (mailer, outbox) = Mailer::memory();
        assert!(matches!(
            mailer.send(&Email::new("", "Hello", "Body")),
            Err(MailError::Invalid { .. })
        ));
        assert!(matches!(
            mailer.send(&Email::new("ada@example.com", " ", "Body")),
            Err(MailError::Invalid { .. })
        ));
        mailer.notify(&Email::new("nobody", "Hi", ""));
        assert!(outbox.outbox().is_empty());
    }
}
