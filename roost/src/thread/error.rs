use std::time::Duration;
use thiserror::Error;

use roost_api::errors::ActorError;

/// Errors related to enqueue operations on a worker's queue tiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Mailbox is full (capacity: {capacity})")]
    Full { capacity: usize },
    #[error("Mailbox is closed")]
    Closed,
    #[error("Message has no destination")]
    MissingDestination,
    #[error("Enqueue timed out after {0:?}")]
    Timeout(Duration),
    #[error("Not running on a worker thread")]
    NotOnWorker,
}

// Lets receive behavior forward with `?`.
impl From<MailboxError> for ActorError {
    fn from(error: MailboxError) -> Self {
        ActorError::Other(anyhow::Error::new(error))
    }
}

/// Errors related to starting, configuring and stopping workers.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Thread setup error: {0}")]
    ThreadSetupError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
    #[error("Thread pool has no workers")]
    NoWorkers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            MailboxError::Full { capacity: 8 }.to_string(),
            "Mailbox is full (capacity: 8)"
        );
        assert_eq!(
            MailboxError::Timeout(Duration::from_millis(5)).to_string(),
            "Enqueue timed out after 5ms"
        );
        assert_eq!(
            SystemError::ConfigError("queue_size must be positive".into()).to_string(),
            "Configuration error: queue_size must be positive"
        );
    }

    #[test]
    fn test_mailbox_error_into_actor_error() {
        let error: ActorError = MailboxError::Closed.into();
        assert!(matches!(error, ActorError::Other(_)));
        assert_eq!(error.to_string(), "Mailbox is closed");
    }
}
