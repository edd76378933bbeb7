use thiserror::Error;
use tokio::task::JoinError;

/// Why a message could not be handed to the state writer.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("mailbox full ({capacity} pending), rejected {message}")]
    MailboxFull { capacity: usize, message: String },

    #[error("state writer has stopped, dropped {message}")]
    Closed { message: String },

    #[error("invalid dispatch configuration: {message}")]
    InvalidConfig { message: String },

    #[error("failed to start state writer: {0}")]
    Spawn(#[from] std::io::Error),
}

impl DispatchError {
    pub fn is_mailbox_full(&self) -> bool {
        matches!(self, DispatchError::MailboxFull { .. })
    }
}

/// A worker job that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("worker job panicked: {0}")]
    Panicked(String),

    #[error("worker job was cancelled")]
    Cancelled,
}

impl From<JoinError> for WorkerError {
    fn from(error: JoinError) -> Self {
        match error.try_into_panic() {
            Ok(payload) => WorkerError::Panicked(crate::panic::describe(&*payload)),
            Err(_) => WorkerError::Cancelled,
        }
    }
}
