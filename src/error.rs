//! Failure taxonomy for blocking operations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;

use thiserror::Error;

use crate::dispatch::{DispatchError, Envelope, Program, Store, WorkerError};

/// Failure of a request to an external service or the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ApiError {
    #[error("no connection: {message}")]
    NoConnection { message: String },

    #[error("timed out: {message}")]
    Timeout { message: String },

    /// The service answered with an error status and a readable message.
    #[error("{code}: {message}")]
    WithMessage {
        title: Option<String>,
        message: String,
        code: u16,
    },

    /// Local I/O failed at `location`. `code` is the status a remote peer
    /// reported, or 0 for purely local failures.
    #[error("I/O error at {location} ({code}): {problem}")]
    Io {
        location: String,
        code: u16,
        problem: String,
    },

    #[error("cannot resolve {uri}")]
    Resolver { uri: String },

    #[error("service error: {message}")]
    Service { message: String },
}

impl ApiError {
    /// Classifies an `io::Error` raised while working on `location`.
    pub fn from_io(location: impl Into<String>, error: &io::Error) -> Self {
        let location = location.into();
        match error.kind() {
            io::ErrorKind::TimedOut => ApiError::Timeout {
                message: format!("{location}: {error}"),
            },
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => ApiError::NoConnection {
                message: format!("{location}: {error}"),
            },
            io::ErrorKind::NotFound => ApiError::Resolver { uri: location },
            _ => ApiError::Io {
                location,
                code: 0,
                problem: error.to_string(),
            },
        }
    }

    /// Status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::WithMessage { code, .. } => Some(*code),
            ApiError::Io { code, .. } if *code != 0 => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404) || matches!(self, ApiError::Resolver { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}

impl From<WorkerError> for ApiError {
    fn from(error: WorkerError) -> Self {
        ApiError::Service {
            message: error.to_string(),
        }
    }
}

/// An error paired with the envelope whose processing produced it.
///
/// Re-submitting the envelope with [`retry`](Self::retry) runs the whole
/// unit again; nothing assumes that is idempotent.
pub struct Retryable<P: Program, E> {
    pub msg: Envelope<P>,
    pub error: E,
}

impl<P: Program, E> Retryable<P, E> {
    pub fn new(msg: Envelope<P>, error: E) -> Self {
        Self { msg, error }
    }

    pub fn retry(&self, store: &Store<P>) -> Result<(), DispatchError> {
        store.dispatch(self.msg.clone())
    }

    pub fn map<E2>(self, f: impl FnOnce(E) -> E2) -> Retryable<P, E2> {
        Retryable {
            msg: self.msg,
            error: f(self.error),
        }
    }
}

impl<P: Program, E: Clone> Clone for Retryable<P, E> {
    fn clone(&self) -> Self {
        Self {
            msg: self.msg.clone(),
            error: self.error.clone(),
        }
    }
}

impl<P: Program, E: fmt::Debug> fmt::Debug for Retryable<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retryable")
            .field("msg", &self.msg)
            .field("error", &self.error)
            .finish()
    }
}

impl<P: Program, E: PartialEq> PartialEq for Retryable<P, E> {
    fn eq(&self, other: &Self) -> bool {
        self.msg == other.msg && self.error == other.error
    }
}

impl<P: Program, E: Eq> Eq for Retryable<P, E> where P::Msg: Eq {}

impl<P: Program, E: Hash> Hash for Retryable<P, E>
where
    P::Msg: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.msg.hash(state);
        self.error.hash(state);
    }
}

impl<P: Program, E: fmt::Display> fmt::Display for Retryable<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (while handling {:?})", self.error, self.msg)
    }
}

impl<P: Program, E: std::error::Error + 'static> std::error::Error for Retryable<P, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
