//! Error types for waiting on managed operations

use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A remote call made by a collaborator failed (network, auth, malformed request).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Downcast the underlying cause, if any, to a concrete error type
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<E>())
    }
}

/// Why a wait ended without a result. Every variant is terminal for the wait.
#[derive(Debug, Error)]
pub enum WaitError {
    /// A submit, status or fetch call failed; not retried.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The operation reached a failed or cancelled terminal state.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The waiting task was cancelled by its caller.
    #[error("Wait was cancelled")]
    Cancelled,

    /// No terminal state within the configured bound.
    #[error("Operation did not finish after {polls} polls ({elapsed:?})")]
    TimedOut { polls: u32, elapsed: Duration },
}

impl WaitError {
    /// Stable, machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::OperationFailed(_) => "operation_failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut { .. } => "timed_out",
        }
    }

    /// The caller gave up on the operation while it may still be running remotely
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Cancelled | Self::TimedOut { .. })
    }
}

pub type WaitResult<T> = Result<T, WaitError>;
