//! Crate-level error type for the service layer

use aws_service_bridge_waiter::WaitError;
use thiserror::Error;

use crate::aws::AwsError;
use crate::messaging::TopicError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the front ends to pick exit codes and HTTP statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    OperationFailed,
    Transport,
    Cancelled,
    TimedOut,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::OperationFailed => "operation_failed",
            Self::Transport => "transport_error",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Configuration => "configuration_error",
        }
    }
}

impl BridgeError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::Topic(_) => ErrorKind::InvalidInput,
            Self::Aws(AwsError::ConfigError(_)) => ErrorKind::Configuration,
            Self::Aws(AwsError::InvalidRequest(_)) => ErrorKind::InvalidInput,
            Self::Aws(_) | Self::Io(_) => ErrorKind::Transport,
            Self::Wait(WaitError::Transport(transport)) => {
                // Athena rejects malformed SQL at submit time
                match transport.source_as::<AwsError>() {
                    Some(AwsError::InvalidRequest(_)) => ErrorKind::InvalidInput,
                    _ => ErrorKind::Transport,
                }
            }
            Self::Wait(WaitError::OperationFailed(_)) => ErrorKind::OperationFailed,
            Self::Wait(WaitError::Cancelled) => ErrorKind::Cancelled,
            Self::Wait(WaitError::TimedOut { .. }) => ErrorKind::TimedOut,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
