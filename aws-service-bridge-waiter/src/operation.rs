//! Operation data model: handles, status snapshots and the completion witness

use std::fmt;
use std::time::Duration;

/// Placeholder reason used when the remote side reports a failure without a message
pub const UNKNOWN_FAILURE_REASON: &str = "Unknown error";

/// Opaque identifier of a remote asynchronous operation.
///
/// Issued by the remote service on submission and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OperationHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One status snapshot returned by a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Queued,
    Running,
    Succeeded,
    /// The operation ran and ended in failure
    Failed(String),
    /// The operation was cancelled on the remote side
    Cancelled(String),
}

impl OperationStatus {
    /// Build a `Failed` status, substituting the placeholder reason for a missing one
    pub fn failed(reason: Option<&str>) -> Self {
        Self::Failed(normalize_reason(reason))
    }

    /// Build a `Cancelled` status, substituting the placeholder reason for a missing one
    pub fn cancelled(reason: Option<&str>) -> Self {
        Self::Cancelled(normalize_reason(reason))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Cancelled(_))
    }

    /// Short state label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed(_) => "FAILED",
            Self::Cancelled(_) => "CANCELLED",
        }
    }
}

fn normalize_reason(reason: Option<&str>) -> String {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => UNKNOWN_FAILURE_REASON.to_string(),
    }
}

/// Proof that a handle was observed in the `Succeeded` state.
///
/// Only the waiter constructs this, and result fetching requires it, so a
/// fetch for an operation that has not succeeded cannot be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    handle: OperationHandle,
    polls: u32,
    elapsed: Duration,
}

impl Completion {
    pub(crate) fn new(handle: OperationHandle, polls: u32, elapsed: Duration) -> Self {
        Self {
            handle,
            polls,
            elapsed,
        }
    }

    pub fn handle(&self) -> &OperationHandle {
        &self.handle
    }

    /// Number of status polls it took to observe success
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
