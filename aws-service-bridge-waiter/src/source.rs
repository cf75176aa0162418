//! Collaborator traits implemented by remote-operation backends

use async_trait::async_trait;

use crate::error::TransportError;
use crate::operation::{Completion, OperationHandle, OperationStatus};

/// Something that can report the current status of an operation.
///
/// Each call must perform one status check and return a fresh snapshot.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, TransportError>;
}

/// A remote asynchronous operation with the submit / poll / fetch lifecycle.
#[async_trait]
pub trait ManagedOperation: StatusSource {
    /// What the caller submits (e.g. a SQL string)
    type Request: Send;
    /// The payload retrievable after success
    type Output: Send;

    /// Start the remote operation and return its handle
    async fn submit(&self, request: Self::Request) -> Result<OperationHandle, TransportError>;

    /// Retrieve the payload of a succeeded operation
    async fn fetch_result(&self, completion: &Completion) -> Result<Self::Output, TransportError>;

    /// Ask the remote side to stop an operation the caller no longer waits for.
    ///
    /// Backends without a stop call keep the default no-op.
    async fn abandon(&self, _handle: &OperationHandle) -> Result<(), TransportError> {
        Ok(())
    }
}
