//! Waiting on asynchronous managed operations.
//!
//! A caller submits work to a remote service, receives an [`OperationHandle`],
//! and uses an [`AsyncOperationWaiter`] to poll the status until the operation
//! is terminal. The result is fetched with a separate call that requires the
//! [`Completion`] witness produced on success.
//!
//! Remote services plug in through [`StatusSource`] and [`ManagedOperation`].

mod error;
mod operation;
mod source;
mod waiter;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{TransportError, WaitError, WaitResult};
pub use operation::{Completion, OperationHandle, OperationStatus, UNKNOWN_FAILURE_REASON};
pub use source::{ManagedOperation, StatusSource};
pub use waiter::{AsyncOperationWaiter, WaiterConfig, DEFAULT_POLL_INTERVAL};

// Token type accepted by `AsyncOperationWaiter::with_cancellation`
pub use tokio_util::sync::CancellationToken;
