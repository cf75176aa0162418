//! Poll-until-terminal waiter.
//!
//! The waiter sleeps for the poll interval, checks the status once, and repeats
//! until the operation reaches a terminal state, the caller cancels, or the
//! optional bound is exhausted. Polls for one handle are strictly sequential.

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{WaitError, WaitResult};
use crate::operation::{Completion, OperationHandle, OperationStatus};
use crate::source::{ManagedOperation, StatusSource};

/// Interval between status checks when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling parameters for [`AsyncOperationWaiter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaiterConfig {
    /// Sleep before every status check
    pub poll_interval: Duration,
    /// Give up with `TimedOut` after this many non-terminal polls
    pub max_polls: Option<u32>,
    /// Give up with `TimedOut` once this much time has passed since the wait began
    pub timeout: Option<Duration>,
    /// On cancellation or timeout, ask the backend to stop the remote operation
    pub abandon_on_abort: bool,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            timeout: None,
            abandon_on_abort: true,
        }
    }
}

impl WaiterConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_abandon_on_abort(mut self, abandon: bool) -> Self {
        self.abandon_on_abort = abandon;
        self
    }
}

/// Drives a status source to a terminal state.
///
/// One waiter serves one in-flight wait at a time; concurrent waits should use
/// separate instances. Cancellation is cooperative: cancelling the token aborts
/// the current sleep or status call, and the token is left cancelled.
#[derive(Debug, Clone)]
pub struct AsyncOperationWaiter {
    config: WaiterConfig,
    cancellation: CancellationToken,
}

impl AsyncOperationWaiter {
    pub fn new(config: WaiterConfig) -> Self {
        Self {
            config,
            cancellation: CancellationToken::new(),
        }
    }

    /// Use the caller's cancellation token instead of a private one
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &WaiterConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Poll `handle` until it succeeds, returning the completion witness.
    ///
    /// Failed and cancelled terminal states become `WaitError::OperationFailed`.
    /// A transport error from the status check ends the wait immediately.
    pub async fn wait_for_completion<S>(
        &self,
        handle: &OperationHandle,
        source: &S,
    ) -> WaitResult<Completion>
    where
        S: StatusSource + ?Sized,
    {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);
        let mut polls: u32 = 0;

        loop {
            if self.config.max_polls.is_some_and(|max| polls >= max) {
                return Err(self.timed_out(handle, polls, started));
            }

            tokio::select! {
                biased;

                () = self.cancellation.cancelled() => {
                    return Err(self.cancelled(handle, polls));
                }
                () = deadline_elapsed(deadline) => {
                    return Err(self.timed_out(handle, polls, started));
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }

            let polled = tokio::select! {
                biased;

                () = self.cancellation.cancelled() => {
                    return Err(self.cancelled(handle, polls));
                }
                () = deadline_elapsed(deadline) => {
                    return Err(self.timed_out(handle, polls, started));
                }
                result = source.poll_status(handle) => result,
            };
            polls += 1;

            let status = match polled {
                Ok(status) => status,
                Err(e) => {
                    error!(
                        "Status check for operation {} failed on poll {}: {}",
                        handle, polls, e
                    );
                    return Err(WaitError::Transport(e));
                }
            };
            debug!(
                "Operation {} is {} after {} poll(s)",
                handle,
                status.label(),
                polls
            );

            match status {
                OperationStatus::Queued | OperationStatus::Running => {}
                OperationStatus::Succeeded => {
                    let elapsed = started.elapsed();
                    info!(
                        "Operation {} succeeded after {} poll(s) in {:?}",
                        handle, polls, elapsed
                    );
                    return Ok(Completion::new(handle.clone(), polls, elapsed));
                }
                OperationStatus::Failed(reason) | OperationStatus::Cancelled(reason) => {
                    error!("Operation {} failed or was cancelled: {}", handle, reason);
                    return Err(WaitError::OperationFailed(reason));
                }
            }
        }
    }

    /// Wait for `handle` to succeed, then fetch its result.
    pub async fn wait<B>(&self, handle: &OperationHandle, backend: &B) -> WaitResult<B::Output>
    where
        B: ManagedOperation + ?Sized,
    {
        let completion = self.wait_for_completion(handle, backend).await?;

        let output = tokio::select! {
            biased;

            () = self.cancellation.cancelled() => {
                return Err(self.cancelled(handle, completion.polls()));
            }
            result = backend.fetch_result(&completion) => result?,
        };
        Ok(output)
    }

    /// Submit `request`, wait for the operation to finish and fetch its result.
    ///
    /// When the wait is cancelled or times out and `abandon_on_abort` is set,
    /// the backend is asked to stop the remote operation before the error is
    /// returned.
    pub async fn run<B>(&self, backend: &B, request: B::Request) -> WaitResult<B::Output>
    where
        B: ManagedOperation + ?Sized,
    {
        if self.cancellation.is_cancelled() {
            return Err(WaitError::Cancelled);
        }

        let handle = backend.submit(request).await?;
        debug!("Operation started with handle: {}", handle);

        match self.wait(&handle, backend).await {
            Err(err) if err.is_abort() && self.config.abandon_on_abort => {
                abandon(backend, &handle).await;
                Err(err)
            }
            other => other,
        }
    }

    fn cancelled(&self, handle: &OperationHandle, polls: u32) -> WaitError {
        warn!(
            "Wait for operation {} was cancelled after {} poll(s)",
            handle, polls
        );
        WaitError::Cancelled
    }

    fn timed_out(&self, handle: &OperationHandle, polls: u32, started: Instant) -> WaitError {
        let elapsed = started.elapsed();
        error!(
            "Operation {} did not reach a terminal state after {} poll(s) in {:?}",
            handle, polls, elapsed
        );
        WaitError::TimedOut { polls, elapsed }
    }
}

impl Default for AsyncOperationWaiter {
    fn default() -> Self {
        Self::new(WaiterConfig::default())
    }
}

async fn abandon<B>(backend: &B, handle: &OperationHandle)
where
    B: ManagedOperation + ?Sized,
{
    match backend.abandon(handle).await {
        Ok(()) => info!("Requested stop of abandoned operation {}", handle),
        Err(e) => warn!("Failed to stop abandoned operation {}: {}", handle, e),
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
