//! Scripted in-memory operation for exercising the waiter without a remote service.
//!
//! The double replays a fixed list of status snapshots. Once it has reported a
//! terminal status, every later poll returns that same status regardless of
//! what remains in the script, and fetching a result before `Succeeded` fails.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::operation::{Completion, OperationHandle, OperationStatus};
use crate::source::{ManagedOperation, StatusSource};

/// One scripted reply to a status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Status(OperationStatus),
    TransportFailure(String),
}

#[derive(Debug)]
pub struct ScriptedOperation {
    handle: OperationHandle,
    script: Mutex<VecDeque<ScriptStep>>,
    last_status: Mutex<Option<OperationStatus>>,
    result: String,
    poll_delay: Option<Duration>,
    polls: AtomicU32,
    fetches: AtomicU32,
    submitted: Mutex<Vec<String>>,
    abandoned: Mutex<Vec<OperationHandle>>,
}

impl ScriptedOperation {
    pub fn new(statuses: Vec<OperationStatus>) -> Self {
        Self::from_steps(statuses.into_iter().map(ScriptStep::Status).collect())
    }

    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self {
            handle: OperationHandle::new("scripted-operation"),
            script: Mutex::new(steps.into()),
            last_status: Mutex::new(None),
            result: String::new(),
            poll_delay: None,
            polls: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
        }
    }

    /// An operation that reports `Running` forever
    pub fn never_finishing() -> Self {
        Self::new(vec![OperationStatus::Running])
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }

    pub fn with_handle(mut self, handle: impl Into<OperationHandle>) -> Self {
        self.handle = handle.into();
        self
    }

    /// Make every status call take this long before answering
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn handle(&self) -> OperationHandle {
        self.handle.clone()
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        lock(&self.submitted).len()
    }

    pub fn submitted(&self) -> Vec<String> {
        lock(&self.submitted).clone()
    }

    pub fn abandoned(&self) -> Vec<OperationHandle> {
        lock(&self.abandoned).clone()
    }

    fn next_step(&self) -> ScriptStep {
        let mut last = lock(&self.last_status);
        if let Some(status) = last.as_ref().filter(|s| s.is_terminal()) {
            return ScriptStep::Status(status.clone());
        }

        let mut script = lock(&self.script);
        let step = match script.pop_front() {
            Some(step) => step,
            // An exhausted script keeps repeating the last status it reported
            None => ScriptStep::Status(last.clone().unwrap_or(OperationStatus::Running)),
        };
        if let ScriptStep::Status(status) = &step {
            *last = Some(status.clone());
        }
        step
    }
}

#[async_trait]
impl StatusSource for ScriptedOperation {
    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, TransportError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.poll_delay {
            tokio::time::sleep(delay).await;
        }
        if handle != &self.handle {
            return Err(TransportError::new(format!("unknown handle: {handle}")));
        }
        match self.next_step() {
            ScriptStep::Status(status) => Ok(status),
            ScriptStep::TransportFailure(message) => Err(TransportError::new(message)),
        }
    }
}

#[async_trait]
impl ManagedOperation for ScriptedOperation {
    type Request = String;
    type Output = String;

    async fn submit(&self, request: String) -> Result<OperationHandle, TransportError> {
        lock(&self.submitted).push(request);
        Ok(self.handle.clone())
    }

    async fn fetch_result(&self, completion: &Completion) -> Result<String, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if completion.handle() != &self.handle {
            return Err(TransportError::new(format!(
                "unknown handle: {}",
                completion.handle()
            )));
        }
        match lock(&self.last_status).as_ref() {
            Some(OperationStatus::Succeeded) => Ok(self.result.clone()),
            other => Err(TransportError::new(format!(
                "result requested before success (last status: {:?})",
                other
            ))),
        }
    }

    async fn abandon(&self, handle: &OperationHandle) -> Result<(), TransportError> {
        lock(&self.abandoned).push(handle.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
