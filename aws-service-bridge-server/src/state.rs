use std::sync::Arc;

use aws_service_bridge_core::{CancellationToken, IotMessagingService, QueryRunner};

use crate::error::ApiError;

/// Services shared by all handlers. Either service may be absent when its
/// configuration was not supplied; its routes then answer 503.
#[derive(Clone, Default)]
pub struct AppState {
    query: Option<Arc<dyn QueryRunner>>,
    messaging: Option<Arc<IotMessagingService>>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query_runner(mut self, runner: Arc<dyn QueryRunner>) -> Self {
        self.query = Some(runner);
        self
    }

    pub fn with_messaging(mut self, messaging: Arc<IotMessagingService>) -> Self {
        self.messaging = Some(messaging);
        self
    }

    /// In-flight queries are cancelled when this token fires
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub(crate) fn query_runner(&self) -> Result<Arc<dyn QueryRunner>, ApiError> {
        self.query
            .clone()
            .ok_or_else(|| ApiError::not_configured("Athena query execution"))
    }

    pub(crate) fn messaging(&self) -> Result<Arc<IotMessagingService>, ApiError> {
        self.messaging
            .clone()
            .ok_or_else(|| ApiError::not_configured("IoT messaging"))
    }

    pub(crate) fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
