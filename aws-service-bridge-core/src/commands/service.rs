//! Service layer shared by the front ends
//!
//! The services hold immutable AWS clients and configuration. They validate
//! input before any remote call and return typed errors, so the CLI and the
//! HTTP server only translate outcomes into exit codes and status codes.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_service_bridge_waiter::{CancellationToken, WaiterConfig};

use crate::aws::athena_client::AthenaQueryBackend;
use crate::aws::iot_data_client::IotDataPublisher;
use crate::aws::sdk_config::load_sdk_config;
use crate::aws::AwsError;
use crate::config::{AthenaSettings, BridgeConfig};
use crate::error::BridgeResult;
use crate::messaging::MessagePublisher;
use crate::types::{Qos, QueryResultSet};

/// Runs SQL queries to completion and returns their result sets
pub struct AthenaQueryService<B = AthenaQueryBackend> {
    pub(crate) backend: B,
    pub(crate) waiter_config: WaiterConfig,
}

impl<B> AthenaQueryService<B> {
    pub fn new(backend: B, waiter_config: WaiterConfig) -> Self {
        Self {
            backend,
            waiter_config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn waiter_config(&self) -> &WaiterConfig {
        &self.waiter_config
    }
}

impl AthenaQueryService<AthenaQueryBackend> {
    /// Create the service from an already loaded SDK configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no Athena settings are present.
    pub fn from_sdk_config(sdk_config: &SdkConfig, config: &BridgeConfig) -> BridgeResult<Self> {
        let settings = athena_settings(config)?;
        Ok(Self::new(
            AthenaQueryBackend::from_sdk_config(sdk_config, settings),
            config.waiter.clone(),
        ))
    }

    /// Load the SDK configuration and create the service
    pub async fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        athena_settings(config)?;
        let sdk_config = load_sdk_config(&config.aws).await?;
        Self::from_sdk_config(&sdk_config, config)
    }
}

fn athena_settings(config: &BridgeConfig) -> BridgeResult<AthenaSettings> {
    let settings = config.athena.clone().ok_or_else(|| {
        AwsError::ConfigError(
            "Athena database and output location must be configured to run queries".into(),
        )
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Object-safe view of a query service, used where the backend type is erased
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn execute_query(
        &self,
        sql: &str,
        cancellation: CancellationToken,
    ) -> BridgeResult<QueryResultSet>;
}

/// Publishes messages to IoT Core topics
pub struct IotMessagingService {
    pub(crate) publisher: Arc<dyn MessagePublisher>,
    pub(crate) default_qos: Qos,
}

impl IotMessagingService {
    pub fn new(publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            publisher,
            default_qos: Qos::default(),
        }
    }

    pub fn with_default_qos(mut self, qos: Qos) -> Self {
        self.default_qos = qos;
        self
    }

    pub fn default_qos(&self) -> Qos {
        self.default_qos
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, config: &BridgeConfig) -> Self {
        Self::new(Arc::new(IotDataPublisher::from_sdk_config(
            sdk_config,
            config.iot.endpoint.as_deref(),
        )))
    }

    pub async fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        let sdk_config = load_sdk_config(&config.aws).await?;
        Ok(Self::from_sdk_config(&sdk_config, config))
    }
}

impl std::fmt::Debug for IotMessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IotMessagingService")
            .field("default_qos", &self.default_qos)
            .finish_non_exhaustive()
    }
}
