//! This crate provides the AWS side of the service bridge:
//! - Athena query execution driven by the operation waiter
//! - IoT Core publishing through the data-plane API
//! - MQTT topic routing and a TLS subscription listener
//!

mod aws;
pub mod commands;
pub mod config;
mod error;
pub mod messaging;
mod types;

// Re-exports for a small, focused public API
pub use aws::athena_client::AthenaQueryBackend;
pub use aws::iot_data_client::IotDataPublisher;
pub use aws::sdk_config::load_sdk_config;
pub use aws::{AwsError, AwsResult};
pub use commands::{AthenaQueryService, IotMessagingService, QueryRunner};
pub use config::{AthenaSettings, AwsSettings, BridgeConfig, IotSettings};
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use messaging::{MessagePublisher, MqttListener, TopicRouter};
pub use types::{InboundMessage, OutboundMessage, PublishOutcome, Qos, QueryResultSet};

pub use aws_service_bridge_waiter::{CancellationToken, WaitError, WaiterConfig};
