//! AWS SDK integration: Athena query backend, IoT data-plane publisher, SDK config loading.

pub(crate) mod athena_client;
pub(crate) mod iot_data_client;
pub(crate) mod sdk_config;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Athena error: {0}")]
    AthenaError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
