//! AWS IoT data-plane publisher

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iotdataplane::error::{DisplayErrorContext, SdkError};
use aws_sdk_iotdataplane::primitives::Blob;
use aws_sdk_iotdataplane::Client as IotDataClient;

use crate::messaging::MessagePublisher;
use crate::types::{OutboundMessage, PublishOutcome};

/// Publishes messages through the IoT Core `Publish` HTTPS API
pub struct IotDataPublisher {
    client: IotDataClient,
}

impl IotDataPublisher {
    pub fn new(client: IotDataClient) -> Self {
        Self { client }
    }

    /// Build a publisher, pointing the client at the account's data endpoint when one is given
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_iotdataplane::config::Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint_url(endpoint));
        }
        Self::new(IotDataClient::from_conf(builder.build()))
    }
}

#[async_trait]
impl MessagePublisher for IotDataPublisher {
    async fn publish(&self, message: &OutboundMessage) -> PublishOutcome {
        let result = self
            .client
            .publish()
            .topic(&message.topic)
            .qos(i32::from(message.qos.level()))
            .payload(Blob::new(message.payload.as_bytes()))
            .send()
            .await;

        match result {
            Ok(_) => PublishOutcome::Ack,
            Err(err) => classify_publish_error(&err),
        }
    }
}

fn classify_publish_error<E, R>(err: &SdkError<E, R>) -> PublishOutcome
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(err).to_string();
    match err {
        SdkError::TimeoutError(_) => PublishOutcome::Timeout(message),
        _ => PublishOutcome::Failure(message),
    }
}

/// The IoT console shows the endpoint as a bare host name; the SDK needs a URL
pub(crate) fn endpoint_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}
