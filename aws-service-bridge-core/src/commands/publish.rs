//! Publishing for the IoT messaging service

use crate::commands::service::IotMessagingService;
use crate::error::BridgeResult;
use crate::messaging::{log_publish_outcome, validate_publish_topic};
use crate::types::{OutboundMessage, PublishOutcome, Qos};

impl IotMessagingService {
    /// Publish `payload` on `topic`.
    ///
    /// An invalid topic is an error and nothing is sent. Once sent, delivery
    /// problems are reported through the returned [`PublishOutcome`].
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<String>,
        qos: Option<Qos>,
    ) -> BridgeResult<PublishOutcome> {
        validate_publish_topic(topic)?;

        let message = OutboundMessage::new(topic, payload, qos.unwrap_or(self.default_qos));
        let outcome = self.publisher.publish(&message).await;
        log_publish_outcome(&message, &outcome);
        Ok(outcome)
    }
}
