//! IoT Core messaging: publishing, topic routing and the MQTT listener

mod listener;
mod router;
mod topic;
pub mod vehicle_state;

use async_trait::async_trait;
use log::{debug, error, info};

use crate::types::{InboundMessage, OutboundMessage, PublishOutcome};

pub use listener::MqttListener;
pub use router::{MessageHandler, TopicRouter};
pub use topic::{validate_publish_topic, TopicError, TopicFilter, MAX_TOPIC_LENGTH};

/// Sends a message to a topic and reports how the attempt ended.
///
/// Implementations never panic or return early on failure; every outcome is a value.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: &OutboundMessage) -> PublishOutcome;
}

/// Handler for user-supplied subscriptions; the payload is only logged at debug level
pub fn log_received(message: &InboundMessage) {
    info!(
        "[subscribe] receive {} byte(s) from {}",
        message.payload.len(),
        message.topic
    );
    debug!("[subscribe] {}: {}", message.topic, message.payload_str());
}

/// Log a publish outcome at the level matching its result
pub fn log_publish_outcome(message: &OutboundMessage, outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Ack => {
            info!("[publish] send message to {} successfully", message.topic);
        }
        PublishOutcome::Failure(reason) => {
            error!(
                "[publish] failed to send message to {}: {}",
                message.topic, reason
            );
        }
        PublishOutcome::Timeout(reason) => {
            error!(
                "[publish] timed out sending message to {}: {}",
                message.topic, reason
            );
        }
    }
}
