//! Default subscription: vehicle state reports published as `<fleet>/<type>/<id>/state`

use log::info;

use crate::messaging::router::TopicRouter;
use crate::messaging::topic::TopicError;
use crate::types::{InboundMessage, Qos};

pub const VEHICLE_STATE_TOPIC_FILTER: &str = "+/+/+/state";

pub fn log_vehicle_state(message: &InboundMessage) {
    info!("[subscribe] receive message from {}", message.topic);
}

/// Router preloaded with the vehicle state route
pub fn default_router() -> Result<TopicRouter, TopicError> {
    let mut router = TopicRouter::new();
    router.register(
        VEHICLE_STATE_TOPIC_FILTER,
        Qos::AtMostOnce,
        log_vehicle_state,
    )?;
    Ok(router)
}
