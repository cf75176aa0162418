//! `POST /publish`

use aws_service_bridge_core::{PublishOutcome, Qos};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub topic: String,
    /// A JSON string is sent as-is; any other JSON value is sent serialized
    pub payload: Value,
    #[serde(default)]
    pub qos: Option<Qos>,
}

impl PublishRequest {
    fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

pub(crate) async fn publish(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublishOutcome>), ApiError> {
    let Json(request) = body?;
    let messaging = state.messaging()?;

    let outcome = messaging
        .publish(&request.topic, request.payload_text(), request.qos)
        .await?;

    let status = match outcome {
        PublishOutcome::Ack => StatusCode::ACCEPTED,
        PublishOutcome::Failure(_) => StatusCode::BAD_GATEWAY,
        PublishOutcome::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    Ok((status, Json(outcome)))
}
