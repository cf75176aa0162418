//! Shared value types: query result sets and messaging payloads

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tabular result of a finished Athena query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResultSet {
    /// Column names, in result order
    pub columns: Vec<String>,
    /// Data rows; `None` marks a NULL cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// MQTT delivery guarantee for a published message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Qos {
    /// Fire and forget (QoS 0)
    #[default]
    AtMostOnce,
    /// Acknowledged delivery (QoS 1)
    AtLeastOnce,
}

impl Qos {
    pub fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
        }
    }
}

impl TryFrom<u8> for Qos {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            other => Err(format!(
                "Unsupported QoS level {other}: AWS IoT Core accepts 0 or 1"
            )),
        }
    }
}

impl From<Qos> for u8 {
    fn from(value: Qos) -> Self {
        value.level()
    }
}

impl fmt::Display for Qos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QoS{}", self.level())
    }
}

/// A message to publish on a concrete (wildcard-free) topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
    pub qos: Qos,
}

impl OutboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>, qos: Qos) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
        }
    }
}

/// A message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// How a publish attempt completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum PublishOutcome {
    Ack,
    Failure(String),
    Timeout(String),
}

impl PublishOutcome {
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack)
    }
}
