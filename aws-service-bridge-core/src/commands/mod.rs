//! Commands module - service layer for Athena queries and IoT messaging

mod publish;
mod query;
pub(crate) mod service;

pub use service::{AthenaQueryService, IotMessagingService, QueryRunner};
