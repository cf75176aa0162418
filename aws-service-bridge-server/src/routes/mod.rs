mod health;
mod publish;
mod query;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub use publish::PublishRequest;
pub use query::QueryRequest;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/query", post(query::execute_query))
        .route("/publish", post(publish::publish))
        .with_state(state)
}
