//! `POST /query`

use aws_service_bridge_core::QueryResultSet;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use log::debug;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Run the query to completion.
///
/// The query runs on its own task. If the client goes away or the server shuts
/// down, the task is cancelled and stops the remote query.
pub(crate) async fn execute_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResultSet>, ApiError> {
    let Json(request) = body?;
    let runner = state.query_runner()?;

    let cancellation = state.shutdown().child_token();
    let _cancel_on_drop = cancellation.clone().drop_guard();

    debug!("Received query request");
    let task =
        tokio::spawn(async move { runner.execute_query(&request.query, cancellation).await });
    let result = task
        .await
        .map_err(|e| ApiError::internal(format!("Query task failed: {e}")))??;

    Ok(Json(result))
}
