//! Query execution for the Athena service

use async_trait::async_trait;
use aws_service_bridge_waiter::{AsyncOperationWaiter, CancellationToken, ManagedOperation};
use log::{debug, error};

use crate::commands::service::{AthenaQueryService, QueryRunner};
use crate::error::{BridgeError, BridgeResult};
use crate::types::QueryResultSet;

impl<B> AthenaQueryService<B>
where
    B: ManagedOperation<Request = String>,
{
    /// Run `sql` and return its result, waiting without a caller-side cancellation
    pub async fn execute_query(&self, sql: &str) -> BridgeResult<B::Output> {
        self.execute_query_with_cancel(sql, CancellationToken::new())
            .await
    }

    /// Run `sql` and return its result.
    ///
    /// Cancelling `cancellation` stops the wait with `WaitError::Cancelled` and,
    /// unless disabled in the waiter config, stops the remote query.
    pub async fn execute_query_with_cancel(
        &self,
        sql: &str,
        cancellation: CancellationToken,
    ) -> BridgeResult<B::Output> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(BridgeError::invalid_input("Query must not be empty"));
        }

        debug!("Executing query: {}", sql);
        let waiter =
            AsyncOperationWaiter::new(self.waiter_config.clone()).with_cancellation(cancellation);

        waiter
            .run(&self.backend, sql.to_string())
            .await
            .map_err(|e| {
                error!("Query did not complete ({}): {}", e.kind(), e);
                BridgeError::from(e)
            })
    }
}

#[async_trait]
impl<B> QueryRunner for AthenaQueryService<B>
where
    B: ManagedOperation<Request = String, Output = QueryResultSet>,
{
    async fn execute_query(
        &self,
        sql: &str,
        cancellation: CancellationToken,
    ) -> BridgeResult<QueryResultSet> {
        self.execute_query_with_cancel(sql, cancellation).await
    }
}
