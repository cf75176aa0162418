use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_service_bridge_core::messaging::vehicle_state::{
    default_router, VEHICLE_STATE_TOPIC_FILTER,
};
use aws_service_bridge_core::{
    AthenaQueryService, CancellationToken, ErrorKind, InboundMessage, QueryResultSet, QueryRunner,
    WaiterConfig,
};
use aws_service_bridge_waiter::testing::ScriptedOperation;
use aws_service_bridge_waiter::{
    Completion, ManagedOperation, OperationHandle, OperationStatus, StatusSource, TransportError,
};

/// Athena-shaped backend: reports RUNNING twice, then SUCCEEDED with a fixed table
struct TableBackend {
    polls: AtomicU32,
}

#[async_trait]
impl StatusSource for TableBackend {
    async fn poll_status(
        &self,
        _handle: &OperationHandle,
    ) -> Result<OperationStatus, TransportError> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(if polls < 3 {
            OperationStatus::Running
        } else {
            OperationStatus::Succeeded
        })
    }
}

#[async_trait]
impl ManagedOperation for TableBackend {
    type Request = String;
    type Output = QueryResultSet;

    async fn submit(&self, _request: String) -> Result<OperationHandle, TransportError> {
        Ok(OperationHandle::from(
            "a1b2c3d4-5678-90ab-cdef-EXAMPLE11111",
        ))
    }

    async fn fetch_result(
        &self,
        completion: &Completion,
    ) -> Result<QueryResultSet, TransportError> {
        assert_eq!(completion.polls(), 3);
        Ok(QueryResultSet {
            columns: vec!["vehicle".to_string(), "speed".to_string()],
            rows: vec![
                vec![Some("truck-1".to_string()), Some("42".to_string())],
                vec![Some("truck-2".to_string()), None],
            ],
        })
    }
}

fn fast_config() -> WaiterConfig {
    WaiterConfig::default().with_poll_interval(Duration::from_millis(50))
}

#[tokio::test(start_paused = true)]
async fn test_query_runner_trait_object_returns_result_set() {
    let runner: Arc<dyn QueryRunner> = Arc::new(AthenaQueryService::new(
        TableBackend {
            polls: AtomicU32::new(0),
        },
        fast_config(),
    ));

    let result = runner
        .execute_query("SELECT vehicle, speed FROM fleet", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(result.columns, vec!["vehicle", "speed"]);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "columns": ["vehicle", "speed"],
            "rows": [["truck-1", "42"], ["truck-2", null]]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_query_stops_remote_operation() {
    let service = AthenaQueryService::new(ScriptedOperation::never_finishing(), fast_config());
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(175)).await;
            token.cancel();
        })
    };

    let err = service
        .execute_query_with_cancel("SELECT * FROM telemetry", token)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(service.backend().poll_count(), 3);
    assert_eq!(service.backend().abandoned().len(), 1);
    assert_eq!(service.backend().fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_query_times_out() {
    let service = AthenaQueryService::new(
        ScriptedOperation::never_finishing(),
        fast_config().with_max_polls(5),
    );

    let err = service.execute_query("SELECT 1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TimedOut);
    assert_eq!(service.backend().poll_count(), 5);
}

#[test]
fn test_default_router_subscribes_to_vehicle_state() {
    let router = default_router().unwrap();
    let filters: Vec<String> = router.filters().map(|(f, _)| f.to_string()).collect();
    assert_eq!(filters, vec![VEHICLE_STATE_TOPIC_FILTER.to_string()]);
    assert_eq!(
        router.dispatch(&InboundMessage::new("acme/car/17/state", "moving")),
        1
    );
}
