//! Amazon Athena backend for the operation waiter
//!
//! Maps the StartQueryExecution / GetQueryExecution / GetQueryResults /
//! StopQueryExecution calls onto the submit / poll / fetch / abandon lifecycle.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_athena::error::{DisplayErrorContext, SdkError};
use aws_sdk_athena::operation::get_query_execution::GetQueryExecutionError;
use aws_sdk_athena::operation::get_query_results::GetQueryResultsError;
use aws_sdk_athena::operation::start_query_execution::StartQueryExecutionError;
use aws_sdk_athena::operation::stop_query_execution::StopQueryExecutionError;
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionState, QueryExecutionStatus, ResultConfiguration,
    ResultSet,
};
use aws_sdk_athena::Client as AthenaClient;
use aws_service_bridge_waiter::{
    Completion, ManagedOperation, OperationHandle, OperationStatus, StatusSource, TransportError,
};
use log::debug;

use crate::aws::{AwsError, AwsResult};
use crate::config::AthenaSettings;
use crate::types::QueryResultSet;

pub struct AthenaQueryBackend {
    client: AthenaClient,
    settings: AthenaSettings,
}

impl AthenaQueryBackend {
    pub fn new(client: AthenaClient, settings: AthenaSettings) -> Self {
        Self { client, settings }
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, settings: AthenaSettings) -> Self {
        Self::new(AthenaClient::new(sdk_config), settings)
    }

    pub fn settings(&self) -> &AthenaSettings {
        &self.settings
    }

    async fn start_query_execution(&self, query: &str) -> AwsResult<String> {
        let context = QueryExecutionContext::builder()
            .database(&self.settings.database)
            .build();
        let result_configuration = ResultConfiguration::builder()
            .output_location(&self.settings.output_location)
            .build();

        let mut request = self
            .client
            .start_query_execution()
            .query_string(query)
            .query_execution_context(context)
            .result_configuration(result_configuration);
        if let Some(workgroup) = &self.settings.workgroup {
            request = request.work_group(workgroup);
        }

        let response = request
            .send()
            .await
            .map_err(|e| sdk_failure("StartQueryExecution", &e))?;

        response
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::AthenaError("StartQueryExecution returned no query execution id".into())
            })
    }

    async fn get_query_execution_status(
        &self,
        query_execution_id: &str,
    ) -> AwsResult<OperationStatus> {
        let response = self
            .client
            .get_query_execution()
            .query_execution_id(query_execution_id)
            .send()
            .await
            .map_err(|e| sdk_failure("GetQueryExecution", &e))?;

        map_query_status(
            response
                .query_execution()
                .and_then(|execution| execution.status()),
        )
    }

    async fn get_query_results(&self, query_execution_id: &str) -> AwsResult<QueryResultSet> {
        let mut result = QueryResultSet::default();
        let mut pages = self
            .client
            .get_query_results()
            .query_execution_id(query_execution_id)
            .into_paginator()
            .send();
        let mut page_number: u32 = 0;

        while let Some(response) = pages.next().await {
            let response = response.map_err(|e| sdk_failure("GetQueryResults", &e))?;
            if let Some(page) = response.result_set() {
                append_result_page(&mut result, page, page_number == 0);
            }
            page_number += 1;
        }

        debug!(
            "Fetched {} row(s) over {} page(s) for query {}",
            result.row_count(),
            page_number,
            query_execution_id
        );
        Ok(result)
    }

    async fn stop_query_execution(&self, query_execution_id: &str) -> AwsResult<()> {
        self.client
            .stop_query_execution()
            .query_execution_id(query_execution_id)
            .send()
            .await
            .map_err(|e| sdk_failure("StopQueryExecution", &e))?;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for AthenaQueryBackend {
    async fn poll_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, TransportError> {
        self.get_query_execution_status(handle.as_str())
            .await
            .map_err(into_transport)
    }
}

#[async_trait]
impl ManagedOperation for AthenaQueryBackend {
    type Request = String;
    type Output = QueryResultSet;

    async fn submit(&self, request: String) -> Result<OperationHandle, TransportError> {
        self.start_query_execution(&request)
            .await
            .map(OperationHandle::from)
            .map_err(into_transport)
    }

    async fn fetch_result(
        &self,
        completion: &Completion,
    ) -> Result<QueryResultSet, TransportError> {
        self.get_query_results(completion.handle().as_str())
            .await
            .map_err(into_transport)
    }

    async fn abandon(&self, handle: &OperationHandle) -> Result<(), TransportError> {
        self.stop_query_execution(handle.as_str())
            .await
            .map_err(into_transport)
    }
}

fn into_transport(err: AwsError) -> TransportError {
    TransportError::with_source(err.to_string(), err)
}

/// Operation errors that can report an `InvalidRequestException`
trait InvalidRequest {
    fn is_invalid_request(&self) -> bool;
}

macro_rules! impl_invalid_request {
    ($($error:ty),* $(,)?) => {
        $(impl InvalidRequest for $error {
            fn is_invalid_request(&self) -> bool {
                self.is_invalid_request_exception()
            }
        })*
    };
}

impl_invalid_request!(
    StartQueryExecutionError,
    GetQueryExecutionError,
    GetQueryResultsError,
    StopQueryExecutionError,
);

/// A rejected request (bad SQL, unknown id) becomes `InvalidRequest`
fn sdk_failure<E, R>(operation: &str, err: &SdkError<E, R>) -> AwsError
where
    E: InvalidRequest + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{operation} failed: {}", DisplayErrorContext(err));
    if err.as_service_error().is_some_and(E::is_invalid_request) {
        AwsError::InvalidRequest(message)
    } else {
        AwsError::AthenaError(message)
    }
}

/// Translate an Athena execution status into the waiter's status model
pub(crate) fn map_query_status(
    status: Option<&QueryExecutionStatus>,
) -> AwsResult<OperationStatus> {
    let status =
        status.ok_or_else(|| AwsError::AthenaError("Query execution has no status".to_string()))?;
    let state = status
        .state()
        .ok_or_else(|| AwsError::AthenaError("Query execution has no state".to_string()))?;

    match state {
        QueryExecutionState::Queued => Ok(OperationStatus::Queued),
        QueryExecutionState::Running => Ok(OperationStatus::Running),
        QueryExecutionState::Succeeded => Ok(OperationStatus::Succeeded),
        QueryExecutionState::Failed => Ok(OperationStatus::failed(failure_reason(status))),
        QueryExecutionState::Cancelled => Ok(OperationStatus::cancelled(failure_reason(status))),
        other => Err(AwsError::AthenaError(format!(
            "Unrecognized query state: {}",
            other.as_str()
        ))),
    }
}

fn failure_reason(status: &QueryExecutionStatus) -> Option<&str> {
    status
        .athena_error()
        .and_then(|error| error.error_message())
        .or_else(|| status.state_change_reason())
}

/// Append one GetQueryResults page.
///
/// For SELECT queries Athena repeats the column names as the first row of the
/// first page; that header row is dropped.
pub(crate) fn append_result_page(result: &mut QueryResultSet, page: &ResultSet, first_page: bool) {
    if result.columns.is_empty() {
        if let Some(metadata) = page.result_set_metadata() {
            result.columns = metadata
                .column_info()
                .iter()
                .map(|column| column.name().to_string())
                .collect();
        }
    }

    let mut rows = page.rows().iter().map(|row| {
        row.data()
            .iter()
            .map(|datum| datum.var_char_value().map(str::to_string))
            .collect::<Vec<_>>()
    });

    if first_page {
        if let Some(first) = rows.next() {
            if !is_header_row(&first, &result.columns) {
                result.rows.push(first);
            }
        }
    }
    result.rows.extend(rows);
}

fn is_header_row(row: &[Option<String>], columns: &[String]) -> bool {
    !columns.is_empty()
        && row.len() == columns.len()
        && row
            .iter()
            .zip(columns)
            .all(|(cell, column)| cell.as_deref() == Some(column.as_str()))
}
