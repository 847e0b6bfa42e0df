//! Traits for the two external services a sync talks to.
//!
//! The core never performs HTTP itself. Client crates implement these traits
//! and convert their transport errors into [`SourceError`] and
//! [`DestinationError`]; tests use in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ActivityInterval, ExistingWorklog, NewWorklog, ScopeId};

/// Errors from the activity source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(String),
    /// The source answered with a non-success status.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the worklog destination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DestinationError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(String),
    /// The destination answered with a non-success status.
    #[error("status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Where tracked activity comes from.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Resolves the account scope that activity queries run against.
    async fn resolve_scope(&self) -> Result<ScopeId, SourceError>;

    /// Fetches every interval recorded between `from` and `to` (epoch seconds).
    async fn fetch_intervals(
        &self,
        scope: &ScopeId,
        from: i64,
        to: i64,
    ) -> Result<Vec<ActivityInterval>, SourceError>;
}

/// Where worklogs are written.
#[async_trait]
pub trait WorklogDestination: Send + Sync {
    async fn issue_exists(&self, issue_key: &str) -> Result<bool, DestinationError>;

    /// Account id of the authenticated caller.
    async fn current_account_id(&self) -> Result<String, DestinationError>;

    async fn list_worklogs(&self, issue_key: &str)
    -> Result<Vec<ExistingWorklog>, DestinationError>;

    async fn create_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<(), DestinationError>;
}

#[async_trait]
impl<T: ActivitySource + ?Sized> ActivitySource for Arc<T> {
    async fn resolve_scope(&self) -> Result<ScopeId, SourceError> {
        (**self).resolve_scope().await
    }

    async fn fetch_intervals(
        &self,
        scope: &ScopeId,
        from: i64,
        to: i64,
    ) -> Result<Vec<ActivityInterval>, SourceError> {
        (**self).fetch_intervals(scope, from, to).await
    }
}

#[async_trait]
impl<T: WorklogDestination + ?Sized> WorklogDestination for Arc<T> {
    async fn issue_exists(&self, issue_key: &str) -> Result<bool, DestinationError> {
        (**self).issue_exists(issue_key).await
    }

    async fn current_account_id(&self) -> Result<String, DestinationError> {
        (**self).current_account_id().await
    }

    async fn list_worklogs(
        &self,
        issue_key: &str,
    ) -> Result<Vec<ExistingWorklog>, DestinationError> {
        (**self).list_worklogs(issue_key).await
    }

    async fn create_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<(), DestinationError> {
        (**self).create_worklog(issue_key, worklog).await
    }
}
