//! In-memory implementations of the ports for writer and orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::ports::{ActivitySource, DestinationError, SourceError, WorklogDestination};
use crate::types::{ActivityInterval, ExistingWorklog, NewWorklog, ScopeId};

/// Activity source serving a fixed list of intervals.
///
/// `fetch_intervals` returns every interval overlapping the requested range,
/// like the real API does, so window clipping is exercised.
pub struct FakeSource {
    scope: Result<ScopeId, SourceError>,
    intervals: Vec<ActivityInterval>,
    fail_from: Option<i64>,
    requests: Mutex<Vec<(i64, i64)>>,
}

impl FakeSource {
    pub fn new(intervals: Vec<ActivityInterval>) -> Self {
        Self {
            scope: Ok(ScopeId::new("4242")),
            intervals,
            fail_from: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_scope(mut self) -> Self {
        self.scope = Err(SourceError::Status {
            status: 401,
            body: "bad token".to_string(),
        });
        self
    }

    /// Fails any fetch whose range starts at or after `from`.
    pub const fn failing_from(mut self, from: i64) -> Self {
        self.fail_from = Some(from);
        self
    }

    pub fn requests(&self) -> Vec<(i64, i64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    async fn resolve_scope(&self) -> Result<ScopeId, SourceError> {
        self.scope.clone()
    }

    async fn fetch_intervals(
        &self,
        scope: &ScopeId,
        from: i64,
        to: i64,
    ) -> Result<Vec<ActivityInterval>, SourceError> {
        assert_eq!(scope.as_str(), "4242");
        self.requests.lock().unwrap().push((from, to));
        if self.fail_from.is_some_and(|fail_from| from >= fail_from) {
            return Err(SourceError::Transport("connection reset".to_string()));
        }
        Ok(self
            .intervals
            .iter()
            .filter(|interval| interval.from <= to && interval.to >= from)
            .cloned()
            .collect())
    }
}

/// Worklog destination backed by maps. Created worklogs become visible to
/// later duplicate scans, authored by the configured account.
pub struct FakeDestination {
    account_id: String,
    issues: HashSet<String>,
    worklogs: Mutex<HashMap<String, Vec<ExistingWorklog>>>,
    created: Mutex<Vec<(String, NewWorklog)>>,
    account_lookups: AtomicUsize,
    fail_issue_lookup: bool,
    fail_account_lookup: bool,
    fail_listing: bool,
    reject_writes: Option<DestinationError>,
}

impl FakeDestination {
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            issues: HashSet::new(),
            worklogs: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            account_lookups: AtomicUsize::new(0),
            fail_issue_lookup: false,
            fail_account_lookup: false,
            fail_listing: false,
            reject_writes: None,
        }
    }

    pub fn with_issue(mut self, issue_key: &str) -> Self {
        self.issues.insert(issue_key.to_string());
        self
    }

    pub fn with_worklog(self, issue_key: &str, author: &str, started: &str) -> Self {
        self.worklogs
            .lock()
            .unwrap()
            .entry(issue_key.to_string())
            .or_default()
            .push(ExistingWorklog {
                author_account_id: Some(author.to_string()),
                started: started.to_string(),
            });
        self
    }

    pub const fn failing_issue_lookup(mut self) -> Self {
        self.fail_issue_lookup = true;
        self
    }

    pub const fn failing_account_lookup(mut self) -> Self {
        self.fail_account_lookup = true;
        self
    }

    pub const fn failing_worklog_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn rejecting_writes(mut self, error: DestinationError) -> Self {
        self.reject_writes = Some(error);
        self
    }

    pub fn created(&self) -> Vec<(String, NewWorklog)> {
        self.created.lock().unwrap().clone()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorklogDestination for FakeDestination {
    async fn issue_exists(&self, issue_key: &str) -> Result<bool, DestinationError> {
        if self.fail_issue_lookup {
            return Err(DestinationError::Transport("timed out".to_string()));
        }
        Ok(self.issues.contains(issue_key))
    }

    async fn current_account_id(&self) -> Result<String, DestinationError> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_account_lookup {
            return Err(DestinationError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.account_id.clone())
    }

    async fn list_worklogs(
        &self,
        issue_key: &str,
    ) -> Result<Vec<ExistingWorklog>, DestinationError> {
        if self.fail_listing {
            return Err(DestinationError::InvalidResponse(
                "missing field `worklogs`".to_string(),
            ));
        }
        Ok(self
            .worklogs
            .lock()
            .unwrap()
            .get(issue_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<(), DestinationError> {
        if let Some(error) = &self.reject_writes {
            return Err(error.clone());
        }
        self.created
            .lock()
            .unwrap()
            .push((issue_key.to_string(), worklog.clone()));
        self.worklogs
            .lock()
            .unwrap()
            .entry(issue_key.to_string())
            .or_default()
            .push(ExistingWorklog {
                author_account_id: Some(self.account_id.clone()),
                started: worklog.started.clone(),
            });
        Ok(())
    }
}
