//! Jira Cloud worklog API client.
//!
//! Covers the four calls idempotent posting needs: issue lookup, the caller's
//! own account, an issue's worklogs and worklog creation. Authentication uses
//! basic auth with the account email and an API token.
//!
//! See: <https://developer.atlassian.com/cloud/jira/platform/rest/v3/api-group-issue-worklogs/>

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use wl_core::{DestinationError, ExistingWorklog, NewWorklog, WorklogDestination};

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Jira client errors.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Email or API token missing.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// The base URL cannot carry REST paths.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned a non-success status.
    #[error("status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<JiraError> for DestinationError {
    fn from(err: JiraError) -> Self {
        match err {
            JiraError::Rejected { status, body } => Self::Rejected { status, body },
            JiraError::InvalidResponse(message) => Self::InvalidResponse(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Jira REST v3 client.
///
/// Cloning shares the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    email: String,
    api_token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or token is blank, the base URL does not
    /// parse, or the HTTP client fails to build.
    pub fn new(
        email: impl Into<String>,
        api_token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, JiraError> {
        let email = email.into();
        let api_token = api_token.into();
        if email.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "email cannot be empty",
            });
        }
        if api_token.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "API token cannot be empty",
            });
        }

        let base_url = Url::parse(base_url).map_err(|err| JiraError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(JiraError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot have path segments".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            email,
            api_token,
        })
    }

    /// Whether the issue exists and is visible to the caller.
    ///
    /// Only `404` means "no such issue". Other failures, such as bad
    /// credentials, are returned as errors.
    pub async fn has_issue(&self, issue_key: &str) -> Result<bool, JiraError> {
        let url = self.api_url(&["issue", issue_key])?;
        let response = self.get(url).send().await?;
        let status = response.status();
        tracing::debug!(issue_key, %status, "issue lookup");
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return issue_lookup(status, String::new());
        }
        let body = response.text().await?;
        issue_lookup(status, body)
    }

    /// Account id of the authenticated user.
    pub async fn myself(&self) -> Result<String, JiraError> {
        let url = self.api_url(&["myself"])?;
        let user: Myself = read_json(self.get(url).send().await?).await?;
        user.account_id
            .ok_or_else(|| JiraError::InvalidResponse("missing accountId".to_string()))
    }

    /// Worklogs recorded on the issue, by any author, across all pages.
    pub async fn worklogs(&self, issue_key: &str) -> Result<Vec<ExistingWorklog>, JiraError> {
        let url = self.api_url(&["issue", issue_key, "worklog"])?;
        let mut worklogs = Vec::new();
        let mut start_at = 0;
        loop {
            let request = self.get(url.clone()).query(&[("startAt", start_at)]);
            let page: WorklogPage = read_json(request.send().await?).await?;
            let next = page.next_start();
            tracing::debug!(issue_key, start_at, count = page.worklogs.len(), "listed worklogs");
            worklogs.extend(page.into_existing());
            match next {
                Some(next) => start_at = next,
                None => break,
            }
        }
        Ok(worklogs)
    }

    pub async fn add_worklog(&self, issue_key: &str, worklog: &NewWorklog) -> Result<(), JiraError> {
        let url = self.api_url(&["issue", issue_key, "worklog"])?;
        let response = self
            .http
            .post(url)
            .basic_auth(&self.email, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(worklog)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(JiraError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(issue_key, started = %worklog.started, "created worklog");
        Ok(())
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.email, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// `<base>/rest/api/3/<segments...>`, each segment percent-encoded.
    ///
    /// Ticket keys come from free-text notes, so they may contain spaces or
    /// slashes.
    fn api_url(&self, segments: &[&str]) -> Result<Url, JiraError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| JiraError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(["rest", "api", "3"])
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl WorklogDestination for Client {
    async fn issue_exists(&self, issue_key: &str) -> Result<bool, DestinationError> {
        Ok(self.has_issue(issue_key).await?)
    }

    async fn current_account_id(&self) -> Result<String, DestinationError> {
        Ok(self.myself().await?)
    }

    async fn list_worklogs(
        &self,
        issue_key: &str,
    ) -> Result<Vec<ExistingWorklog>, DestinationError> {
        Ok(self.worklogs(issue_key).await?)
    }

    async fn create_worklog(
        &self,
        issue_key: &str,
        worklog: &NewWorklog,
    ) -> Result<(), DestinationError> {
        Ok(self.add_worklog(issue_key, worklog).await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Myself {
    #[serde(default)]
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorklogPage {
    #[serde(default)]
    start_at: usize,
    /// Absent on servers that always return every worklog.
    #[serde(default)]
    total: Option<usize>,
    worklogs: Vec<Worklog>,
}

impl WorklogPage {
    /// `startAt` of the following page, if any worklogs remain.
    fn next_start(&self) -> Option<usize> {
        let fetched = self.start_at + self.worklogs.len();
        let total = self.total?;
        (!self.worklogs.is_empty() && fetched < total).then_some(fetched)
    }

    fn into_existing(self) -> Vec<ExistingWorklog> {
        self.worklogs
            .into_iter()
            .map(|worklog| ExistingWorklog {
                author_account_id: worklog.author.and_then(|author| author.account_id),
                started: worklog.started.unwrap_or_default(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Worklog {
    #[serde(default)]
    author: Option<Author>,
    #[serde(default)]
    started: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    #[serde(default)]
    account_id: Option<String>,
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, JiraError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(JiraError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    parse_body(&body)
}

fn issue_lookup(status: StatusCode, body: String) -> Result<bool, JiraError> {
    if status.is_success() {
        Ok(true)
    } else if status == StatusCode::NOT_FOUND {
        Ok(false)
    } else {
        Err(JiraError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, JiraError> {
    serde_json::from_str(body).map_err(|err| JiraError::InvalidResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> Client {
        Client::new("me@example.com", "token", base_url, DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn client_rejects_blank_email() {
        assert!(matches!(
            Client::new(" ", "token", "https://example.atlassian.net", DEFAULT_TIMEOUT),
            Err(JiraError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn client_rejects_blank_token() {
        assert!(matches!(
            Client::new("me@example.com", "", "https://example.atlassian.net", DEFAULT_TIMEOUT),
            Err(JiraError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn client_rejects_unparseable_base_url() {
        assert!(matches!(
            Client::new("me@example.com", "token", "example.atlassian.net", DEFAULT_TIMEOUT),
            Err(JiraError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = Client::new(
            "me@example.com",
            "secret-token",
            "https://example.atlassian.net",
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn api_url_appends_rest_path() {
        let client = client("https://example.atlassian.net");
        let url = client.api_url(&["issue", "PROJ-1", "worklog"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.atlassian.net/rest/api/3/issue/PROJ-1/worklog"
        );
    }

    #[test]
    fn api_url_keeps_base_path_and_ignores_trailing_slash() {
        let client = client("https://example.test/jira/");
        let url = client.api_url(&["myself"]).unwrap();
        assert_eq!(url.as_str(), "https://example.test/jira/rest/api/3/myself");
    }

    #[test]
    fn api_url_encodes_free_text_keys() {
        let client = client("https://example.atlassian.net");
        let url = client.api_url(&["issue", "fix login/logout"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.atlassian.net/rest/api/3/issue/fix%20login%2Flogout"
        );
    }

    #[test]
    fn myself_reads_account_id() {
        let user: Myself =
            parse_body(r#"{"accountId":"5b10a2844c20165700ede21g","active":true}"#).unwrap();
        assert_eq!(user.account_id.as_deref(), Some("5b10a2844c20165700ede21g"));
    }

    #[test]
    fn worklog_page_keeps_author_and_started() {
        let page: WorklogPage = parse_body(
            r#"{
                "startAt": 0,
                "maxResults": 1048576,
                "total": 3,
                "worklogs": [
                    {"author": {"accountId": "abc", "displayName": "Me"},
                     "started": "2024-01-15T09:00:00.000+0200",
                     "timeSpentSeconds": 3600},
                    {"started": "2024-01-16T09:00:00.000+0200"},
                    {"author": {"displayName": "Ghost"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            page.into_existing(),
            vec![
                ExistingWorklog {
                    author_account_id: Some("abc".to_string()),
                    started: "2024-01-15T09:00:00.000+0200".to_string(),
                },
                ExistingWorklog {
                    author_account_id: None,
                    started: "2024-01-16T09:00:00.000+0200".to_string(),
                },
                ExistingWorklog {
                    author_account_id: None,
                    started: String::new(),
                },
            ]
        );
    }

    #[test]
    fn worklog_page_points_at_next_page_until_total() {
        let first: WorklogPage = parse_body(
            r#"{"startAt": 0, "maxResults": 2, "total": 3,
                "worklogs": [{"started": "a"}, {"started": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(first.next_start(), Some(2));

        let last: WorklogPage = parse_body(
            r#"{"startAt": 2, "maxResults": 2, "total": 3,
                "worklogs": [{"started": "c"}]}"#,
        )
        .unwrap();
        assert_eq!(last.next_start(), None);
    }

    #[test]
    fn worklog_page_without_total_or_entries_is_last() {
        let untotalled: WorklogPage = parse_body(r#"{"worklogs": [{"started": "a"}]}"#).unwrap();
        assert_eq!(untotalled.next_start(), None);

        let empty: WorklogPage =
            parse_body(r#"{"startAt": 5, "total": 10, "worklogs": []}"#).unwrap();
        assert_eq!(empty.next_start(), None);
    }

    #[test]
    fn issue_lookup_treats_only_not_found_as_missing() {
        assert!(issue_lookup(StatusCode::OK, String::new()).unwrap());
        assert!(!issue_lookup(StatusCode::NOT_FOUND, String::new()).unwrap());

        let err = issue_lookup(StatusCode::UNAUTHORIZED, "bad credentials".to_string()).unwrap_err();
        assert!(matches!(err, JiraError::Rejected { status: 401, .. }));
        assert_eq!(err.to_string(), "status 401: bad credentials");

        assert!(issue_lookup(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_err());
    }

    #[test]
    fn worklog_page_without_worklogs_is_invalid() {
        let err = parse_body::<WorklogPage>(r#"{"errorMessages":["Issue does not exist"]}"#)
            .unwrap_err();
        assert!(matches!(err, JiraError::InvalidResponse(_)));
    }

    #[test]
    fn rejected_maps_to_destination_rejected() {
        let err = DestinationError::from(JiraError::Rejected {
            status: 400,
            body: "bad started".to_string(),
        });
        assert_eq!(
            err,
            DestinationError::Rejected {
                status: 400,
                body: "bad started".to_string(),
            }
        );
    }
}
