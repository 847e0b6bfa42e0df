//! ScreenshotMonitor API client.
//!
//! Reads the employment id of the token's owner and the activities recorded
//! for that employment. Every request carries the `X-SSM-Token` header.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wl_core::{ActivityInterval, ActivitySource, ScopeId, SourceError};

/// Public API root.
pub const DEFAULT_BASE_URL: &str = "https://screenshotmonitor.com/api/v2";
/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const TOKEN_HEADER: &str = "X-SSM-Token";

/// ScreenshotMonitor client errors.
#[derive(Debug, Error)]
pub enum ScrinError {
    /// The provided token was invalid.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned a non-success status.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ScrinError> for SourceError {
    fn from(err: ScrinError) -> Self {
        match err {
            ScrinError::Status { status, body } => Self::Status { status, body },
            ScrinError::InvalidResponse(message) => Self::InvalidResponse(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// ScreenshotMonitor API client.
///
/// Cloning shares the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if the
    /// HTTP client fails to build.
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScrinError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ScrinError::InvalidToken {
                reason: "token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ScrinError::ClientBuild)?;

        Ok(Self {
            http,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Employment id of the token's owner.
    pub async fn employment_id(&self) -> Result<i64, ScrinError> {
        let url = format!("{}/GetCommonData", self.base_url);
        tracing::debug!(%url, "fetching common data");
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let data: CommonData = read_json(response).await?;
        Ok(data.employment_id)
    }

    /// Activities recorded for `employment_id` between `from` and `to` (epoch seconds).
    pub async fn activities(
        &self,
        employment_id: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<ActivityInterval>, ScrinError> {
        let url = format!("{}/GetActivities", self.base_url);
        tracing::debug!(%url, employment_id, from, to, "fetching activities");
        let query = [ActivitiesQuery {
            employment_id,
            from,
            to,
        }];
        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&query)
            .send()
            .await?;
        let activities: Vec<Activity> = read_json(response).await?;
        Ok(activities.into_iter().map(Activity::into_interval).collect())
    }
}

#[async_trait]
impl ActivitySource for Client {
    async fn resolve_scope(&self) -> Result<ScopeId, SourceError> {
        let employment_id = self.employment_id().await?;
        Ok(ScopeId::new(employment_id.to_string()))
    }

    async fn fetch_intervals(
        &self,
        scope: &ScopeId,
        from: i64,
        to: i64,
    ) -> Result<Vec<ActivityInterval>, SourceError> {
        Ok(self.activities(scope.as_str(), from, to).await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonData {
    employment_id: i64,
}

/// One entry of the `GetActivities` request body. The API expects the
/// employment id as a string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivitiesQuery<'a> {
    employment_id: &'a str,
    from: i64,
    to: i64,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(default)]
    note: Option<String>,
    from: i64,
    to: i64,
}

impl Activity {
    fn into_interval(self) -> ActivityInterval {
        ActivityInterval::new(self.note.unwrap_or_default(), self.from, self.to)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ScrinError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ScrinError::Status {
            status: status.as_u16(),
            body,
        });
    }
    parse_body(&body)
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ScrinError> {
    serde_json::from_str(body).map_err(|err| ScrinError::InvalidResponse(err.to_string()))
}
