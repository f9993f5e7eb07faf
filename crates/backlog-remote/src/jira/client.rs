use std::time::Duration;

use async_trait::async_trait;
use backlog_core::{BacklogError, BacklogResult, JiraConfig};
use backlog_domain::{BacklogSource, IssueRecord, SprintRecord};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{IssuePage, SprintPage};

const AGILE_API: &str = "rest/agile/1.0";

#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl From<JiraClientError> for BacklogError {
    fn from(err: JiraClientError) -> Self {
        BacklogError::Upstream(err.to_string())
    }
}

/// Read-only client for the Jira Agile REST API.
#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    config: JiraConfig,
    backoff_unit: Duration,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let mut config = config.clone();
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            config,
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// For testing: shrink the retry backoff so retry paths run quickly.
    #[cfg(test)]
    fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// All sprints of a board, following pages until `isLast`.
    pub async fn fetch_board_sprints(
        &self,
        board_id: i64,
    ) -> Result<Vec<SprintRecord>, JiraClientError> {
        let url = format!("{}/{AGILE_API}/board/{board_id}/sprint", self.config.base_url);
        let mut start_at = 0u32;
        let mut sprints = Vec::new();

        loop {
            let page: SprintPage = self.request_with_retry(&url, start_at).await?;
            let page_len = page.values.len() as u32;
            sprints.extend(page.values);

            if page.is_last || page_len == 0 {
                break;
            }
            start_at += page_len;
        }

        tracing::debug!(board_id, count = sprints.len(), "Fetched board sprints");
        Ok(sprints)
    }

    /// All issues of a sprint in Jira's order, following pages until `total`.
    pub async fn fetch_sprint_issues(
        &self,
        sprint_id: i64,
    ) -> Result<Vec<IssueRecord>, JiraClientError> {
        let url = format!("{}/{AGILE_API}/sprint/{sprint_id}/issue", self.config.base_url);
        let mut start_at = 0u32;
        let mut issues = Vec::new();

        loop {
            let page: IssuePage = self.request_with_retry(&url, start_at).await?;
            let done = page.is_final();
            let page_len = page.issues.len() as u32;
            issues.extend(page.issues);

            if done {
                break;
            }
            start_at += page_len;
        }

        tracing::debug!(sprint_id, count = issues.len(), "Fetched sprint issues");
        Ok(issues)
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
        start_at: u32,
    ) -> Result<T, JiraClientError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.backoff_unit * backoff_factor(attempt);
                tracing::warn!(attempt, ?backoff, url, "retrying Jira request after backoff");
                tokio::time::sleep(backoff).await;
            }

            let response = match self
                .client
                .get(url)
                .query(&[("startAt", start_at), ("maxResults", self.config.page_size)])
                .basic_auth(&self.config.email, Some(&self.config.api_token))
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(JiraClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response.json::<T>().await.map_err(JiraClientError::RequestError);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited by Jira, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(JiraClientError::HttpError { status, body });
        }

        Err(JiraClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries.saturating_add(1),
            last_error,
        })
    }
}

/// `2^attempt` capped at 30, for any retry count.
fn backoff_factor(attempt: u32) -> u32 {
    1u32.checked_shl(attempt).unwrap_or(u32::MAX).min(30)
}

#[async_trait]
impl BacklogSource for JiraClient {
    async fn list_sprints(&self, board_id: i64) -> BacklogResult<Vec<SprintRecord>> {
        Ok(self.fetch_board_sprints(board_id).await?)
    }

    async fn list_issues_for_sprint(&self, sprint_id: i64) -> BacklogResult<Vec<IssueRecord>> {
        Ok(self.fetch_sprint_issues(sprint_id).await?)
    }
}
