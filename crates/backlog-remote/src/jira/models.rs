//! Pagination envelopes of the Jira Agile REST API.

use backlog_domain::{IssueRecord, SprintRecord};
use serde::Deserialize;

/// One page of `GET /rest/agile/1.0/board/{id}/sprint`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPage {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub values: Vec<SprintRecord>,
}

/// One page of `GET /rest/agile/1.0/sprint/{id}/issue`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
}

impl IssuePage {
    /// True when this page reaches `total` or carries nothing.
    pub fn is_final(&self) -> bool {
        self.issues.is_empty() || self.start_at as usize + self.issues.len() >= self.total as usize
    }
}
