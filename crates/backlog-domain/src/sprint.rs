use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Issue;

/// Internal surrogate id of a stored sprint.
pub type SprintId = i64;

/// State given to sprints created before any board listing has named them.
pub const PLACEHOLDER_STATE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: SprintId,
    pub jira_id: i64,
    pub name: String,
    pub state: String,
    /// Unknown when the sprint was discovered through a direct issue sync.
    pub board_id: Option<i64>,
    /// Absent until the first successful issue sync.
    pub issues_synced: Option<DateTime<Utc>>,
    pub summary_text: Option<String>,
    pub summary_updated: Option<DateTime<Utc>>,
}

impl Sprint {
    pub fn placeholder_name(jira_id: i64) -> String {
        format!("Sprint {}", jira_id)
    }

    pub fn has_synced_issues(&self) -> bool {
        self.issues_synced.is_some()
    }

    pub fn cached_summary(&self) -> Option<&str> {
        self.summary_text.as_deref()
    }
}

/// A sprint together with the issues currently linked to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SprintIssues {
    pub sprint: Sprint,
    pub issues: Vec<Issue>,
}
