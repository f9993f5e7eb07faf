//! Response shapes handed to consumers of the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Issue, Sprint, SprintIssues};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintView {
    pub jira_id: i64,
    pub name: String,
    pub state: String,
    pub board_id: Option<i64>,
    pub issues_synced: Option<DateTime<Utc>>,
    pub summary_updated: Option<DateTime<Utc>>,
}

impl From<&Sprint> for SprintView {
    fn from(sprint: &Sprint) -> Self {
        Self {
            jira_id: sprint.jira_id,
            name: sprint.name.clone(),
            state: sprint.state.clone(),
            board_id: sprint.board_id,
            issues_synced: sprint.issues_synced,
            summary_updated: sprint.summary_updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueView {
    pub jira_key: String,
    pub summary: String,
    pub description: Option<String>,
    pub is_subtask: bool,
    pub parent_key: Option<String>,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        Self {
            jira_key: issue.jira_key.clone(),
            summary: issue.summary.clone(),
            description: issue.description.clone(),
            is_subtask: issue.is_subtask,
            parent_key: issue.parent_key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintWithIssues {
    pub jira_id: i64,
    pub name: String,
    pub state: String,
    pub board_id: Option<i64>,
    pub issues_synced: Option<DateTime<Utc>>,
    pub summary_updated: Option<DateTime<Utc>>,
    pub issues: Vec<IssueView>,
}

impl From<&SprintIssues> for SprintWithIssues {
    fn from(value: &SprintIssues) -> Self {
        Self {
            jira_id: value.sprint.jira_id,
            name: value.sprint.name.clone(),
            state: value.sprint.state.clone(),
            board_id: value.sprint.board_id,
            issues_synced: value.sprint.issues_synced,
            summary_updated: value.sprint.summary_updated,
            issues: value.issues.iter().map(IssueView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintSummaryView {
    pub sprint_id: i64,
    pub summary: String,
}
