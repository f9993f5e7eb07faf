use async_trait::async_trait;
use backlog_core::BacklogResult;

use crate::{Issue, IssueRecord, Sprint, SprintRecord};

/// Remote source of sprints and issues. Implementations report every failure
/// as `BacklogError::Upstream` and keep no cache of their own.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BacklogSource: Send + Sync {
    async fn list_sprints(&self, board_id: i64) -> BacklogResult<Vec<SprintRecord>>;

    async fn list_issues_for_sprint(&self, sprint_id: i64) -> BacklogResult<Vec<IssueRecord>>;
}

/// Input to a sprint summary: sprint metadata plus its ordered backlog.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub sprint_name: String,
    pub sprint_state: String,
    pub issues: Vec<Issue>,
}

impl SummaryRequest {
    pub fn new(sprint: &Sprint, issues: &[Issue]) -> Self {
        Self {
            sprint_name: sprint.name.clone(),
            sprint_state: sprint.state.clone(),
            issues: issues.to_vec(),
        }
    }

    pub fn backlog_lines(&self) -> String {
        self.issues
            .iter()
            .map(Issue::backlog_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Stateless transform from a sprint backlog to summary text. Implementations
/// report failures as `BacklogError::Dependency`.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: SummaryRequest) -> BacklogResult<String>;
}
