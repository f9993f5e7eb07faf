use async_trait::async_trait;
use backlog_core::BacklogResult;
use backlog_domain::{Issue, IssueRecord, Sprint, SprintId, SprintIssueLink, SprintRecord};
use chrono::{DateTime, Utc};

/// Counts produced by one sprint backlog replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Issue rows created because their key was not known yet
    pub issues_created: usize,
    /// Link rows written for the sprint
    pub links_created: usize,
    /// Link rows deleted before the new backlog was written
    pub links_removed: usize,
}

/// Durable keyed storage for sprints, issues and sprint backlog links.
///
/// Every write is either an upsert keyed on a natural key or a replace-all of
/// one sprint's links, so overlapping syncs of the same key are harmless.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Sprints known for a board, in discovery order
    async fn sprints_for_board(&self, board_id: i64) -> BacklogResult<Vec<Sprint>>;

    /// Point lookup by Jira sprint id
    async fn find_sprint(&self, jira_id: i64) -> BacklogResult<Option<Sprint>>;

    /// Upsert every record on `jira_id` in one transaction, refreshing name
    /// and state. A sprint with no board yet is attached to `board_id`.
    async fn upsert_board_sprints(
        &self,
        board_id: i64,
        records: &[SprintRecord],
    ) -> BacklogResult<()>;

    /// Insert a placeholder sprint unless one exists, committed immediately
    async fn ensure_sprint(&self, jira_id: i64) -> BacklogResult<Sprint>;

    /// Replace the sprint's backlog in one transaction: drop its links, insert
    /// unknown issues, link every record, and stamp `issues_synced`.
    async fn replace_sprint_issues(
        &self,
        sprint_id: SprintId,
        records: &[IssueRecord],
        synced_at: DateTime<Utc>,
    ) -> BacklogResult<MergeStats>;

    /// Issues linked to the sprint, in the order the remote listed them
    async fn issues_for_sprint(&self, sprint_id: SprintId) -> BacklogResult<Vec<Issue>>;

    /// Point lookup by issue key
    async fn find_issue(&self, jira_key: &str) -> BacklogResult<Option<Issue>>;

    async fn links_for_sprint(&self, sprint_id: SprintId) -> BacklogResult<Vec<SprintIssueLink>>;

    async fn store_summary(
        &self,
        sprint_id: SprintId,
        summary: &str,
        updated_at: DateTime<Utc>,
    ) -> BacklogResult<()>;
}
