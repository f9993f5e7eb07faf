use std::sync::Arc;

use backlog_core::{BacklogError, BacklogResult};
use backlog_domain::{BacklogSource, Sprint, SprintIssues, Summarizer, SummaryRequest};
use backlog_persistence::RecordStore;
use chrono::Utc;

/// Decides cache hit versus refresh and merges remote records into the store.
///
/// Holds no locks of its own. Overlapping refreshes of the same board or
/// sprint only repeat work, since every store write is an upsert or a
/// replace-all of one sprint's links.
#[derive(Clone)]
pub struct BacklogSync {
    store: Arc<dyn RecordStore>,
    source: Arc<dyn BacklogSource>,
    summarizer: Arc<dyn Summarizer>,
}

impl BacklogSync {
    pub fn new(
        store: Arc<dyn RecordStore>,
        source: Arc<dyn BacklogSource>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            store,
            source,
            summarizer,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Sprints of a board in discovery order.
    ///
    /// Served from the store when it already knows sprints for the board and
    /// `refresh` is false. Otherwise the board is listed remotely, upserted
    /// on `jira_id` in one transaction, and re-read.
    #[tracing::instrument(skip(self))]
    pub async fn sprints_for_board(&self, board_id: i64, refresh: bool) -> BacklogResult<Vec<Sprint>> {
        if !refresh {
            let cached = self.store.sprints_for_board(board_id).await?;
            if !cached.is_empty() {
                tracing::debug!(count = cached.len(), "Serving board sprints from cache");
                return Ok(cached);
            }
        }

        let records = self.source.list_sprints(board_id).await?;
        self.store.upsert_board_sprints(board_id, &records).await?;

        let sprints = self.store.sprints_for_board(board_id).await?;
        tracing::info!(fetched = records.len(), stored = sprints.len(), "Synced board sprints");
        Ok(sprints)
    }

    /// A sprint and the issues currently linked to it.
    ///
    /// A sprint whose issues were synced before is served from the store
    /// unless `refresh` is set. An unknown sprint without `refresh` is
    /// `NotCached`. A known sprint that was never synced is fetched.
    #[tracing::instrument(skip(self))]
    pub async fn issues_for_sprint(&self, sprint_id: i64, refresh: bool) -> BacklogResult<SprintIssues> {
        let existing = self.store.find_sprint(sprint_id).await?;

        if !refresh {
            match &existing {
                Some(sprint) if sprint.has_synced_issues() => {
                    let issues = self.store.issues_for_sprint(sprint.id).await?;
                    tracing::debug!(count = issues.len(), "Serving sprint issues from cache");
                    return Ok(SprintIssues {
                        sprint: sprint.clone(),
                        issues,
                    });
                }
                Some(_) => {
                    tracing::debug!("Sprint known but never synced, fetching issues");
                }
                None => {
                    return Err(BacklogError::NotCached(format!(
                        "sprint {sprint_id} is not cached; request a refresh to fetch it"
                    )));
                }
            }
        }

        // Fetch before any write so a remote failure leaves the store untouched.
        let records = self.source.list_issues_for_sprint(sprint_id).await?;

        let sprint = match existing {
            Some(sprint) => sprint,
            None => self.store.ensure_sprint(sprint_id).await?,
        };
        let stats = self
            .store
            .replace_sprint_issues(sprint.id, &records, Utc::now())
            .await?;
        tracing::info!(
            fetched = records.len(),
            issues_created = stats.issues_created,
            links_created = stats.links_created,
            links_removed = stats.links_removed,
            "Synced sprint issues"
        );

        let sprint = self.store.find_sprint(sprint_id).await?.ok_or_else(|| {
            tracing::error!(sprint_id, "Sprint vanished right after its issue sync");
            BacklogError::Consistency(format!("sprint {sprint_id} missing after issue sync"))
        })?;
        let issues = self.store.issues_for_sprint(sprint.id).await?;
        Ok(SprintIssues { sprint, issues })
    }

    /// Summary text for a sprint, generated on first request and cached.
    ///
    /// `force_refresh` regenerates the summary and also refreshes the sprint's
    /// issues. A failed generation leaves any earlier summary in place.
    #[tracing::instrument(skip(self))]
    pub async fn sprint_summary(&self, sprint_id: i64, force_refresh: bool) -> BacklogResult<String> {
        if !force_refresh {
            if let Some(sprint) = self.store.find_sprint(sprint_id).await? {
                if let Some(summary) = sprint.cached_summary() {
                    tracing::debug!("Serving sprint summary from cache");
                    return Ok(summary.to_string());
                }
            }
        }

        let SprintIssues { sprint, issues } =
            self.issues_for_sprint(sprint_id, force_refresh).await?;

        let summary = self
            .summarizer
            .summarize(SummaryRequest::new(&sprint, &issues))
            .await?;

        self.store
            .store_summary(sprint.id, &summary, Utc::now())
            .await?;
        tracing::info!(issues = issues.len(), "Stored sprint summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backlog_domain::{IssueRecord, MockBacklogSource, MockSummarizer, SprintRecord};
    use backlog_persistence::SqliteStore;
    use tempfile::{tempdir, TempDir};

    fn engine(source: MockBacklogSource, summarizer: MockSummarizer) -> (BacklogSync, TempDir) {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("backlog.db"));
        let sync = BacklogSync::new(Arc::new(store), Arc::new(source), Arc::new(summarizer));
        (sync, dir)
    }

    #[tokio::test]
    async fn test_board_cache_hit_skips_remote() {
        let mut source = MockBacklogSource::new();
        source
            .expect_list_sprints()
            .times(1)
            .returning(|_| Ok(vec![SprintRecord::new(10, "Sprint 10", "active")]));
        let (sync, _dir) = engine(source, MockSummarizer::new());

        let first = sync.sprints_for_board(7, false).await.unwrap();
        let second = sync.sprints_for_board(7, false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second[0].board_id, Some(7));
    }

    #[tokio::test]
    async fn test_board_refresh_updates_state() {
        let mut source = MockBacklogSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_list_sprints()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![SprintRecord::new(10, "Sprint 10", "future")]));
        source
            .expect_list_sprints()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![SprintRecord::new(10, "Sprint 10", "active")]));
        let (sync, _dir) = engine(source, MockSummarizer::new());

        sync.sprints_for_board(7, false).await.unwrap();
        let refreshed = sync.sprints_for_board(7, true).await.unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].state, "active");
    }

    #[tokio::test]
    async fn test_board_upstream_failure_propagates() {
        let mut source = MockBacklogSource::new();
        source
            .expect_list_sprints()
            .returning(|_| Err(BacklogError::Upstream("HTTP 503".into())));
        let (sync, _dir) = engine(source, MockSummarizer::new());

        let err = sync.sprints_for_board(7, false).await.unwrap_err();
        assert!(matches!(err, BacklogError::Upstream(_)));
        assert!(sync.store().sprints_for_board(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sprint_without_refresh_is_not_cached() {
        let mut source = MockBacklogSource::new();
        source.expect_list_issues_for_sprint().times(0);
        let (sync, _dir) = engine(source, MockSummarizer::new());

        let err = sync.issues_for_sprint(55, false).await.unwrap_err();
        assert!(matches!(err, BacklogError::NotCached(_)));
    }

    #[tokio::test]
    async fn test_listed_but_unsynced_sprint_is_fetched() {
        let mut source = MockBacklogSource::new();
        source
            .expect_list_sprints()
            .returning(|_| Ok(vec![SprintRecord::new(55, "Sprint 55", "active")]));
        source
            .expect_list_issues_for_sprint()
            .times(1)
            .returning(|_| Ok(vec![IssueRecord::new("A-1", "Fix bug")]));
        let (sync, _dir) = engine(source, MockSummarizer::new());

        sync.sprints_for_board(7, false).await.unwrap();
        let result = sync.issues_for_sprint(55, false).await.unwrap();
        assert_eq!(result.sprint.name, "Sprint 55");
        assert_eq!(result.sprint.board_id, Some(7));
        assert!(result.sprint.has_synced_issues());
        assert_eq!(result.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_issue_fetch_creates_no_placeholder() {
        let mut source = MockBacklogSource::new();
        source
            .expect_list_issues_for_sprint()
            .returning(|_| Err(BacklogError::Upstream("timeout".into())));
        let (sync, _dir) = engine(source, MockSummarizer::new());

        let err = sync.issues_for_sprint(55, true).await.unwrap_err();
        assert!(matches!(err, BacklogError::Upstream(_)));
        assert!(sync.store().find_sprint(55).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_failure_is_dependency_error() {
        let mut source = MockBacklogSource::new();
        source
            .expect_list_issues_for_sprint()
            .returning(|_| Ok(vec![IssueRecord::new("A-1", "Fix bug")]));
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .returning(|_| Err(BacklogError::Dependency("no key".into())));
        let (sync, _dir) = engine(source, summarizer);

        sync.issues_for_sprint(55, true).await.unwrap();
        let err = sync.sprint_summary(55, false).await.unwrap_err();
        assert!(matches!(err, BacklogError::Dependency(_)));
        let sprint = sync.store().find_sprint(55).await.unwrap().unwrap();
        assert!(sprint.summary_text.is_none());
    }

    #[tokio::test]
    async fn test_summary_of_unknown_sprint_is_not_cached() {
        let mut summarizer = MockSummarizer::new();
        summarizer.expect_summarize().times(0);
        let (sync, _dir) = engine(MockBacklogSource::new(), summarizer);

        let err = sync.sprint_summary(55, false).await.unwrap_err();
        assert!(matches!(err, BacklogError::NotCached(_)));
    }

    #[tokio::test]
    async fn test_summary_request_carries_ordered_lines() {
        let mut source = MockBacklogSource::new();
        source.expect_list_issues_for_sprint().returning(|_| {
            Ok(vec![
                IssueRecord::new("A-1", "Fix bug"),
                IssueRecord::new("A-2", "Sub task").subtask_of("A-1"),
            ])
        });
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|req| {
                req.sprint_name == "Sprint 55"
                    && req.sprint_state == "unknown"
                    && req.backlog_lines() == "- A-1: Fix bug\n- A-2: Sub task (parent: A-1)"
            })
            .times(1)
            .returning(|_| Ok("goals".to_string()));
        let (sync, _dir) = engine(source, summarizer);

        let summary = sync.sprint_summary(55, true).await.unwrap();
        assert_eq!(summary, "goals");
    }
}
