use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use backlog_core::{AppConfig, BacklogError, BacklogResult};
use backlog_domain::{BacklogSource, IssueRecord, SprintRecord, Summarizer};
use backlog_persistence::SqliteStore;
use backlog_remote::{JiraClient, OpenAiSummarizer, UnconfiguredSummarizer};
use backlog_sync::BacklogSync;

/// Stands in for Jira when it is not configured. Cached reads still work;
/// anything that needs the remote reports the configuration problem.
struct UnconfiguredSource {
    reason: String,
}

impl UnconfiguredSource {
    fn fail<T>(&self) -> BacklogResult<T> {
        Err(BacklogError::Config(self.reason.clone()))
    }
}

#[async_trait]
impl BacklogSource for UnconfiguredSource {
    async fn list_sprints(&self, _board_id: i64) -> BacklogResult<Vec<SprintRecord>> {
        self.fail()
    }

    async fn list_issues_for_sprint(&self, _sprint_id: i64) -> BacklogResult<Vec<IssueRecord>> {
        self.fail()
    }
}

pub struct CliContext {
    pub sync: BacklogSync,
}

impl CliContext {
    pub fn load(config_path: Option<&Path>, db_override: Option<&Path>) -> BacklogResult<Self> {
        let config = AppConfig::load(config_path)?;
        Self::from_config(&config, db_override)
    }

    pub fn from_config(config: &AppConfig, db_override: Option<&Path>) -> BacklogResult<Self> {
        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => config.database_path()?,
        };
        tracing::debug!("Using cache database {}", db_path.display());
        let store = Arc::new(SqliteStore::new(db_path));

        let source: Arc<dyn BacklogSource> = match config.jira() {
            Ok(jira) => Arc::new(
                JiraClient::new(jira)
                    .map_err(|e| BacklogError::Config(format!("cannot build Jira client: {e}")))?,
            ),
            Err(BacklogError::Config(reason)) => {
                tracing::debug!("Jira not configured: {reason}");
                Arc::new(UnconfiguredSource { reason })
            }
            Err(other) => return Err(other),
        };

        let summarizer: Arc<dyn Summarizer> = match OpenAiSummarizer::new(&config.llm) {
            Ok(summarizer) => Arc::new(summarizer),
            Err(e) => {
                tracing::debug!("Summaries unavailable: {e}");
                Arc::new(UnconfiguredSummarizer)
            }
        };

        Ok(Self {
            sync: BacklogSync::new(store, source, summarizer),
        })
    }
}
