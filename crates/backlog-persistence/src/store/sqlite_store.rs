use crate::traits::{MergeStats, RecordStore};
use async_trait::async_trait;
use backlog_core::{BacklogError, BacklogResult};
use backlog_domain::{
    Issue, IssueRecord, NewIssue, Sprint, SprintId, SprintIssueLink, SprintRecord,
    PLACEHOLDER_STATE,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = include_str!("../schema.sql");

const SPRINT_COLUMNS: &str =
    "id, jira_id, name, state, board_id, issues_synced, summary_text, summary_updated";

const ISSUE_COLUMNS: &str = "id, jira_key, summary, description, is_subtask, parent_key";

pub struct SqliteStore {
    path: PathBuf,
    pool: tokio::sync::OnceCell<Pool<Sqlite>>,
}

fn database_error(e: sqlx::Error) -> BacklogError {
    BacklogError::Database(e.to_string())
}

/// Fixed-width RFC 3339 so text comparison in SQL matches time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: Option<String>) -> BacklogResult<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| BacklogError::Serialization(format!("bad timestamp {s:?}: {e}")))
    })
    .transpose()
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pool: tokio::sync::OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn get_pool(&self) -> BacklogResult<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }

                let options = SqliteConnectOptions::new()
                    .filename(&self.path)
                    .create_if_missing(true)
                    .foreign_keys(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(Duration::from_secs(5));

                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
                    .map_err(database_error)?;

                // Initialize schema
                sqlx::raw_sql(SCHEMA)
                    .execute(&pool)
                    .await
                    .map_err(database_error)?;

                tracing::debug!("Opened record store at {}", self.path.display());
                Ok::<_, BacklogError>(pool)
            })
            .await
    }

    fn row_to_sprint(row: &SqliteRow) -> BacklogResult<Sprint> {
        Ok(Sprint {
            id: row.try_get("id").map_err(database_error)?,
            jira_id: row.try_get("jira_id").map_err(database_error)?,
            name: row.try_get("name").map_err(database_error)?,
            state: row.try_get("state").map_err(database_error)?,
            board_id: row.try_get("board_id").map_err(database_error)?,
            issues_synced: decode_timestamp(row.try_get("issues_synced").map_err(database_error)?)?,
            summary_text: row.try_get("summary_text").map_err(database_error)?,
            summary_updated: decode_timestamp(
                row.try_get("summary_updated").map_err(database_error)?,
            )?,
        })
    }

    fn row_to_issue(row: &SqliteRow) -> BacklogResult<Issue> {
        Ok(Issue {
            id: row.try_get("id").map_err(database_error)?,
            jira_key: row.try_get("jira_key").map_err(database_error)?,
            summary: row.try_get("summary").map_err(database_error)?,
            description: row.try_get("description").map_err(database_error)?,
            is_subtask: row.try_get("is_subtask").map_err(database_error)?,
            parent_key: row.try_get("parent_key").map_err(database_error)?,
        })
    }

    fn row_to_link(row: &SqliteRow) -> BacklogResult<SprintIssueLink> {
        let added_at: String = row.try_get("added_at").map_err(database_error)?;
        Ok(SprintIssueLink {
            sprint_id: row.try_get("sprint_id").map_err(database_error)?,
            issue_id: row.try_get("issue_id").map_err(database_error)?,
            added_at: decode_timestamp(Some(added_at))?.ok_or_else(|| {
                BacklogError::Serialization("link without added_at".to_string())
            })?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn sprints_for_board(&self, board_id: i64) -> BacklogResult<Vec<Sprint>> {
        let pool = self.get_pool().await?;
        sqlx::query(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE board_id = ? ORDER BY id"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
        .map_err(database_error)?
        .iter()
        .map(Self::row_to_sprint)
        .collect()
    }

    async fn find_sprint(&self, jira_id: i64) -> BacklogResult<Option<Sprint>> {
        let pool = self.get_pool().await?;
        sqlx::query(&format!("SELECT {SPRINT_COLUMNS} FROM sprints WHERE jira_id = ?"))
            .bind(jira_id)
            .fetch_optional(pool)
            .await
            .map_err(database_error)?
            .as_ref()
            .map(Self::row_to_sprint)
            .transpose()
    }

    async fn upsert_board_sprints(
        &self,
        board_id: i64,
        records: &[SprintRecord],
    ) -> BacklogResult<()> {
        let pool = self.get_pool().await?;
        let mut tx = pool.begin().await.map_err(database_error)?;

        for record in records {
            sqlx::query(
                "INSERT INTO sprints (jira_id, name, state, board_id)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(jira_id) DO UPDATE SET
                    name = excluded.name,
                    state = excluded.state,
                    board_id = COALESCE(sprints.board_id, excluded.board_id)",
            )
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.state)
            .bind(board_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        }

        tx.commit().await.map_err(database_error)?;
        tracing::debug!(board_id, count = records.len(), "Upserted board sprints");
        Ok(())
    }

    async fn ensure_sprint(&self, jira_id: i64) -> BacklogResult<Sprint> {
        let pool = self.get_pool().await?;
        let inserted = sqlx::query(
            "INSERT INTO sprints (jira_id, name, state, board_id)
             VALUES (?, ?, ?, NULL)
             ON CONFLICT(jira_id) DO NOTHING",
        )
        .bind(jira_id)
        .bind(Sprint::placeholder_name(jira_id))
        .bind(PLACEHOLDER_STATE)
        .execute(pool)
        .await
        .map_err(database_error)?
        .rows_affected();

        if inserted > 0 {
            tracing::debug!(jira_id, "Created placeholder sprint");
        }

        self.find_sprint(jira_id).await?.ok_or_else(|| {
            BacklogError::Consistency(format!("sprint {jira_id} missing right after insert"))
        })
    }

    async fn replace_sprint_issues(
        &self,
        sprint_id: SprintId,
        records: &[IssueRecord],
        synced_at: DateTime<Utc>,
    ) -> BacklogResult<MergeStats> {
        let pool = self.get_pool().await?;
        let mut tx = pool.begin().await.map_err(database_error)?;

        // Write first so the transaction holds the write lock from the start.
        let links_removed = sqlx::query("DELETE FROM sprint_issues WHERE sprint_id = ?")
            .bind(sprint_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?
            .rows_affected();

        let sprint_exists = sqlx::query("SELECT 1 FROM sprints WHERE id = ?")
            .bind(sprint_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(database_error)?
            .is_some();
        if !sprint_exists {
            tracing::error!(
                sprint_id,
                "Refusing to link issues to a sprint that is not persisted"
            );
            return Err(BacklogError::Consistency(format!(
                "no persisted sprint with internal id {sprint_id}"
            )));
        }

        let added_at = encode_timestamp(synced_at);
        let mut stats = MergeStats {
            links_removed: links_removed as usize,
            ..Default::default()
        };

        for record in records {
            let new_issue = NewIssue::from(record);

            // Known issues keep their stored fields.
            let created = sqlx::query(
                "INSERT INTO issues (jira_key, summary, description, is_subtask, parent_key)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(jira_key) DO NOTHING",
            )
            .bind(&new_issue.jira_key)
            .bind(&new_issue.summary)
            .bind(&new_issue.description)
            .bind(new_issue.is_subtask)
            .bind(&new_issue.parent_key)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?
            .rows_affected();
            stats.issues_created += created as usize;

            let issue_id: i64 = sqlx::query_scalar("SELECT id FROM issues WHERE jira_key = ?")
                .bind(&new_issue.jira_key)
                .fetch_one(&mut *tx)
                .await
                .map_err(database_error)?;

            let linked = sqlx::query(
                "INSERT INTO sprint_issues (sprint_id, issue_id, added_at)
                 VALUES (?, ?, ?)
                 ON CONFLICT(sprint_id, issue_id) DO NOTHING",
            )
            .bind(sprint_id)
            .bind(issue_id)
            .bind(&added_at)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?
            .rows_affected();
            stats.links_created += linked as usize;
        }

        sqlx::query(
            "UPDATE sprints SET issues_synced = MAX(COALESCE(issues_synced, ?), ?) WHERE id = ?",
        )
        .bind(&added_at)
        .bind(&added_at)
        .bind(sprint_id)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        tx.commit().await.map_err(database_error)?;
        Ok(stats)
    }

    async fn issues_for_sprint(&self, sprint_id: SprintId) -> BacklogResult<Vec<Issue>> {
        let pool = self.get_pool().await?;
        sqlx::query(
            "SELECT i.id, i.jira_key, i.summary, i.description, i.is_subtask, i.parent_key
             FROM sprint_issues l
             JOIN issues i ON i.id = l.issue_id
             WHERE l.sprint_id = ?
             ORDER BY l.rowid",
        )
        .bind(sprint_id)
        .fetch_all(pool)
        .await
        .map_err(database_error)?
        .iter()
        .map(Self::row_to_issue)
        .collect()
    }

    async fn find_issue(&self, jira_key: &str) -> BacklogResult<Option<Issue>> {
        let pool = self.get_pool().await?;
        sqlx::query(&format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE jira_key = ?"))
            .bind(jira_key)
            .fetch_optional(pool)
            .await
            .map_err(database_error)?
            .as_ref()
            .map(Self::row_to_issue)
            .transpose()
    }

    async fn links_for_sprint(&self, sprint_id: SprintId) -> BacklogResult<Vec<SprintIssueLink>> {
        let pool = self.get_pool().await?;
        sqlx::query(
            "SELECT sprint_id, issue_id, added_at FROM sprint_issues
             WHERE sprint_id = ? ORDER BY rowid",
        )
        .bind(sprint_id)
        .fetch_all(pool)
        .await
        .map_err(database_error)?
        .iter()
        .map(Self::row_to_link)
        .collect()
    }

    async fn store_summary(
        &self,
        sprint_id: SprintId,
        summary: &str,
        updated_at: DateTime<Utc>,
    ) -> BacklogResult<()> {
        let pool = self.get_pool().await?;
        let updated = sqlx::query(
            "UPDATE sprints SET summary_text = ?, summary_updated = ? WHERE id = ?",
        )
        .bind(summary)
        .bind(encode_timestamp(updated_at))
        .bind(sprint_id)
        .execute(pool)
        .await
        .map_err(database_error)?
        .rows_affected();

        if updated == 0 {
            tracing::error!(sprint_id, "Summary produced for a sprint that is not persisted");
            return Err(BacklogError::Consistency(format!(
                "no persisted sprint with internal id {sprint_id}"
            )));
        }
        Ok(())
    }
}
