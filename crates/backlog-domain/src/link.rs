use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IssueId, SprintId};

/// Membership of an issue in a sprint's backlog as of that sprint's last sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintIssueLink {
    pub sprint_id: SprintId,
    pub issue_id: IssueId,
    pub added_at: DateTime<Utc>,
}
