use serde::{Deserialize, Serialize};

use crate::IssueRecord;

pub type IssueId = i64;

/// An issue de-duplicated by `jira_key` across every sprint that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub jira_key: String,
    pub summary: String,
    pub description: Option<String>,
    pub is_subtask: bool,
    /// Key of the parent issue, which need not be stored locally.
    pub parent_key: Option<String>,
}

impl Issue {
    /// One backlog line: `- KEY: summary (parent: PARENT)`.
    pub fn backlog_line(&self) -> String {
        let parent = self
            .parent_key
            .as_deref()
            .map(|p| format!("(parent: {})", p))
            .unwrap_or_default();
        format!("- {}: {} {}", self.jira_key, self.summary, parent)
            .trim_end()
            .to_string()
    }
}

/// Field values for an issue row that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub jira_key: String,
    pub summary: String,
    pub description: Option<String>,
    pub is_subtask: bool,
    pub parent_key: Option<String>,
}

impl From<&IssueRecord> for NewIssue {
    fn from(record: &IssueRecord) -> Self {
        Self {
            jira_key: record.key.clone(),
            summary: record.fields.summary.clone().unwrap_or_default(),
            description: record.description_text(),
            is_subtask: record.is_subtask(),
            parent_key: record.parent_key().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, summary: &str, parent: Option<&str>) -> Issue {
        Issue {
            id: 1,
            jira_key: key.to_string(),
            summary: summary.to_string(),
            description: None,
            is_subtask: parent.is_some(),
            parent_key: parent.map(String::from),
        }
    }

    #[test]
    fn test_backlog_line_without_parent() {
        assert_eq!(issue("A-1", "Fix bug", None).backlog_line(), "- A-1: Fix bug");
    }

    #[test]
    fn test_backlog_line_with_parent() {
        assert_eq!(
            issue("A-2", "Sub task", Some("A-1")).backlog_line(),
            "- A-2: Sub task (parent: A-1)"
        );
    }

    #[test]
    fn test_new_issue_from_record() {
        let record = IssueRecord::new("A-2", "Sub task").subtask_of("A-1");
        let new_issue = NewIssue::from(&record);
        assert_eq!(new_issue.jira_key, "A-2");
        assert_eq!(new_issue.summary, "Sub task");
        assert!(new_issue.is_subtask);
        assert_eq!(new_issue.parent_key.as_deref(), Some("A-1"));
        assert!(new_issue.description.is_none());
    }
}
