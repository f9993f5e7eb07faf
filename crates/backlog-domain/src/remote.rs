//! Records as returned by the remote backlog source.
//!
//! Shapes follow the Jira Agile REST API (`/board/{id}/sprint` values and
//! `/sprint/{id}/issue` issues). Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub state: String,
}

impl SprintRecord {
    pub fn new(id: i64, name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: state.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    /// Plain text, or an Atlassian document for newer API versions.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub issuetype: Option<IssueTypeRef>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub key: String,
}

impl IssueRecord {
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: IssueFields {
                summary: Some(summary.into()),
                ..Default::default()
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.description = Some(Value::String(description.into()));
        self
    }

    pub fn subtask_of(mut self, parent_key: impl Into<String>) -> Self {
        self.fields.issuetype = Some(IssueTypeRef { subtask: true });
        self.fields.parent = Some(ParentRef {
            key: parent_key.into(),
        });
        self
    }

    pub fn is_subtask(&self) -> bool {
        self.fields
            .issuetype
            .as_ref()
            .map(|t| t.subtask)
            .unwrap_or(false)
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.fields.parent.as_ref().map(|p| p.key.as_str())
    }

    pub fn description_text(&self) -> Option<String> {
        self.fields.description.as_ref().and_then(plain_text)
    }
}

const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "blockquote",
    "codeBlock",
    "listItem",
    "tableRow",
    "panel",
];

fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => {
            let mut out = String::new();
            collect_document_text(value, &mut out);
            let text = out.trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        other => Some(other.to_string()),
    }
}

fn collect_document_text(node: &Value, out: &mut String) {
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or_default();

    if node_type == "hardBreak" {
        out.push('\n');
        return;
    }
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_document_text(child, out);
        }
    }
    if BLOCK_NODES.contains(&node_type) && !out.ends_with('\n') {
        out.push('\n');
    }
}
