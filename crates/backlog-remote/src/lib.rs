//! Outbound collaborators: the Jira Agile REST API as the remote backlog
//! source, and an OpenAI-compatible chat-completions API as the summarizer.

pub mod jira;
pub mod openai;

pub use jira::{JiraClient, JiraClientError};
pub use openai::{OpenAiSummarizer, SummarizerError, UnconfiguredSummarizer};
