//! Sprint summaries through an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use backlog_core::{BacklogError, BacklogResult, LlmConfig};
use backlog_domain::{Summarizer, SummaryRequest};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("language model API key not configured (set OPENAI_API_KEY or [llm].api_key)")]
    MissingApiKey,

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("empty completion")]
    EmptyResponse,
}

impl From<SummarizerError> for BacklogError {
    fn from(err: SummarizerError) -> Self {
        BacklogError::Dependency(err.to_string())
    }
}

/// System and user messages for one sprint summary.
pub fn build_messages(request: &SummaryRequest, language: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are an Agile assistant. \
         Descriptions of issues may be in Russian or English. \
         Given a sprint backlog, produce two lists in {language}: \
         1) main goals, 2) secondary goals."
    );
    let user = format!(
        "Sprint name: {}\nSprint state: {}\nIssues:\n{}",
        request.sprint_name,
        request.sprint_state,
        request.backlog_lines()
    );
    vec![
        ChatMessage::new("system", system),
        ChatMessage::new("user", user),
    ]
}

pub struct OpenAiSummarizer {
    client: Client,
    config: LlmConfig,
    api_key: String,
}

impl OpenAiSummarizer {
    pub fn new(config: &LlmConfig) -> Result<Self, SummarizerError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SummarizerError::MissingApiKey)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, SummarizerError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::HttpError { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(SummarizerError::EmptyResponse)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> BacklogResult<String> {
        let messages = build_messages(&request, &self.config.language);
        tracing::debug!(
            model = %self.config.model,
            issues = request.issues.len(),
            "Requesting sprint summary"
        );
        Ok(self.complete(messages).await?)
    }
}

/// Stands in when no API key is configured, so cache reads keep working.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSummarizer;

#[async_trait]
impl Summarizer for UnconfiguredSummarizer {
    async fn summarize(&self, _request: SummaryRequest) -> BacklogResult<String> {
        Err(SummarizerError::MissingApiKey.into())
    }
}
