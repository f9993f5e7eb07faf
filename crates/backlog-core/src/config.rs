use crate::{BacklogError, BacklogResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub jira: Option<JiraConfig>,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Connection settings for the Jira Agile REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl JiraConfig {
    pub fn new(base_url: String, email: String, api_token: String) -> Self {
        Self {
            base_url,
            email,
            api_token,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            page_size: default_page_size(),
        }
    }
}

/// Settings for the chat-completions API used to summarize sprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Language the summary lists are written in.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            language: default_language(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_page_size() -> u32 {
    50
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_language() -> String {
    "Russian".to_string()
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/backlog/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("backlog/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("backlog\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Load from `explicit` (must exist) or the default config path (optional),
    /// then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> BacklogResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> BacklogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BacklogError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> BacklogResult<Self> {
        toml::from_str(content).map_err(|e| BacklogError::Config(e.to_string()))
    }

    /// Overlay values from `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> BacklogResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("BACKLOG_DB") {
            self.database_path = Some(PathBuf::from(db));
        }

        match self.jira.as_mut() {
            Some(jira) => {
                if let Some(v) = lookup("JIRA_BASE_URL") {
                    jira.base_url = v;
                }
                if let Some(v) = lookup("JIRA_EMAIL") {
                    jira.email = v;
                }
                if let Some(v) = lookup("JIRA_API_TOKEN") {
                    jira.api_token = v;
                }
            }
            None => {
                if let (Some(base_url), Some(email), Some(token)) = (
                    lookup("JIRA_BASE_URL"),
                    lookup("JIRA_EMAIL"),
                    lookup("JIRA_API_TOKEN"),
                ) {
                    self.jira = Some(JiraConfig::new(base_url, email, token));
                }
            }
        }

        if let Some(jira) = self.jira.as_mut() {
            if let Some(v) = lookup("JIRA_MAX_RETRIES") {
                jira.max_retries = parse_var("JIRA_MAX_RETRIES", &v)?;
            }
            if let Some(v) = lookup("JIRA_TIMEOUT_SECS") {
                jira.timeout_secs = parse_var("JIRA_TIMEOUT_SECS", &v)?;
            }
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_BASE_URL") {
            self.llm.api_base = base;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.model = model;
        }

        Ok(())
    }

    pub fn jira(&self) -> BacklogResult<&JiraConfig> {
        let jira = self.jira.as_ref().ok_or_else(|| {
            BacklogError::Config(
                "Jira is not configured: set JIRA_BASE_URL, JIRA_EMAIL and JIRA_API_TOKEN \
                 or add a [jira] section to the config file"
                    .to_string(),
            )
        })?;

        let missing: Vec<&str> = [
            ("base_url", &jira.base_url),
            ("email", &jira.email),
            ("api_token", &jira.api_token),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(BacklogError::Config(format!(
                "Jira config has empty fields: {}",
                missing.join(", ")
            )));
        }
        Ok(jira)
    }

    pub fn database_path(&self) -> BacklogResult<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| dirs::data_dir().map(|data| data.join("backlog").join("backlog.db")))
            .ok_or_else(|| {
                BacklogError::Config("no database path configured and no data dir".to_string())
            })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> BacklogResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BacklogError::Config(format!("invalid {key}: {value}")))
}
