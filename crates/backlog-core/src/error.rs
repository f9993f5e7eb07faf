use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacklogError {
    /// Nothing local satisfies the read and no refresh was requested.
    #[error("Not cached: {0}")]
    NotCached(String),

    /// The remote backlog source failed (transport, status, payload).
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The summarization collaborator failed.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// A sync step ran out of order, e.g. linking against an unpersisted sprint.
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure class reported to inbound callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    NotFound,
    UpstreamFailure,
    DependencyFailure,
    Internal,
}

impl BacklogError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::NotCached(_) => FailureClass::NotFound,
            Self::Upstream(_) => FailureClass::UpstreamFailure,
            Self::Dependency(_) => FailureClass::DependencyFailure,
            Self::Consistency(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Io(_) => FailureClass::Internal,
        }
    }
}
