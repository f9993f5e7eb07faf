pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use config::{AppConfig, JiraConfig, LlmConfig};
pub use error::{BacklogError, FailureClass};
pub use logging::init_tracing;
pub use result::BacklogResult;
