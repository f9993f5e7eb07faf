pub mod client;
pub mod models;

pub use client::{JiraClient, JiraClientError};
pub use models::{IssuePage, SprintPage};
