pub mod client;

pub use client::{build_messages, ChatMessage, OpenAiSummarizer, SummarizerError, UnconfiguredSummarizer};
