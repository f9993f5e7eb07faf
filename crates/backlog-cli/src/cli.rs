use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "backlog")]
#[command(about = "Caching proxy for Jira sprint backlogs with LLM sprint summaries", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to config file (default: <config dir>/backlog/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "BACKLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite cache, overriding config and BACKLOG_DB
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Board queries
    Board(BoardCommand),
    /// Sprint queries
    Sprint(SprintCommand),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct BoardCommand {
    #[command(subcommand)]
    pub action: BoardAction,
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// List sprints of a board
    Sprints {
        #[arg(long)]
        board_id: i64,
        /// Fetch from Jira even when sprints are cached
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Args)]
pub struct SprintCommand {
    #[command(subcommand)]
    pub action: SprintAction,
}

#[derive(Subcommand)]
pub enum SprintAction {
    /// Show a sprint and its issues
    Issues {
        /// Jira sprint id
        #[arg(long)]
        id: i64,
        /// Fetch from Jira even when issues are cached
        #[arg(long)]
        refresh: bool,
    },
    /// Summarize a sprint's goals
    Summary {
        /// Jira sprint id
        #[arg(long)]
        id: i64,
        /// Refetch issues and regenerate the summary
        #[arg(long)]
        force_refresh: bool,
    },
}
