mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    backlog_core::init_tracing()?;

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "backlog", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = match CliContext::load(cli.config.as_deref(), cli.db.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => output::output_error(&e),
    };

    let result = match cli.command {
        Commands::Board(board_cmd) => handlers::board::handle(&ctx, board_cmd.action).await,
        Commands::Sprint(sprint_cmd) => handlers::sprint::handle(&ctx, sprint_cmd.action).await,
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = result {
        tracing::debug!("Command failed: {e}");
        output::output_error(&e);
    }

    Ok(())
}
