use crate::cli::SprintAction;
use crate::context::CliContext;
use crate::output;
use backlog_core::BacklogResult;
use backlog_domain::{SprintSummaryView, SprintWithIssues};

pub async fn handle(ctx: &CliContext, action: SprintAction) -> BacklogResult<()> {
    match action {
        SprintAction::Issues { id, refresh } => {
            let result = ctx.sync.issues_for_sprint(id, refresh).await?;
            output::output_success(SprintWithIssues::from(&result));
        }
        SprintAction::Summary { id, force_refresh } => {
            let summary = ctx.sync.sprint_summary(id, force_refresh).await?;
            output::output_success(SprintSummaryView {
                sprint_id: id,
                summary,
            });
        }
    }
    Ok(())
}
