use crate::cli::BoardAction;
use crate::context::CliContext;
use crate::output;
use backlog_core::BacklogResult;
use backlog_domain::SprintView;

pub async fn handle(ctx: &CliContext, action: BoardAction) -> BacklogResult<()> {
    match action {
        BoardAction::Sprints { board_id, refresh } => {
            let sprints = ctx.sync.sprints_for_board(board_id, refresh).await?;
            output::output_list(sprints.iter().map(SprintView::from).collect());
        }
    }
    Ok(())
}
