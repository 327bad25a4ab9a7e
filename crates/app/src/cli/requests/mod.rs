use clap::{Args, Subcommand};
use stockgate::{
    ids::ActorId,
    roles::{Actor, Role},
};
use uuid::Uuid;

mod approve;
mod list;
mod reject;

#[derive(Debug, Args)]
pub(crate) struct RequestsCommand {
    #[command(subcommand)]
    command: RequestsSubcommand,
}

#[derive(Debug, Subcommand)]
enum RequestsSubcommand {
    /// Show change requests, oldest first
    List(list::ListRequestsArgs),
    /// Approve a pending request and apply its change
    Approve(approve::ApproveRequestArgs),
    /// Reject a pending request
    Reject(reject::RejectRequestArgs),
}

/// Who is making the review decision.
#[derive(Debug, Args)]
pub(crate) struct ReviewerArgs {
    /// Reviewer user id
    #[arg(long, env = "STOCKGATE_REVIEWER_ID")]
    reviewer_id: Uuid,

    /// Reviewer display name
    #[arg(long, env = "STOCKGATE_REVIEWER_NAME")]
    reviewer_name: String,

    /// Reviewer role, e.g. super_admin
    #[arg(long, env = "STOCKGATE_REVIEWER_ROLE", value_parser = super::parse_role)]
    reviewer_role: Role,
}

impl ReviewerArgs {
    fn actor(&self) -> Actor {
        Actor::new(
            ActorId::from_uuid(self.reviewer_id),
            self.reviewer_name.clone(),
            self.reviewer_role,
        )
    }
}

pub(crate) async fn run(command: RequestsCommand) -> Result<(), String> {
    match command.command {
        RequestsSubcommand::List(args) => list::run(args).await,
        RequestsSubcommand::Approve(args) => approve::run(args).await,
        RequestsSubcommand::Reject(args) => reject::run(args).await,
    }
}
