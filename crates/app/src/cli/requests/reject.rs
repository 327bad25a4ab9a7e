use clap::Args;
use stockgate::ids::RequestId;
use stockgate_app::{
    config::{DatabaseConfig, WorkflowConfig},
    context::AppContext,
};
use uuid::Uuid;

use super::ReviewerArgs;

#[derive(Debug, Args)]
pub(crate) struct RejectRequestArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    workflow: WorkflowConfig,

    #[command(flatten)]
    reviewer: ReviewerArgs,

    /// Why the request is turned down
    #[arg(long)]
    reason: String,

    /// Request to reject
    request: Uuid,
}

pub(crate) async fn run(args: RejectRequestArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database, &args.workflow)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let outcome = context
        .engine
        .reject(
            &args.reviewer.actor(),
            RequestId::from_uuid(args.request),
            &args.reason,
        )
        .await
        .map_err(|error| format!("failed to reject request: {error}"))?;

    let request = outcome.request();

    println!("request_uuid: {}", request.id);
    println!("status: {}", request.status);
    println!("reason: {}", request.rejection_reason().unwrap_or_default());

    Ok(())
}
