use clap::Args;
use stockgate::{ids::RequestId, workflow::ReviewOutcome};
use stockgate_app::{
    config::{DatabaseConfig, WorkflowConfig},
    context::AppContext,
};
use uuid::Uuid;

use super::ReviewerArgs;

#[derive(Debug, Args)]
pub(crate) struct ApproveRequestArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    workflow: WorkflowConfig,

    #[command(flatten)]
    reviewer: ReviewerArgs,

    /// Request to approve
    request: Uuid,
}

pub(crate) async fn run(args: ApproveRequestArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database, &args.workflow)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let outcome = context
        .engine
        .approve(&args.reviewer.actor(), RequestId::from_uuid(args.request))
        .await
        .map_err(|error| {
            if error.is_retryable() {
                format!("failed to approve request (retry later): {error}")
            } else {
                format!("failed to approve request: {error}")
            }
        })?;

    let (request, product, warnings) = match outcome {
        ReviewOutcome::Applied {
            request,
            product,
            warnings,
        } => (request, product, warnings),
        ReviewOutcome::Rejected(request) => {
            return Err(format!("request {} was not applied", request.id));
        }
    };

    println!("request_uuid: {}", request.id);
    println!("change_type: {}", request.kind());
    println!("status: {}", request.status);

    if let Some(product) = product {
        println!("product_uuid: {}", product.id);
        println!("product_sku: {}", product.sku);
        println!("stock: {}", product.stock);
    }

    for warning in warnings {
        eprintln!("warning: {warning}");
    }

    Ok(())
}
