use clap::Args;
use stockgate::{
    ids::SiteId,
    requests::{ChangePayload, ChangeRequest, RequestStatus},
};
use stockgate_app::{
    config::{DatabaseConfig, WorkflowConfig},
    context::AppContext,
};
use tabled::{
    builder::Builder,
    settings::{Color, Style, object::Rows},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ListRequestsArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    workflow: WorkflowConfig,

    /// Only requests for this site
    #[arg(long)]
    site: Option<Uuid>,

    /// Review state to list (pending, approved, rejected)
    #[arg(long, default_value = "pending", value_parser = parse_status)]
    status: RequestStatus,
}

fn parse_status(value: &str) -> Result<RequestStatus, String> {
    RequestStatus::parse(value)
        .ok_or_else(|| format!("unknown status {value:?}; expected pending, approved or rejected"))
}

pub(crate) async fn run(args: ListRequestsArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database, &args.workflow)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let requests = context
        .engine
        .requests_with_status(args.status, args.site.map(SiteId::from_uuid))
        .await
        .map_err(|error| format!("failed to list requests: {error}"))?;

    if requests.is_empty() {
        println!("no {} requests", args.status);
        return Ok(());
    }

    println!("{}", render_requests(&requests));

    Ok(())
}

fn summary(request: &ChangeRequest) -> String {
    let proposal = match &request.payload {
        ChangePayload::Create { proposed } => format!("{} units", proposed.stock),
        ChangePayload::Edit { proposed } => {
            let mut fields = Vec::new();

            if proposed.sku.is_some() {
                fields.push("sku");
            }
            if proposed.name.is_some() {
                fields.push("name");
            }
            if proposed.category.is_some() {
                fields.push("category");
            }
            if proposed.price.is_some() || proposed.cost_price.is_some() {
                fields.push("price");
            }
            if proposed.site_id.is_some() {
                fields.push("site");
            }

            if fields.is_empty() {
                "details".to_string()
            } else {
                fields.join(", ")
            }
        }
        ChangePayload::Delete => String::new(),
        ChangePayload::StockAdjustment {
            direction,
            quantity,
            reason,
        } => format!("{direction} {quantity}: {reason}"),
    };

    match request.rejection_reason() {
        Some(reason) => format!("{proposal} (rejected: {reason})"),
        None => proposal,
    }
}

fn render_requests(requests: &[ChangeRequest]) -> String {
    let mut builder = Builder::default();

    builder.push_record([
        "request", "type", "sku", "product", "requested by", "requested at", "change",
    ]);

    for request in requests {
        builder.push_record([
            request.id.to_string(),
            request.kind().to_string(),
            request.product_sku.clone(),
            request.product_name.clone(),
            format!("{} ({})", request.requested_by.name, request.requested_by.role),
            request.requested_at.strftime("%Y-%m-%d %H:%M").to_string(),
            summary(request),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);

    table.to_string()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use stockgate::{
        ids::{ActorId, ProductId, RequestId},
        requests::StockDirection,
        roles::{Actor, Role},
    };

    use super::*;

    fn adjustment() -> ChangeRequest {
        ChangeRequest {
            id: RequestId::new(),
            product_id: Some(ProductId::new()),
            product_name: "Coffee 250g".to_string(),
            product_sku: "COF-250".to_string(),
            site_id: SiteId::new(),
            payload: ChangePayload::StockAdjustment {
                direction: StockDirection::Out,
                quantity: 3,
                reason: "damaged".to_string(),
            },
            requested_by: Actor::new(ActorId::new(), "Hana", Role::Pos),
            requested_at: Timestamp::UNIX_EPOCH,
            acknowledged_violation: None,
            status: RequestStatus::Pending,
            decision: None,
        }
    }

    #[test]
    fn stock_adjustments_show_direction_quantity_and_reason() {
        assert_eq!(summary(&adjustment()), "OUT 3: damaged");
    }

    #[test]
    fn table_has_a_row_per_request() {
        let request = adjustment();
        let rendered = render_requests(&[request.clone()]);

        assert!(rendered.contains(&request.id.to_string()), "rendered:\n{rendered}");
        assert!(rendered.contains("Hana (pos)"), "rendered:\n{rendered}");
        assert!(rendered.contains("1970-01-01 00:00"), "rendered:\n{rendered}");
    }

    #[test]
    fn status_names_parse() {
        assert_eq!(parse_status("rejected"), Ok(RequestStatus::Rejected));
        assert!(parse_status("done").is_err());
    }
}
