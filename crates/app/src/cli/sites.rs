use clap::{Args, Subcommand};
use stockgate_app::{config::DatabaseConfig, database, domain::sites::PgSiteDirectory};

#[derive(Debug, Args)]
pub(crate) struct SitesCommand {
    #[command(subcommand)]
    command: SitesSubcommand,
}

#[derive(Debug, Subcommand)]
enum SitesSubcommand {
    /// Register a site
    Add(AddSiteArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AddSiteArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Display name
    #[arg(long)]
    name: String,

    /// Free-text site type, e.g. "HQ", "Distribution Center", "Dark Store"
    #[arg(long = "type")]
    site_type: String,
}

pub(crate) async fn run(command: SitesCommand) -> Result<(), String> {
    match command.command {
        SitesSubcommand::Add(args) => add(args).await,
    }
}

async fn add(args: AddSiteArgs) -> Result<(), String> {
    if args.name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }

    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let site = PgSiteDirectory::new(pool)
        .create_site(args.name.trim(), &args.site_type)
        .await
        .map_err(|error| format!("failed to add site: {error}"))?;

    println!("site_uuid: {}", site.id);
    println!("site_name: {}", site.name);
    println!("site_kind: {}", site.kind);

    Ok(())
}
