use clap::{Parser, Subcommand};
use stockgate::roles::Role;
use stockgate_app::{config::LoggingConfig, observability};

mod db;
mod policy;
mod requests;
mod sites;

#[derive(Debug, Parser)]
#[command(name = "stockgate-app", about = "Stockgate approval workflow CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Policy(policy::PolicyCommand),
    Requests(requests::RequestsCommand),
    Sites(sites::SitesCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Policy(command) => policy::run(command),
            Commands::Requests(command) => requests::run(command).await,
            Commands::Sites(command) => sites::run(command).await,
        }
    }
}

pub(crate) fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).ok_or_else(|| {
        let known: Vec<&str> = Role::ALL.iter().map(|role| role.as_str()).collect();

        format!("unknown role {value:?}; expected one of {}", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_by_stored_name() {
        assert_eq!(parse_role("super_admin"), Ok(Role::SuperAdmin));
        assert!(parse_role("root").is_err_and(|error| error.contains("super_admin")));
    }

    #[test]
    fn reject_requires_a_reason() {
        let result = Cli::try_parse_from([
            "stockgate-app",
            "requests",
            "reject",
            "--database-url",
            "postgres://localhost/stockgate",
            "--reviewer-id",
            "0191f7a0-0000-7000-8000-000000000000",
            "--reviewer-name",
            "Selam",
            "--reviewer-role",
            "super_admin",
            "0191f7a0-0000-7000-8000-000000000001",
        ]);

        assert!(result.is_err(), "reject without --reason should not parse");
    }
}
