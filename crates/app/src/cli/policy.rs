use std::path::PathBuf;

use clap::{Args, Subcommand};
use stockgate::{authority::ApprovalAuthority, roles::Role};
use tabled::{
    builder::Builder,
    settings::{Color, Style, object::Rows},
};

#[derive(Debug, Args)]
pub(crate) struct PolicyCommand {
    #[command(subcommand)]
    command: PolicySubcommand,
}

#[derive(Debug, Subcommand)]
enum PolicySubcommand {
    /// Validate a capability table and print what each role may do
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// YAML capability table; the built-in table is shown when omitted
    file: Option<PathBuf>,
}

pub(crate) fn run(command: PolicyCommand) -> Result<(), String> {
    match command.command {
        PolicySubcommand::Check(args) => check(&args),
    }
}

fn check(args: &CheckArgs) -> Result<(), String> {
    let authority = match &args.file {
        Some(path) => ApprovalAuthority::from_path(path)
            .map_err(|error| format!("invalid policy {}: {error}", path.display()))?,
        None => ApprovalAuthority::default(),
    };

    println!("{}", render_policy(&authority));

    Ok(())
}

fn render_policy(authority: &ApprovalAuthority) -> String {
    let mut builder = Builder::default();

    builder.push_record(["role", "reviews", "auto-approves", "site"]);

    for role in Role::ALL {
        let Some(capabilities) = authority.capabilities(role) else {
            continue;
        };

        let auto_approve: Vec<&str> = capabilities
            .auto_approve
            .iter()
            .map(|kind| kind.as_str())
            .collect();

        builder.push_record([
            role.as_str().to_string(),
            if capabilities.approver { "yes" } else { "no" }.to_string(),
            if capabilities.approver {
                "everything".to_string()
            } else if auto_approve.is_empty() {
                "-".to_string()
            } else {
                auto_approve.join(", ")
            },
            capabilities.site.as_str().to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_lists_the_single_reviewer() {
        let rendered = render_policy(&ApprovalAuthority::default());

        let reviewer_rows: Vec<&str> = rendered
            .lines()
            .filter(|line| line.contains("yes"))
            .collect();

        assert_eq!(reviewer_rows.len(), 1, "rendered:\n{rendered}");
        assert!(
            reviewer_rows.iter().all(|line| line.contains("super_admin")),
            "rendered:\n{rendered}"
        );
    }
}
