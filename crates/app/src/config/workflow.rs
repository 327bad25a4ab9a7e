//! Workflow Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use stockgate::{
    authority::{ApprovalAuthority, PolicyError},
    workflow::{DEFAULT_UPSTREAM_TIMEOUT, WorkflowSettings},
};

/// Approval policy and engine tuning.
#[derive(Debug, Clone, Args)]
pub struct WorkflowConfig {
    /// YAML role capability table; the built-in table is used when omitted
    #[arg(long, env = "STOCKGATE_POLICY_FILE")]
    pub policy_file: Option<PathBuf>,

    /// Upper bound on any single database or putaway call, in milliseconds
    #[arg(
        long,
        env = "STOCKGATE_UPSTREAM_TIMEOUT_MS",
        default_value_t = default_timeout_ms(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub upstream_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_UPSTREAM_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl WorkflowConfig {
    /// Load the capability table named by `policy_file`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] when the file cannot be read or parsed.
    pub fn authority(&self) -> Result<ApprovalAuthority, PolicyError> {
        match &self.policy_file {
            Some(path) => ApprovalAuthority::from_path(path),
            None => Ok(ApprovalAuthority::default()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            upstream_timeout: Duration::from_millis(self.upstream_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        workflow: WorkflowConfig,
    }

    #[test]
    fn timeout_defaults_to_the_engine_default() {
        let harness = Harness::parse_from(["stockgate-app"]);

        assert_eq!(harness.workflow.settings(), WorkflowSettings::default());
        assert!(harness.workflow.policy_file.is_none());
    }

    #[test]
    fn zero_timeout_is_refused() {
        let result = Harness::try_parse_from(["stockgate-app", "--upstream-timeout-ms", "0"]);

        assert!(result.is_err(), "a zero timeout should not parse");
    }

    #[test]
    fn missing_policy_file_is_an_io_error() {
        let harness = Harness::parse_from([
            "stockgate-app",
            "--policy-file",
            "/nonexistent/stockgate-policy.yaml",
        ]);

        let result = harness.workflow.authority();

        assert!(
            matches!(result, Err(PolicyError::Io(_))),
            "expected Io, got {result:?}"
        );
    }
}
