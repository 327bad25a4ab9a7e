//! Configuration
//!
//! Every setting is a clap argument with an environment fallback, so the same
//! structs serve the CLI flags and a `.env` file.

pub mod db;
pub mod logging;
pub mod workflow;

pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use workflow::WorkflowConfig;
