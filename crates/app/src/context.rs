//! App Context

use std::sync::Arc;

use sqlx::PgPool;
use stockgate::{
    audit::AuditLog,
    authority::{ApprovalAuthority, PolicyError},
    notify::{Notifier, TracingNotifier},
    workflow::{Collaborators, WorkflowEngine, WorkflowSettings},
};
use thiserror::Error;

use crate::{
    config::{DatabaseConfig, WorkflowConfig},
    database,
    domain::{
        audit::PgAuditLog, movements::PgStockMovements, products::PgProductRepository,
        putaway::PgPutawayTrigger, requests::PgChangeRequestRepository, sites::PgSiteDirectory,
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to load approval policy")]
    Policy(#[source] PolicyError),
}

/// A workflow engine wired to `PostgreSQL`, plus the concrete stores behind it.
#[derive(Clone)]
pub struct AppContext {
    pub engine: WorkflowEngine,
    pub products: Arc<PgProductRepository>,
    pub requests: Arc<PgChangeRequestRepository>,
    pub movements: Arc<PgStockMovements>,
    pub putaway: Arc<PgPutawayTrigger>,
    pub sites: Arc<PgSiteDirectory>,
    pub pool: PgPool,
}

impl AppContext {
    /// Build the context over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, authority: ApprovalAuthority, settings: WorkflowSettings) -> Self {
        Self::with_notifier(pool, authority, settings, Arc::new(TracingNotifier))
    }

    /// Build the context with a custom notification sink.
    #[must_use]
    pub fn with_notifier(
        pool: PgPool,
        authority: ApprovalAuthority,
        settings: WorkflowSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let products = Arc::new(PgProductRepository::new(pool.clone()));
        let requests = Arc::new(PgChangeRequestRepository::new(pool.clone()));
        let movements = Arc::new(PgStockMovements::new(pool.clone()));
        let putaway = Arc::new(PgPutawayTrigger::new(pool.clone()));
        let sites = Arc::new(PgSiteDirectory::new(pool.clone()));
        let audit: Arc<dyn AuditLog> = Arc::new(PgAuditLog::new(pool.clone()));

        let collaborators = Collaborators {
            products: products.clone(),
            requests: requests.clone(),
            movements: movements.clone(),
            sites: sites.clone(),
            putaway: putaway.clone(),
            notifier,
            audit,
        };

        Self {
            engine: WorkflowEngine::new(collaborators, authority).with_settings(settings),
            products,
            requests,
            movements,
            putaway,
            sites,
            pool,
        }
    }

    /// Connect and build the context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the policy file cannot be loaded or the database
    /// connection cannot be established.
    pub async fn from_config(
        database: &DatabaseConfig,
        workflow: &WorkflowConfig,
    ) -> Result<Self, AppInitError> {
        let authority = workflow.authority().map_err(AppInitError::Policy)?;

        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(pool, authority, workflow.settings()))
    }
}
