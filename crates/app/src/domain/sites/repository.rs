//! Sites Repository

use async_trait::async_trait;
use sqlx::{PgPool, Row, query};
use stockgate::{
    ids::SiteId,
    repository::StoreError,
    roles::SiteKind,
    sites::{Site, SiteDirectory},
};
use thiserror::Error;

use crate::database::store_error;

const GET_SITE_SQL: &str = include_str!("sql/get_site.sql");
const CREATE_SITE_SQL: &str = include_str!("sql/create_site.sql");

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("unrecognised site type {0:?}")]
    UnknownType(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Site registry read from the `sites` table. The free-text `site_type`
/// column is classified into a [`SiteKind`] on every read.
#[derive(Debug, Clone)]
pub struct PgSiteDirectory {
    pool: PgPool,
}

impl PgSiteDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a site.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::UnknownType`] when `site_type` names no known site
    /// kind, or a storage error when the insert fails.
    pub async fn create_site(&self, name: &str, site_type: &str) -> Result<Site, SiteError> {
        let kind = SiteKind::classify(site_type)
            .ok_or_else(|| SiteError::UnknownType(site_type.to_string()))?;

        let site = Site {
            id: SiteId::new(),
            name: name.to_string(),
            kind,
        };

        query(CREATE_SITE_SQL)
            .bind(site.id.into_uuid())
            .bind(name)
            .bind(site_type)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(site)
    }
}

#[async_trait]
impl SiteDirectory for PgSiteDirectory {
    async fn get_site(&self, id: SiteId) -> Result<Option<Site>, StoreError> {
        let Some(row) = query(GET_SITE_SQL)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let name: String = row.try_get("name").map_err(store_error)?;
        let site_type: String = row.try_get("site_type").map_err(store_error)?;

        // Rows written outside `create_site` may carry labels we cannot place.
        let kind = SiteKind::classify(&site_type).ok_or_else(|| {
            StoreError::Unavailable(format!("site {id} has unrecognised type {site_type:?}"))
        })?;

        Ok(Some(Site { id, name, kind }))
    }
}
