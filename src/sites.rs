//! Sites

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::{ids::SiteId, repository::StoreError, roles::SiteKind};

/// A location that may hold inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Site id.
    pub id: SiteId,

    /// Display name.
    pub name: String,

    /// Normalised site kind.
    pub kind: SiteKind,
}

/// Read access to the site registry.
///
/// Sites are owned elsewhere; the workflow only reads their kind so it can
/// check role and site compatibility at submission and again at commit.
#[automock]
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Fetch a site by id.
    async fn get_site(&self, id: SiteId) -> Result<Option<Site>, StoreError>;
}
