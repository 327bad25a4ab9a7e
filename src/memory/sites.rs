//! In-memory site registry.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::{
    ids::SiteId,
    repository::StoreError,
    roles::SiteKind,
    sites::{Site, SiteDirectory},
};

#[derive(Debug, Default)]
pub struct InMemorySiteDirectory {
    sites: Mutex<FxHashMap<SiteId, Site>>,
}

impl InMemorySiteDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site and return its id.
    pub fn add(&self, name: impl Into<String>, kind: SiteKind) -> SiteId {
        let site = Site {
            id: SiteId::new(),
            name: name.into(),
            kind,
        };
        let id = site.id;

        self.sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, site);

        id
    }

    /// Change the kind of a registered site. Returns whether the site exists.
    pub fn reclassify(&self, id: SiteId, kind: SiteKind) -> bool {
        self.sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&id)
            .map(|site| site.kind = kind)
            .is_some()
    }
}

#[async_trait]
impl SiteDirectory for InMemorySiteDirectory {
    async fn get_site(&self, id: SiteId) -> Result<Option<Site>, StoreError> {
        Ok(self
            .sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}
