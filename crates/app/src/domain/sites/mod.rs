//! Sites

mod repository;

pub use repository::{PgSiteDirectory, SiteError};
