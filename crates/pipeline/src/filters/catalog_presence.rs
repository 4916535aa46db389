//! Validator: keep only ids that still exist in the catalog.
//!
//! Candidates can reference movies that have since left the catalog. This
//! filter strips them, logging what it drops. It never fails a request:
//! - offline, every id passes through unchanged
//! - when the existence query fails, every id passes through and a warning
//!   is logged

use crate::traits::Filter;
use anyhow::Result;
use catalog::{CanonicalMovieId, Catalog, CatalogError};
use sources::UserContext;
use tracing::{debug, info, warn};

pub struct CatalogPresenceFilter {
    catalog: Catalog,
}

impl CatalogPresenceFilter {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// `movie_ids ∩ catalog`, order preserved
    pub fn validate(&self, movie_ids: Vec<CanonicalMovieId>) -> Vec<CanonicalMovieId> {
        if movie_ids.is_empty() {
            return movie_ids;
        }
        let present = match self.catalog.existing(&movie_ids) {
            Ok(present) => present,
            Err(CatalogError::StorageUnavailable) => return movie_ids,
            Err(e) => {
                warn!("Validation skipped, existence check failed: {}", e);
                return movie_ids;
            }
        };

        let (kept, dropped): (Vec<_>, Vec<_>) =
            movie_ids.into_iter().partition(|id| present.contains(id));
        if !dropped.is_empty() {
            info!("Validator dropped {} ids missing from the catalog", dropped.len());
            debug!("Dropped ids: {:?}", dropped);
        }
        kept
    }
}

impl Filter for CatalogPresenceFilter {
    fn name(&self) -> &str {
        "CatalogPresenceFilter"
    }

    fn apply(
        &self,
        movie_ids: Vec<CanonicalMovieId>,
        _context: &UserContext,
    ) -> Result<Vec<CanonicalMovieId>> {
        Ok(self.validate(movie_ids))
    }
}
