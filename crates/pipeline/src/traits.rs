//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable filters to be
//! applied to a section's candidate ids.

use anyhow::Result;
use catalog::CanonicalMovieId;
use sources::UserContext;

/// Core trait for filtering candidate ids.
///
/// Filters take ownership of the list and return what survives, in the
/// original order.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a section's ids.
    ///
    /// # Arguments
    /// * `movie_ids` - The candidate ids, best first (takes ownership)
    /// * `context` - The requesting user's history
    fn apply(
        &self,
        movie_ids: Vec<CanonicalMovieId>,
        context: &UserContext,
    ) -> Result<Vec<CanonicalMovieId>>;
}
