//! Filter to remove movies the user has already rated.
//!
//! Runs first in the section pipeline: there's no point recommending a movie
//! the user has already seen.

use crate::traits::Filter;
use anyhow::Result;
use catalog::CanonicalMovieId;
use sources::UserContext;

/// Removes ids present in `UserContext::rated`.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        movie_ids: Vec<CanonicalMovieId>,
        context: &UserContext,
    ) -> Result<Vec<CanonicalMovieId>> {
        Ok(movie_ids
            .into_iter()
            .filter(|id| !context.has_rated(id))
            .collect())
    }
}
