//! Content-based scorer.
//!
//! Ranks movies by how many of the user's liked movies (rated 4+) they share
//! a genre with. Ties keep catalog popularity order.

use crate::types::{Candidate, CandidateSource, UserContext};
use catalog::{Catalog, CatalogResult, GenreFlags, Page};
use tracing::{debug, instrument};

/// Scores candidates by genre co-occurrence with liked movies
#[derive(Debug, Clone)]
pub struct ContentScorer {
    catalog: Catalog,
}

impl ContentScorer {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// The full ranking for a user
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub fn rank(&self, context: &UserContext) -> CatalogResult<Vec<Candidate>> {
        if context.liked.is_empty() {
            debug!("No liked movies, nothing to score");
            return Ok(Vec::new());
        }

        let liked_genres: Vec<GenreFlags> = self
            .catalog
            .movie_genres(&context.liked)?
            .into_values()
            .filter(|flags| !flags.is_empty())
            .collect();
        let any_liked = liked_genres
            .iter()
            .fold(GenreFlags::empty(), |acc, flags| acc.union(*flags));

        // Join output is already in popularity order
        let mut candidates: Vec<Candidate> = self
            .catalog
            .movies_with_any_genre(any_liked)?
            .into_iter()
            .filter(|row| !context.has_rated(&row.movie_id))
            .map(|row| {
                let shared = liked_genres
                    .iter()
                    .filter(|flags| flags.intersects(row.genres))
                    .count() as u32;
                Candidate::new(row.movie_id, CandidateSource::ContentBased, shared)
            })
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        debug!("Ranked {} content candidates", candidates.len());
        Ok(candidates)
    }

    /// One page of the ranking
    pub fn get_candidates(&self, context: &UserContext, page: Page) -> CatalogResult<Vec<Candidate>> {
        Ok(page.apply(self.rank(context)?))
    }
}
