//! Collaborative scorer.
//!
//! "Users who rated what you rated, the way you rated it, also liked..."
//!
//! ## Algorithm
//! 1. For each movie the user rated, look at everyone else who rated it
//! 2. A rater is a neighbor when their rating is within
//!    `max_rating_difference` of the user's and at least `min_neighbor_rating`
//! 3. Every movie a neighbor rated gets one vote from that neighbor
//! 4. Drop movies the user already rated, rank by votes, then by id

use crate::types::{Candidate, CandidateSource, UserContext};
use catalog::{CanonicalMovieId, Catalog, CatalogResult, Page, UserId};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

/// Thresholds deciding who counts as a neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborParams {
    /// Largest allowed gap between the user's and the neighbor's rating
    pub max_rating_difference: f32,
    /// A rater whose rating falls below this is not a neighbor
    pub min_neighbor_rating: f32,
}

impl NeighborParams {
    pub const STRICT: NeighborParams = NeighborParams {
        max_rating_difference: 1.0,
        min_neighbor_rating: 4.0,
    };

    /// Relaxed thresholds for `tier`. Tier 0 is [`NeighborParams::STRICT`].
    pub fn for_tier(tier: u8) -> Self {
        let t = f32::from(tier);
        Self {
            max_rating_difference: 1.0 + 0.5 * t,
            min_neighbor_rating: (4.0 - 0.5 * t).max(2.5),
        }
    }
}

impl Default for NeighborParams {
    fn default() -> Self {
        Self::STRICT
    }
}

/// Ranked candidates plus the size of the neighborhood they came from
#[derive(Debug, Clone, Default)]
pub struct CollaborativeRanking {
    pub candidates: Vec<Candidate>,
    pub neighbor_count: usize,
}

impl CollaborativeRanking {
    pub fn movie_ids(&self) -> impl Iterator<Item = &CanonicalMovieId> {
        self.candidates.iter().map(|c| &c.movie_id)
    }
}

/// Scores candidates by neighbor votes
#[derive(Debug, Clone)]
pub struct CollaborativeScorer {
    catalog: Catalog,
    params: NeighborParams,
}

impl CollaborativeScorer {
    /// A scorer with strict thresholds
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            params: NeighborParams::STRICT,
        }
    }

    pub fn with_params(mut self, params: NeighborParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> NeighborParams {
        self.params
    }

    /// The full ranking for a user
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub fn rank(&self, context: &UserContext) -> CatalogResult<CollaborativeRanking> {
        debug!(
            "Scoring collaborative candidates for user {} (rated: {})",
            context.user_id,
            context.ratings.len()
        );

        let neighbors = self.find_neighbors(context)?;
        debug!("Found {} neighbors", neighbors.len());

        let votes = self.count_votes(&neighbors, context)?;
        let mut candidates: Vec<Candidate> = votes
            .into_iter()
            .map(|(movie_id, votes)| Candidate::new(movie_id, CandidateSource::Collaborative, votes))
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.movie_id.cmp(&b.movie_id)));

        debug!("Ranked {} collaborative candidates", candidates.len());
        Ok(CollaborativeRanking {
            candidates,
            neighbor_count: neighbors.len(),
        })
    }

    /// One page of the ranking
    pub fn get_candidates(&self, context: &UserContext, page: Page) -> CatalogResult<Vec<Candidate>> {
        Ok(page.apply(self.rank(context)?.candidates))
    }

    /// Users whose ratings agree with the requesting user's on a shared movie
    fn find_neighbors(&self, context: &UserContext) -> CatalogResult<BTreeSet<UserId>> {
        let mut neighbors = BTreeSet::new();
        for rating in &context.ratings {
            let own = f32::from(rating.value);
            for rater in self.catalog.raters_of(&rating.movie_id)? {
                if rater.user_id == context.user_id {
                    continue;
                }
                let theirs = f32::from(rater.value);
                if (theirs - own).abs() <= self.params.max_rating_difference
                    && theirs >= self.params.min_neighbor_rating
                {
                    neighbors.insert(rater.user_id);
                }
            }
        }
        Ok(neighbors)
    }

    /// One vote per neighbor for each movie they rated that the user hasn't rated
    fn count_votes(
        &self,
        neighbors: &BTreeSet<UserId>,
        context: &UserContext,
    ) -> CatalogResult<HashMap<CanonicalMovieId, u32>> {
        let mut votes: HashMap<CanonicalMovieId, u32> = HashMap::new();
        for neighbor in neighbors {
            let voted: HashSet<CanonicalMovieId> = self
                .catalog
                .ratings_by_user(neighbor)?
                .into_iter()
                .filter(|r| !context.has_rated(&r.movie_id))
                .map(|r| r.movie_id)
                .collect();
            for movie_id in voted {
                *votes.entry(movie_id).or_insert(0) += 1;
            }
        }
        Ok(votes)
    }
}
