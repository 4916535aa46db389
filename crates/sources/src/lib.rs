//! # Sources Crate
//!
//! Candidate generation for the recommendation engine.
//!
//! ## Components
//!
//! ### Collaborative scorer
//! "Users who rated what you rated also liked...": neighbors are found by
//! rating agreement on shared movies, candidates ranked by neighbor votes.
//!
//! ### Content scorer
//! Movies sharing genres with the ones the user liked, ranked by how many
//! liked movies they overlap.
//!
//! ### Tiered strategy
//! Runs the collaborative scorer with thresholds that relax every 40
//! positions of pagination depth, falling back when the tiers run dry.
//!
//! ### Fallback chain and offline mode
//! Popular, top rated, preferred genres and a seeded catalog sample; with no
//! storage connection, a deterministic pick from a fixed sample catalog.
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::Catalog;
//! use sources::{ContentScorer, TieredStrategy, user_context::build_user_context};
//!
//! let catalog = Catalog::open(Path::new("data/catalog"))?;
//! let context = build_user_context(&catalog, "1")?;
//!
//! let collaborative = TieredStrategy::new(catalog.clone()).recommend(&context, 0, 10);
//! let content = ContentScorer::new(catalog).get_candidates(&context, Page::first(10))?;
//! ```

pub mod collaborative;
pub mod content;
pub mod fallback;
pub mod offline;
pub mod profile;
pub mod tiered;
pub mod types;
pub mod user_context;

#[cfg(test)]
mod test_support;

pub use collaborative::{CollaborativeRanking, CollaborativeScorer, NeighborParams};
pub use content::ContentScorer;
pub use fallback::{FallbackChain, FallbackStage};
pub use offline::{DeterministicIndex, OfflineCatalog, user_seed};
pub use profile::{DEFAULT_GENRES, preferred_genres};
pub use tiered::{Stage, TieredPage, TieredStrategy};
pub use types::{Candidate, CandidateSource, Section, UnknownSection, UserContext};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CatalogBuilder;
    use catalog::{Genre, Page, normalize};

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(normalize("tt0111161"), CandidateSource::Collaborative, 3);
        assert_eq!(candidate.movie_id.as_str(), "s0111161");
        assert_eq!(candidate.source, CandidateSource::Collaborative);
        assert_eq!(candidate.score, 3);
    }

    #[test]
    fn test_sources_share_one_catalog() {
        let catalog = CatalogBuilder::new()
            .movie("1", &[Genre::Action])
            .movie("2", &[Genre::Action])
            .rate("1", "1", 5)
            .rate("2", "1", 5)
            .rate("2", "2", 5)
            .build();
        let context = user_context::build_user_context(&catalog, "1").unwrap();

        let collaborative = CollaborativeScorer::new(catalog.clone())
            .get_candidates(&context, Page::first(5))
            .unwrap();
        let content = ContentScorer::new(catalog)
            .get_candidates(&context, Page::first(5))
            .unwrap();

        assert_eq!(collaborative[0].movie_id, normalize("2"));
        assert_eq!(content[0].movie_id, normalize("2"));
    }
}
