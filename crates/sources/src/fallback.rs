//! Fallback chain.
//!
//! Guarantees the orchestrator always has something to return. Stages run in
//! a fixed order, each filling up to `limit` ids while skipping ids already
//! collected or already rated:
//! 1. Popular: most-rated movies averaging at least 3.5
//! 2. Top rated: best-averaging movies with at least 3 ratings
//! 3. Preferred genres (or the default triple)
//! 4. A seeded shuffle of the whole catalog
//!
//! A failing stage is logged and skipped. Without a storage connection the
//! chain answers from the deterministic offline catalog instead.

use crate::offline::{OfflineCatalog, user_seed};
use crate::types::{Section, UserContext};
use catalog::{CanonicalMovieId, Catalog, CatalogError, CatalogResult, Page};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument, warn};

pub const POPULAR_MIN_AVG: f32 = 3.5;
pub const TOP_RATED_MIN_AVG: f32 = 4.0;
pub const TOP_RATED_MIN_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    Popular,
    TopRated,
    PreferredGenres,
    CatalogSample,
}

impl FallbackStage {
    pub const ORDER: [FallbackStage; 4] = [
        FallbackStage::Popular,
        FallbackStage::TopRated,
        FallbackStage::PreferredGenres,
        FallbackStage::CatalogSample,
    ];
}

impl fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FallbackStage::Popular => "popular",
            FallbackStage::TopRated => "top_rated",
            FallbackStage::PreferredGenres => "preferred_genres",
            FallbackStage::CatalogSample => "catalog_sample",
        };
        f.write_str(name)
    }
}

/// Ids collected so far, unique and never rated by the user
struct Collector<'a> {
    context: &'a UserContext,
    limit: usize,
    seen: HashSet<CanonicalMovieId>,
    ids: Vec<CanonicalMovieId>,
}

impl<'a> Collector<'a> {
    fn new(context: &'a UserContext, limit: usize) -> Self {
        Self {
            context,
            limit,
            seen: HashSet::new(),
            ids: Vec::with_capacity(limit),
        }
    }

    fn is_full(&self) -> bool {
        self.ids.len() >= self.limit
    }

    /// Returns how many ids were accepted
    fn extend(&mut self, candidates: Vec<CanonicalMovieId>) -> usize {
        let before = self.ids.len();
        for id in candidates {
            if self.is_full() {
                break;
            }
            if self.context.has_rated(&id) || !self.seen.insert(id.clone()) {
                continue;
            }
            self.ids.push(id);
        }
        self.ids.len() - before
    }
}

#[derive(Debug, Clone)]
pub struct FallbackChain {
    catalog: Catalog,
    offline: OfflineCatalog,
}

impl FallbackChain {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            offline: OfflineCatalog::sample(),
        }
    }

    /// Up to `page.limit` ids for `section`
    #[instrument(skip(self, context), fields(user_id = %context.user_id, section = %section))]
    pub fn recommend(&self, context: &UserContext, section: Section, page: Page) -> Vec<CanonicalMovieId> {
        if page.limit == 0 {
            return Vec::new();
        }
        if !self.catalog.is_available() {
            debug!("Storage unavailable, answering from the offline catalog");
            return self.offline.page(&context.user_id, section, page);
        }

        let mut collector = Collector::new(context, page.limit);
        for stage in FallbackStage::ORDER {
            if collector.is_full() {
                break;
            }
            match self.run_stage(stage, context, page) {
                Ok(ids) => {
                    let accepted = collector.extend(ids);
                    debug!("Fallback stage {} contributed {} ids", stage, accepted);
                }
                Err(CatalogError::StorageUnavailable) => {
                    debug!("Fallback stage {} skipped: storage unavailable", stage);
                }
                Err(e) => warn!("Fallback stage {} failed: {}", stage, e),
            }
        }
        collector.ids
    }

    fn run_stage(
        &self,
        stage: FallbackStage,
        context: &UserContext,
        page: Page,
    ) -> CatalogResult<Vec<CanonicalMovieId>> {
        // Fetch extra so rated ids can be skipped without coming up short
        let fetch = page.with_limit(page.limit.saturating_add(context.rated.len()));
        match stage {
            FallbackStage::Popular => self.catalog.popular_movies(POPULAR_MIN_AVG, fetch),
            FallbackStage::TopRated => {
                self.catalog
                    .top_rated_movies(TOP_RATED_MIN_AVG, TOP_RATED_MIN_COUNT, fetch)
            }
            FallbackStage::PreferredGenres => {
                let mut ids = Vec::new();
                for genre in context.genres_or_default() {
                    ids.extend(self.catalog.movies_by_genre(genre, fetch)?);
                }
                Ok(ids)
            }
            FallbackStage::CatalogSample => {
                let mut ids = self.catalog.movie_ids()?;
                let mut rng = StdRng::seed_from_u64(user_seed(&context.user_id) ^ page.offset as u64);
                ids.shuffle(&mut rng);
                ids.truncate(fetch.limit);
                Ok(ids)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::OfflineCatalog;
    use crate::test_support::{CatalogBuilder, FailingStore, ids};
    use crate::user_context::build_user_context;
    use catalog::Genre;

    fn create_test_catalog() -> Catalog {
        CatalogBuilder::new()
            .movie("1", &[Genre::Drama])
            .movie("2", &[Genre::Drama])
            .movie("3", &[Genre::Comedy])
            .movie("4", &[Genre::Western])
            .movie("5", &[Genre::Western])
            // 1: popular (3 ratings, avg 4.0); 2: top rated but rated by the user
            .rate("a", "1", 4)
            .rate("b", "1", 4)
            .rate("c", "1", 4)
            .rate("a", "2", 5)
            .rate("b", "2", 5)
            .rate("u", "2", 5)
            // 3: mediocre
            .rate("a", "3", 2)
            .build()
    }

    #[test]
    fn test_stages_fill_in_order() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "u").unwrap();
        let chain = FallbackChain::new(catalog);

        let result = chain.recommend(&context, Section::Collaborative, Page::first(3));
        assert_eq!(result.len(), 3);
        // popular gives 1 (2 is rated), top rated and Drama add nothing new,
        // the catalog sample fills the rest
        assert_eq!(result[0], ids(&["1"])[0]);
        assert!(result.iter().all(|id| !context.has_rated(id)));
        let unique: HashSet<_> = result.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_catalog_sample_completes_the_page() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "u").unwrap();
        let chain = FallbackChain::new(catalog);

        let result = chain.recommend(&context, Section::ContentBased, Page::first(10));
        // every unrated movie, once
        let mut sorted = result.clone();
        sorted.sort();
        assert_eq!(sorted, ids(&["1", "3", "4", "5"]));
    }

    #[test]
    fn test_sample_is_reproducible() {
        let catalog = create_test_catalog();
        let context = UserContext::new("x");
        let chain = FallbackChain::new(catalog);
        let page = Page::first(5);
        assert_eq!(
            chain.recommend(&context, Section::Collaborative, page),
            chain.recommend(&context, Section::Collaborative, page)
        );
    }

    #[test]
    fn test_offline_uses_sample_catalog() {
        let chain = FallbackChain::new(Catalog::offline());
        let context = UserContext::new("500");
        let result = chain.recommend(&context, Section::Collaborative, Page::first(10));

        let offline = OfflineCatalog::sample();
        assert_eq!(result.len(), 10);
        assert!(result.iter().all(|id| offline.contains(id)));
    }

    #[test]
    fn test_failing_stages_are_skipped() {
        let chain = FallbackChain::new(FailingStore::catalog());
        let result = chain.recommend(&UserContext::new("u"), Section::Collaborative, Page::first(5));
        assert!(result.is_empty());
    }

    #[test]
    fn test_zero_limit() {
        let chain = FallbackChain::new(Catalog::offline());
        assert!(chain
            .recommend(&UserContext::new("1"), Section::Collaborative, Page::first(0))
            .is_empty());
    }
}
