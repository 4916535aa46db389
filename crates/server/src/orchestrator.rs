//! # Recommendation Orchestrator
//!
//! The public entry point of the engine. For a user, a page and a page size
//! it assembles three sections:
//! 1. Collaborative, through the tiered strategy
//! 2. Content-based, through the content scorer (fallback chain when empty)
//! 3. Up to three genre sections for the user's preferred genres
//!
//! Every section goes through the section pipeline (already rated, repeats,
//! validator) and is cut to the page size. With no storage connection every
//! section comes from the deterministic offline catalog.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use catalog::{CanonicalMovieId, Catalog, CatalogError, CatalogResult, Genre, Page, normalize};
use pipeline::FilterPipeline;
use sources::user_context::{average_rating, build_user_context};
use sources::{ContentScorer, FallbackChain, OfflineCatalog, Section, TieredStrategy, UserContext};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::response::{GenreSections, MAX_GENRE_SECTIONS, RecommendationSet};

/// A rating submitted after the fact. Logged, never applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    pub user_id: String,
    pub movie_id: String,
    pub value: u8,
}

/// Summary of a user's history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub rated_count: usize,
    pub liked_count: usize,
    pub avg_rating: f32,
    pub preferred_genres: Vec<Genre>,
}

/// Coordinates the strategies behind each response section
pub struct RecommendationOrchestrator {
    catalog: Catalog,
    config: EngineConfig,
    tiered: TieredStrategy,
    content: ContentScorer,
    fallback: FallbackChain,
    offline: OfflineCatalog,
    pipeline: FilterPipeline,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator with default configuration
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, EngineConfig::default())
    }

    pub fn with_config(catalog: Catalog, config: EngineConfig) -> Self {
        Self {
            tiered: TieredStrategy::new(catalog.clone()),
            content: ContentScorer::new(catalog.clone()),
            fallback: FallbackChain::new(catalog.clone()),
            offline: OfflineCatalog::sample(),
            pipeline: FilterPipeline::for_sections(catalog.clone()),
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        !self.catalog.is_available()
    }

    /// Close the storage connection. Later requests are answered offline.
    pub fn shutdown(&mut self) {
        self.catalog.close();
        *self = Self::with_config(self.catalog.clone(), self.config.clone());
    }

    /// Recommendations for one page. Never fails.
    #[instrument(skip(self))]
    pub fn generate(&self, user_id: &str, page: usize, limit: usize) -> RecommendationSet {
        match self.try_generate(user_id, page, limit) {
            Ok(set) => set,
            Err(e) => {
                warn!("Falling back for user {}: {}", user_id, e);
                self.generate_with_context(&UserContext::new(user_id), Page::for_page(page, limit))
            }
        }
    }

    /// Like [`generate`](Self::generate), but surfaces a failure to read the
    /// user's history instead of degrading
    pub fn try_generate(
        &self,
        user_id: &str,
        page: usize,
        limit: usize,
    ) -> CatalogResult<RecommendationSet> {
        let start_time = Instant::now();
        if limit == 0 {
            return Ok(RecommendationSet::default());
        }
        let window = Page::for_page(page, limit);
        if self.is_offline() {
            debug!("Storage unavailable, serving user {} offline", user_id);
            return Ok(self.generate_offline(user_id, window));
        }

        let context = build_user_context(&self.catalog, user_id)?;
        let set = self.generate_with_context(&context, window);

        info!(
            "Generated recommendations for user {} (page {}, collaborative {}, content {}, genres {}) in {:.2?}",
            user_id,
            page,
            set.collaborative.len(),
            set.content_based.len(),
            set.genres.len(),
            start_time.elapsed()
        );
        Ok(set)
    }

    /// One section, over-fetched before filtering to make up for dropped ids
    #[instrument(skip(self))]
    pub fn generate_more(
        &self,
        user_id: &str,
        section: &str,
        page: usize,
        limit: usize,
    ) -> EngineResult<Vec<CanonicalMovieId>> {
        let section: Section = section.parse()?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let window = Page::for_page(page, limit);
        if self.is_offline() {
            return Ok(self.offline.page(user_id, section, window));
        }

        let context = self.context_or_empty(user_id);
        let fetch = window.with_limit(limit.saturating_mul(self.config.overfetch_factor.max(1)));
        let ids = match section {
            Section::Collaborative => {
                self.tiered.recommend(&context, fetch.offset, fetch.limit).movie_ids
            }
            Section::ContentBased => self.content_section(&context, fetch),
            Section::Genre(genre) => self.genre_section(genre, fetch),
        };
        Ok(self.finish(ids, &context, limit))
    }

    /// Recommendations for every known user, keyed by user id.
    ///
    /// Offline, the sample users `500..600` are covered. A failing user is
    /// logged and left out; the batch carries on.
    pub fn generate_all(&self) -> BTreeMap<String, RecommendationSet> {
        let start_time = Instant::now();
        let users = if self.is_offline() {
            OfflineCatalog::sample_users()
        } else {
            match self.catalog.user_ids() {
                Ok(users) => users,
                Err(e) => {
                    warn!("Could not list users, nothing to generate: {}", e);
                    return BTreeMap::new();
                }
            }
        };

        let limit = self.config.default_limit;
        let all: BTreeMap<String, RecommendationSet> = users
            .par_iter()
            .filter_map(|user_id| match self.try_generate(user_id, 0, limit) {
                Ok(set) => Some((user_id.clone(), set)),
                Err(e) => {
                    warn!("Skipping user {}: {}", user_id, e);
                    None
                }
            })
            .collect();

        info!(
            "Generated recommendations for {} of {} users in {:.2?}",
            all.len(),
            users.len(),
            start_time.elapsed()
        );
        all
    }

    /// Write [`generate_all`](Self::generate_all) to `path` as JSON, creating
    /// parent directories. Returns the number of users written.
    pub fn write_recommendations_file(&self, path: &Path) -> EngineResult<usize> {
        let all = self.generate_all();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &all)?;
        writer.flush()?;

        info!("Wrote recommendations for {} users to {:?}", all.len(), path);
        Ok(all.len())
    }

    /// Accept a new rating. It is validated and logged; applying it is left
    /// to the next catalog refresh.
    pub fn record_rating(&self, update: &RatingUpdate) -> EngineResult<()> {
        if !(1..=5).contains(&update.value) {
            return Err(EngineError::InvalidRating {
                movie_id: update.movie_id.clone(),
                value: update.value,
            });
        }
        info!(
            "Rating update deferred to next refresh: user {} rated {} with {}",
            update.user_id,
            normalize(&update.movie_id),
            update.value
        );
        Ok(())
    }

    /// History summary for `user_id`
    pub fn user_profile(&self, user_id: &str) -> EngineResult<UserProfile> {
        let context = build_user_context(&self.catalog, user_id)?;
        Ok(UserProfile {
            user_id: context.user_id.clone(),
            rated_count: context.rated.len(),
            liked_count: context.liked.len(),
            avg_rating: average_rating(&context),
            preferred_genres: context.preferred_genres.clone(),
        })
    }

    fn generate_with_context(&self, context: &UserContext, page: Page) -> RecommendationSet {
        let limit = page.limit;
        if limit == 0 {
            return RecommendationSet::default();
        }
        if self.is_offline() {
            return self.generate_offline(&context.user_id, page);
        }

        let tiered = self.tiered.recommend(context, page.offset, limit);
        debug!("Collaborative section from {:?}", tiered.stage);
        let collaborative = self.finish(tiered.movie_ids, context, limit);
        let content_based = self.finish(self.content_section(context, page), context, limit);

        let mut genres = GenreSections::new();
        for genre in context.genres_or_default() {
            if genres.is_full() {
                break;
            }
            let ids = self.finish(self.genre_section(genre, page), context, limit);
            if !genres.insert(genre, ids) {
                debug!("Genre section {} omitted", genre);
            }
        }

        RecommendationSet {
            collaborative,
            content_based,
            genres,
        }
    }

    fn generate_offline(&self, user_id: &str, page: Page) -> RecommendationSet {
        let mut genres = GenreSections::new();
        for genre in self.offline.genres_for(user_id).into_iter().take(MAX_GENRE_SECTIONS) {
            genres.insert(genre, self.offline.page(user_id, Section::Genre(genre), page));
        }
        RecommendationSet {
            collaborative: self.offline.page(user_id, Section::Collaborative, page),
            content_based: self.offline.page(user_id, Section::ContentBased, page),
            genres,
        }
    }

    fn content_section(&self, context: &UserContext, page: Page) -> Vec<CanonicalMovieId> {
        match self.content.get_candidates(context, page) {
            Ok(candidates) if !candidates.is_empty() => {
                return candidates.into_iter().map(|c| c.movie_id).collect();
            }
            Ok(_) => debug!("No content candidates for user {}", context.user_id),
            Err(e) => log_catalog_error("content scoring", &e),
        }
        self.fallback.recommend(context, Section::ContentBased, page)
    }

    fn genre_section(&self, genre: Genre, page: Page) -> Vec<CanonicalMovieId> {
        self.catalog.movies_by_genre(genre, page).unwrap_or_else(|e| {
            log_catalog_error("genre section", &e);
            Vec::new()
        })
    }

    fn context_or_empty(&self, user_id: &str) -> UserContext {
        build_user_context(&self.catalog, user_id).unwrap_or_else(|e| {
            log_catalog_error("user context", &e);
            UserContext::new(user_id)
        })
    }

    /// Run the section pipeline and cut to `limit`. A failing pipeline is
    /// logged and the unfiltered list used.
    fn finish(
        &self,
        ids: Vec<CanonicalMovieId>,
        context: &UserContext,
        limit: usize,
    ) -> Vec<CanonicalMovieId> {
        let mut kept = match self.pipeline.apply(ids.clone(), context) {
            Ok(kept) => kept,
            Err(e) => {
                warn!("Section pipeline failed, returning unfiltered ids: {:#}", e);
                ids
            }
        };
        kept.truncate(limit);
        kept
    }
}

fn log_catalog_error(what: &str, error: &CatalogError) {
    if error.is_unavailable() {
        debug!("{} skipped: {}", what, error);
    } else {
        warn!("{} failed: {}", what, error);
    }
}
