//! Tiered collaborative strategy.
//!
//! Strict collaborative matches run out quickly as pagination goes deeper,
//! so every [`TIER_SIZE`] positions the neighbor thresholds relax one notch.
//!
//! The collaborative sequence is the concatenation of five windows:
//! - `W0`: the strict ranking padded with the tier-1 ranking, cut to 40
//! - `Wk` for k in 1..4: the tier-k ranking minus every earlier window, cut to 40
//! - `W4`: the tier-4 ranking minus every earlier window, unbounded
//!
//! Position `p` lives in window `min(4, p / 40)` at `p - tier * 40`. Windows
//! are disjoint, so a deeper page never repeats a shallower one. An empty
//! page, or a failed query, hands over to the [`FallbackChain`].

use crate::collaborative::{CollaborativeScorer, NeighborParams};
use crate::fallback::FallbackChain;
use crate::types::{Candidate, CandidateSource, Section, UserContext};
use catalog::{CanonicalMovieId, Catalog, CatalogError, CatalogResult, GenreFlags, Page};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Positions per tier
pub const TIER_SIZE: usize = 40;

/// Deepest tier; everything past it stays in the last window
pub const MAX_TIER: u8 = 4;

/// Below this many relaxed neighbors, genre overlap supplements the votes
pub const SCARCE_NEIGHBORS: usize = 10;

/// Tier a pagination offset falls into
pub fn tier_for_offset(offset: usize) -> u8 {
    (offset / TIER_SIZE).min(usize::from(MAX_TIER)) as u8
}

/// Where a page was answered from. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Strict,
    Extended(u8),
    Fallback,
}

impl Stage {
    pub fn for_tier(tier: u8) -> Self {
        match tier {
            0 => Stage::Strict,
            t => Stage::Extended(t.min(MAX_TIER)),
        }
    }
}

/// A page of collaborative ids and the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredPage {
    pub stage: Stage,
    pub movie_ids: Vec<CanonicalMovieId>,
}

#[derive(Debug, Clone)]
pub struct TieredStrategy {
    catalog: Catalog,
    fallback: FallbackChain,
}

impl TieredStrategy {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            fallback: FallbackChain::new(catalog.clone()),
            catalog,
        }
    }

    /// Collaborative ids at positions `offset .. offset + limit`.
    ///
    /// Never fails: anything the tiers cannot answer comes from the fallback chain.
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub fn recommend(&self, context: &UserContext, offset: usize, limit: usize) -> TieredPage {
        if limit == 0 {
            return TieredPage {
                stage: Stage::for_tier(tier_for_offset(offset)),
                movie_ids: Vec::new(),
            };
        }

        match self.read_windows(context, offset, limit) {
            Ok((stage, movie_ids)) if !movie_ids.is_empty() => {
                debug!("{:?} answered {} ids at offset {}", stage, movie_ids.len(), offset);
                return TieredPage { stage, movie_ids };
            }
            Ok((stage, _)) => debug!("{:?} exhausted at offset {}", stage, offset),
            Err(CatalogError::StorageUnavailable) => debug!("Storage unavailable"),
            Err(e) => warn!("Collaborative query failed: {}", e),
        }

        TieredPage {
            stage: Stage::Fallback,
            movie_ids: self
                .fallback
                .recommend(context, Section::Collaborative, Page::new(offset, limit)),
        }
    }

    /// Map each requested position to its window, computing windows lazily.
    ///
    /// The stage is the earliest one any returned id came from: a tier-0 page
    /// past the strict prefix of `W0` holds only tier-1 ids.
    fn read_windows(
        &self,
        context: &UserContext,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<(Stage, Vec<CanonicalMovieId>)> {
        let end = offset.saturating_add(limit);
        let last_tier = tier_for_offset(end - 1);
        let mut windows = WindowBuilder::new(self, context);
        let mut ids = Vec::with_capacity(limit.min(2 * TIER_SIZE));

        for tier in tier_for_offset(offset)..=last_tier {
            let window = windows.window(tier)?;
            let base = usize::from(tier) * TIER_SIZE;
            let from = offset.max(base) - base;
            let to = if tier == MAX_TIER {
                end - base
            } else {
                end.min(base + TIER_SIZE) - base
            };
            if from < window.len() {
                ids.extend_from_slice(&window[from..to.min(window.len())]);
            }
        }

        let tier = tier_for_offset(offset);
        let stage = if tier == 0 && offset >= windows.strict_len {
            Stage::Extended(1)
        } else {
            Stage::for_tier(tier)
        };
        Ok((stage, ids))
    }

    /// Window `tier` on its own
    pub fn window(&self, context: &UserContext, tier: u8) -> CatalogResult<Vec<CanonicalMovieId>> {
        WindowBuilder::new(self, context).window(tier.min(MAX_TIER)).map(<[_]>::to_vec)
    }

    /// Ranking for an extended tier: relaxed neighbor votes, then genre
    /// overlap when neighbors are scarce
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub fn extended_ranking(
        &self,
        context: &UserContext,
        tier: u8,
    ) -> CatalogResult<Vec<Candidate>> {
        let params = NeighborParams::for_tier(tier);
        let ranking = CollaborativeScorer::new(self.catalog.clone())
            .with_params(params)
            .rank(context)?;

        let neighbor_count = ranking.neighbor_count;
        let mut candidates = ranking.candidates;
        if neighbor_count < SCARCE_NEIGHBORS {
            debug!(
                "Only {} neighbors at tier {}, adding genre overlap",
                neighbor_count, tier
            );
            let exclude: HashSet<CanonicalMovieId> =
                candidates.iter().map(|c| c.movie_id.clone()).collect();
            candidates.extend(self.genre_overlap(context, params, &exclude)?);
        }
        Ok(candidates)
    }

    /// Unrated movies sharing the user's preferred genres, averaging at least
    /// `min_neighbor_rating`, scored by genre overlap. Most overlapping
    /// first, then most popular.
    fn genre_overlap(
        &self,
        context: &UserContext,
        params: NeighborParams,
        exclude: &HashSet<CanonicalMovieId>,
    ) -> CatalogResult<Vec<Candidate>> {
        let preferred: GenreFlags = context.genres_or_default().into_iter().collect();
        let mut matches: Vec<_> = self
            .catalog
            .movies_with_any_genre(preferred)?
            .into_iter()
            .filter(|row| row.stats.rating_count > 0)
            .filter(|row| row.stats.avg_rating >= params.min_neighbor_rating)
            .filter(|row| !context.has_rated(&row.movie_id) && !exclude.contains(&row.movie_id))
            .collect();
        // stable: equal overlap keeps popularity order
        matches.sort_by(|a, b| b.genres.overlap(preferred).cmp(&a.genres.overlap(preferred)));
        Ok(matches
            .into_iter()
            .map(|row| {
                let overlap = row.genres.overlap(preferred);
                Candidate::new(row.movie_id, CandidateSource::GenreOverlap, overlap)
            })
            .collect())
    }
}

fn ranked_ids(candidates: Vec<Candidate>) -> Vec<CanonicalMovieId> {
    candidates.into_iter().map(|c| c.movie_id).collect()
}

/// Builds windows in tier order, caching rankings and the ids already placed
struct WindowBuilder<'a> {
    strategy: &'a TieredStrategy,
    context: &'a UserContext,
    windows: Vec<Vec<CanonicalMovieId>>,
    placed: HashSet<CanonicalMovieId>,
    tier1: Option<Vec<CanonicalMovieId>>,
    /// Leading `W0` positions held by strict matches
    strict_len: usize,
}

impl<'a> WindowBuilder<'a> {
    fn new(strategy: &'a TieredStrategy, context: &'a UserContext) -> Self {
        Self {
            strategy,
            context,
            windows: Vec::new(),
            placed: HashSet::new(),
            tier1: None,
            strict_len: 0,
        }
    }

    fn window(&mut self, tier: u8) -> CatalogResult<&[CanonicalMovieId]> {
        while self.windows.len() <= usize::from(tier) {
            let next = self.windows.len() as u8;
            let window = self.build(next)?;
            self.placed.extend(window.iter().cloned());
            self.windows.push(window);
        }
        Ok(&self.windows[usize::from(tier)])
    }

    fn ranking(&mut self, tier: u8) -> CatalogResult<Vec<CanonicalMovieId>> {
        if tier == 1 {
            if let Some(cached) = &self.tier1 {
                return Ok(cached.clone());
            }
            let ranking = ranked_ids(self.strategy.extended_ranking(self.context, 1)?);
            self.tier1 = Some(ranking.clone());
            return Ok(ranking);
        }
        Ok(ranked_ids(self.strategy.extended_ranking(self.context, tier)?))
    }

    fn build(&mut self, tier: u8) -> CatalogResult<Vec<CanonicalMovieId>> {
        let capacity = if tier == MAX_TIER { usize::MAX } else { TIER_SIZE };
        let sources = if tier == 0 {
            let strict = CollaborativeScorer::new(self.strategy.catalog.clone()).rank(self.context)?;
            let mut ids: Vec<CanonicalMovieId> = strict.movie_ids().cloned().collect();
            self.strict_len = ids.len().min(TIER_SIZE);
            ids.extend(self.ranking(1)?);
            ids
        } else {
            self.ranking(tier)?
        };

        let mut seen = HashSet::new();
        Ok(sources
            .into_iter()
            .filter(|id| !self.placed.contains(id) && seen.insert(id.clone()))
            .take(capacity)
            .collect())
    }
}
