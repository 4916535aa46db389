//! Shared types for candidate generation.

use catalog::{CanonicalMovieId, Genre, UserId, UserRating};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Everything the scorers need to know about the requesting user, gathered
/// once per request.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,

    /// All of the user's ratings, canonical ids
    pub ratings: Vec<UserRating>,

    /// Every movie the user has rated, for O(1) exclusion
    pub rated: HashSet<CanonicalMovieId>,

    /// Movies rated 4 or higher, in rating order
    pub liked: Vec<CanonicalMovieId>,

    /// Up to three profiled genres, strongest first. May be empty.
    pub preferred_genres: Vec<Genre>,
}

impl UserContext {
    /// A context with no history
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn has_rated(&self, movie_id: &CanonicalMovieId) -> bool {
        self.rated.contains(movie_id)
    }

    /// Preferred genres, or the default triple when nothing was profiled
    pub fn genres_or_default(&self) -> Vec<Genre> {
        crate::profile::genres_or_default(&self.preferred_genres)
    }
}

/// Which scorer produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Voted for by rating neighbors
    Collaborative,
    /// Shares genres with movies the user liked
    ContentBased,
    /// Matches the user's preferred genres (scarce-neighbor supplement)
    GenreOverlap,
}

/// A scored candidate movie. Higher scores rank first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub movie_id: CanonicalMovieId,
    pub score: u32,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn new(movie_id: CanonicalMovieId, source: CandidateSource, score: u32) -> Self {
        Self {
            movie_id,
            score,
            source,
        }
    }
}

/// One section of a recommendation response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Collaborative,
    ContentBased,
    Genre(Genre),
}

impl Section {
    /// Per-section constant mixed into deterministic offline selection
    pub fn seed_offset(self) -> u64 {
        match self {
            Section::Collaborative => 0,
            Section::ContentBased => 1,
            Section::Genre(genre) => 2 + genre.index() as u64,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Collaborative => f.write_str("collaborative"),
            Section::ContentBased => f.write_str("contentBased"),
            Section::Genre(genre) => write!(f, "{genre}"),
        }
    }
}

/// A section selector that names neither a strategy nor a known genre
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section: {0}")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collaborative" => Ok(Section::Collaborative),
            "contentBased" => Ok(Section::ContentBased),
            other => other
                .parse::<Genre>()
                .map(Section::Genre)
                .map_err(|_| UnknownSection(s.to_string())),
        }
    }
}
