//! Core domain types for the movie catalog.
//!
//! Identifiers are kept as the store holds them (`MovieId` is the raw,
//! un-normalized id); see [`crate::normalize`] for the canonical form that
//! leaves the accessor.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque user identifier, as stored
pub type UserId = String;

/// Raw movie identifier, as stored (may be `s123`, `tt0111161`, `42`, ...)
pub type MovieId = String;

// =============================================================================
// User-related Types
// =============================================================================

/// A catalog user. Demographics are loaded but the engine only uses `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub gender: Gender,
    pub age: AgeGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Age buckets used by the users file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Under18,
    Age18To24,
    Age25To34,
    Age35To44,
    Age45To49,
    Age50To55,
    Age56Plus,
}

// =============================================================================
// Genres
// =============================================================================

/// The closed set of genres a movie can be flagged with.
///
/// Every genre-parameterized query goes through this enum, so a genre name
/// that is not listed here can never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// All genres in declaration order
    pub const ALL: [Genre; 18] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Children,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Fantasy,
        Genre::FilmNoir,
        Genre::Horror,
        Genre::Musical,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Alphanumeric name used in responses and section selectors
    pub fn name(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "FilmNoir",
            Genre::Horror => "Horror",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "SciFi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }

    /// Position in [`Genre::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keep only ASCII alphanumerics of a genre name
pub fn sanitize_genre_name(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

impl FromStr for Genre {
    type Err = CatalogError;

    /// Sanitizes the input, then matches it case-insensitively against the
    /// closed set. `"Sci-Fi"`, `"scifi"` and `"Children's"` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = sanitize_genre_name(s);
        Genre::ALL
            .into_iter()
            .find(|genre| genre.name().eq_ignore_ascii_case(&cleaned))
            .or_else(|| match cleaned.to_ascii_lowercase().as_str() {
                "childrens" => Some(Genre::Children),
                _ => None,
            })
            .ok_or_else(|| CatalogError::UnknownGenre(s.to_string()))
    }
}

/// Sparse multi-label genre encoding: one bit per [`Genre`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenreFlags(u32);

impl GenreFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, genre: Genre) {
        self.0 |= genre.bit();
    }

    pub fn contains(self, genre: Genre) -> bool {
        self.0 & genre.bit() != 0
    }

    /// True when at least one genre is flagged in both sets
    pub fn intersects(self, other: GenreFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of genres flagged in both sets
    pub fn overlap(self, other: GenreFlags) -> u32 {
        (self.0 & other.0).count_ones()
    }

    pub fn union(self, other: GenreFlags) -> GenreFlags {
        GenreFlags(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Flagged genres in declaration order
    pub fn iter(self) -> impl Iterator<Item = Genre> {
        Genre::ALL.into_iter().filter(move |genre| self.contains(*genre))
    }
}

impl FromIterator<Genre> for GenreFlags {
    fn from_iter<I: IntoIterator<Item = Genre>>(iter: I) -> Self {
        let mut flags = GenreFlags::empty();
        for genre in iter {
            flags.insert(genre);
        }
        flags
    }
}

// =============================================================================
// Movie and Rating Types
// =============================================================================

/// A catalog movie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from the title, e.g. "Toy Story (1995)"
    pub year: Option<u16>,
    pub genres: GenreFlags,
}

/// A single rating. Ratings are append-only; nothing here updates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Integer rating, 1 to 5
    pub value: u8,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

impl Rating {
    pub fn score(&self) -> f32 {
        f32::from(self.value)
    }
}

/// Precomputed statistics for a movie
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// Pagination
// =============================================================================

/// Offset/limit window applied to an ordered result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Page number + page size, `offset = page * limit`
    pub fn for_page(page: usize, limit: usize) -> Self {
        Self::new(page.saturating_mul(limit), limit)
    }

    /// First `limit` items
    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// Same offset, different size
    pub fn with_limit(self, limit: usize) -> Self {
        Self::new(self.offset, limit)
    }

    /// Skip `offset` items and keep at most `limit`
    pub fn apply<T, I: IntoIterator<Item = T>>(self, items: I) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}
