//! # Catalog Crate
//!
//! Storage side of the recommendation engine: the movie/user/rating data
//! model, the loader for the `::`-separated catalog files, and the read-only
//! accessor every other crate goes through.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (User, Movie, Rating, Genre, GenreFlags, Page)
//! - **normalize**: Canonical movie ids (`tt0111161` → `s0111161`)
//! - **parser**: Parse .dat files into Rust structs
//! - **index**: `CatalogIndex`, the in-memory store and its secondary indices
//! - **store**: `CatalogStore`, the query interface
//! - **accessor**: `Catalog`, the shared handle that may be offline
//! - **error**: Load errors and read errors
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Catalog, Genre, Page};
//! use std::path::Path;
//!
//! let catalog = Catalog::open(Path::new("data/catalog"))?;
//! let ratings = catalog.ratings_by_user("1")?;
//! let dramas = catalog.movies_by_genre(Genre::Drama, Page::first(10))?;
//! ```

pub mod accessor;
pub mod error;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod store;
pub mod types;

pub use accessor::{Catalog, GenreMatch, Rater, UserRating};
pub use error::{CatalogError, CatalogResult, DataLoadError, Result};
pub use index::CatalogIndex;
pub use normalize::{CanonicalMovieId, normalize};
pub use store::CatalogStore;
pub use types::{
    // Type aliases
    MovieId,
    UserId,
    // Core types
    Movie,
    MovieStats,
    Page,
    Rating,
    User,
    // Enums and flags
    AgeGroup,
    Gender,
    Genre,
    GenreFlags,
};
