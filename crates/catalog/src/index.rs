//! The in-memory catalog store.
//!
//! `CatalogIndex` owns every user, movie and rating and keeps the secondary
//! indices the engine's reads need:
//! - ratings by user and by movie
//! - genre → movies, ordered by popularity
//! - canonical id → raw id resolution
//! - per-movie statistics and the popularity / top-rated orderings

use crate::error::{DataLoadError, Result};
use crate::normalize::{CanonicalMovieId, normalize};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Owns the catalog data and its indices
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) movies: HashMap<MovieId, Movie>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    /// Canonical id → raw id, first raw id (in id order) wins on collision
    pub(crate) canonical: HashMap<CanonicalMovieId, MovieId>,
    /// Movies grouped by genre, each list in popularity order
    pub(crate) genre_index: HashMap<Genre, Vec<MovieId>>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
    /// Every movie: rating count desc, average desc, id asc
    pub(crate) popularity_order: Vec<MovieId>,
    /// Every rated movie: average desc, rating count desc, id asc
    pub(crate) rating_order: Vec<MovieId>,
}

/// Numeric-looking ids sort numerically, everything else lexically
pub(crate) fn id_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog from a directory holding users.dat, movies.dat and
    /// ratings.dat.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let users_path = data_dir.join("users.dat");
        let movies_path = data_dir.join("movies.dat");
        let ratings_path = data_dir.join("ratings.dat");

        // Parse the three files in parallel
        let ((users, movies), ratings) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_movies(&movies_path),
                )
            },
            || parser::parse_ratings(&ratings_path),
        );

        let index = Self::from_records(users?, movies?, ratings?)?;
        let (users, movies, ratings) = index.counts();
        info!("Catalog loaded: {users} users, {movies} movies, {ratings} ratings");
        Ok(index)
    }

    /// Build, index and validate a catalog from parsed records
    pub fn from_records(users: Vec<User>, movies: Vec<Movie>, ratings: Vec<Rating>) -> Result<Self> {
        let mut index = Self::new();
        for user in users {
            index.insert_user(user);
        }
        for movie in movies {
            index.insert_movie(movie);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }
        index.validate()?;
        index.build_indices();
        Ok(index)
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id.clone(), movie);
    }

    /// Append a rating to both rating indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.movie_ratings
            .entry(rating.movie_id.clone())
            .or_default()
            .push(rating.clone());
        self.user_ratings
            .entry(rating.user_id.clone())
            .or_default()
            .push(rating);
    }

    /// Rebuild statistics and every secondary index. Call after inserting.
    pub fn build_indices(&mut self) {
        self.compute_movie_stats();
        self.build_orderings();
        self.build_canonical_index();
        self.build_genre_index();
    }

    /// Average rating and rating count for every movie (zero when unrated)
    fn compute_movie_stats(&mut self) {
        self.movie_stats = self
            .movies
            .par_iter()
            .map(|(movie_id, _)| {
                let ratings = self
                    .movie_ratings
                    .get(movie_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    ratings.iter().map(Rating::score).sum::<f32>() / rating_count as f32
                } else {
                    0.0
                };
                (
                    movie_id.clone(),
                    MovieStats {
                        avg_rating,
                        rating_count,
                    },
                )
            })
            .collect();
    }

    fn build_orderings(&mut self) {
        let stats = &self.movie_stats;
        let stat = |id: &MovieId| stats.get(id).copied().unwrap_or_default();

        let mut popularity: Vec<MovieId> = self.movies.keys().cloned().collect();
        popularity.sort_by(|a, b| {
            let (sa, sb) = (stat(a), stat(b));
            sb.rating_count
                .cmp(&sa.rating_count)
                .then_with(|| sb.avg_rating.total_cmp(&sa.avg_rating))
                .then_with(|| id_order(a, b))
        });

        let mut rated: Vec<MovieId> = popularity
            .iter()
            .filter(|id| stat(*id).rating_count > 0)
            .cloned()
            .collect();
        rated.sort_by(|a, b| {
            let (sa, sb) = (stat(a), stat(b));
            sb.avg_rating
                .total_cmp(&sa.avg_rating)
                .then_with(|| sb.rating_count.cmp(&sa.rating_count))
                .then_with(|| id_order(a, b))
        });

        self.popularity_order = popularity;
        self.rating_order = rated;
    }

    fn build_canonical_index(&mut self) {
        let mut raw_ids: Vec<&MovieId> = self.movies.keys().collect();
        raw_ids.sort_by(|a, b| id_order(a, b));

        self.canonical.clear();
        for raw in raw_ids {
            let canonical = normalize(raw);
            if let Some(existing) = self.canonical.get(&canonical) {
                warn!(
                    "Movie ids {} and {} both normalize to {}, keeping {}",
                    existing, raw, canonical, existing
                );
                continue;
            }
            self.canonical.insert(canonical, raw.clone());
        }
    }

    /// Genre lists follow `popularity_order`, so build that first
    fn build_genre_index(&mut self) {
        self.genre_index.clear();
        for movie_id in &self.popularity_order {
            if let Some(movie) = self.movies.get(movie_id) {
                for genre in movie.genres.iter() {
                    self.genre_index
                        .entry(genre)
                        .or_default()
                        .push(movie_id.clone());
                }
            }
        }
    }

    /// Every rating must reference a known user and movie and lie in 1..=5
    pub fn validate(&self) -> Result<()> {
        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !self.users.contains_key(&rating.user_id) {
                    return Err(DataLoadError::MissingReference {
                        entity: "User".to_string(),
                        id: rating.user_id.clone(),
                    });
                }
                if !self.movies.contains_key(&rating.movie_id) {
                    return Err(DataLoadError::MissingReference {
                        entity: "Movie".to_string(),
                        id: rating.movie_id.clone(),
                    });
                }
                if !(1..=5).contains(&rating.value) {
                    return Err(DataLoadError::InvalidValue {
                        field: "rating".to_string(),
                        value: rating.value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // Getters

    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn get_movie(&self, id: &str) -> Option<&Movie> {
        self.movies.get(id)
    }

    /// Empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: &str) -> &[Rating] {
        self.user_ratings
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_movie_ratings(&self, movie_id: &str) -> &[Rating] {
        self.movie_ratings
            .get(movie_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Movies flagged with `genre`, most popular first
    pub fn get_movies_by_genre(&self, genre: Genre) -> &[MovieId] {
        self.genre_index
            .get(&genre)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_movie_stats(&self, movie_id: &str) -> Option<&MovieStats> {
        self.movie_stats.get(movie_id)
    }

    /// Raw id stored under a canonical id
    pub fn resolve(&self, id: &CanonicalMovieId) -> Option<&MovieId> {
        self.canonical.get(id)
    }

    /// (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(Vec::len).sum();
        (self.users.len(), self.movies.len(), total_ratings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            gender: Gender::Female,
            age: AgeGroup::Age25To34,
        }
    }

    fn movie(id: &str, genres: &[Genre]) -> Movie {
        Movie {
            id: id.to_string(),
            title: format!("Movie {id} (2000)"),
            year: Some(2000),
            genres: genres.iter().copied().collect(),
        }
    }

    fn rating(user_id: &str, movie_id: &str, value: u8) -> Rating {
        Rating {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            value,
            timestamp: 978300760,
        }
    }

    fn build() -> CatalogIndex {
        CatalogIndex::from_records(
            vec![user("1"), user("2"), user("3")],
            vec![
                movie("1", &[Genre::Action]),
                movie("2", &[Genre::Action, Genre::Drama]),
                movie("tt0000003", &[Genre::Drama]),
                movie("4", &[]),
            ],
            vec![
                rating("1", "1", 5),
                rating("2", "1", 4),
                rating("3", "1", 3),
                rating("1", "2", 5),
                rating("2", "2", 5),
                rating("3", "tt0000003", 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_movie_stats() {
        let index = build();
        let stats = index.get_movie_stats("1").unwrap();
        assert_eq!(stats.rating_count, 3);
        assert!((stats.avg_rating - 4.0).abs() < 1e-6);

        // Unrated movies still get (empty) stats
        let unrated = index.get_movie_stats("4").unwrap();
        assert_eq!(unrated.rating_count, 0);
    }

    #[test]
    fn test_orderings() {
        let index = build();
        assert_eq!(index.popularity_order, vec!["1", "2", "tt0000003", "4"]);
        // Average first: movie 2 (5.0) before movie 1 (4.0); unrated excluded
        assert_eq!(index.rating_order, vec!["2", "1", "tt0000003"]);
    }

    #[test]
    fn test_genre_index_follows_popularity() {
        let index = build();
        assert_eq!(index.get_movies_by_genre(Genre::Action), ["1", "2"]);
        assert_eq!(index.get_movies_by_genre(Genre::Drama), ["2", "tt0000003"]);
        assert!(index.get_movies_by_genre(Genre::Western).is_empty());
    }

    #[test]
    fn test_canonical_resolution() {
        let index = build();
        assert_eq!(index.resolve(&normalize("tt0000003")).unwrap(), "tt0000003");
        assert_eq!(index.resolve(&normalize("1")).unwrap(), "1");
        assert!(index.resolve(&normalize("99")).is_none());
    }

    #[test]
    fn test_validate_rejects_dangling_rating() {
        let result = CatalogIndex::from_records(
            vec![user("1")],
            vec![movie("1", &[])],
            vec![rating("1", "404", 4)],
        );
        assert!(matches!(
            result,
            Err(DataLoadError::MissingReference { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_rating() {
        let result = CatalogIndex::from_records(
            vec![user("1")],
            vec![movie("1", &[])],
            vec![rating("1", "1", 9)],
        );
        assert!(matches!(result, Err(DataLoadError::InvalidValue { .. })));
    }

    #[test]
    fn test_id_order_is_numeric_aware() {
        let mut ids = vec!["10", "9", "100", "1"];
        ids.sort_by(|a, b| id_order(a, b));
        assert_eq!(ids, vec!["1", "9", "10", "100"]);
    }
}
