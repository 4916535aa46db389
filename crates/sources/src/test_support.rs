//! In-memory catalog fixtures shared by the unit tests.

use catalog::{
    AgeGroup, CanonicalMovieId, Catalog, CatalogError, CatalogIndex, CatalogResult, CatalogStore,
    Gender, Genre, GenreFlags, Movie, MovieId, MovieStats, Page, Rating, User, UserId, UserRating,
    normalize,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Default)]
pub struct CatalogBuilder {
    users: BTreeSet<String>,
    movies: Vec<Movie>,
    ratings: Vec<Rating>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movie(mut self, id: &str, genres: &[Genre]) -> Self {
        self.movies.push(Movie {
            id: id.to_string(),
            title: format!("Movie {id} (2000)"),
            year: Some(2000),
            genres: genres.iter().copied().collect(),
        });
        self
    }

    /// Raters are created on first use
    pub fn rate(mut self, user_id: &str, movie_id: &str, value: u8) -> Self {
        self.users.insert(user_id.to_string());
        self.ratings.push(Rating {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            value,
            timestamp: 0,
        });
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.users.insert(user_id.to_string());
        self
    }

    pub fn build_index(self) -> CatalogIndex {
        let users = self
            .users
            .into_iter()
            .map(|id| User {
                id,
                gender: Gender::Female,
                age: AgeGroup::Age25To34,
            })
            .collect();
        CatalogIndex::from_records(users, self.movies, self.ratings).unwrap()
    }

    pub fn build(self) -> Catalog {
        Catalog::connected(Arc::new(self.build_index()))
    }
}

pub fn user_rating(movie_id: &str, value: u8) -> UserRating {
    UserRating {
        movie_id: normalize(movie_id),
        value,
    }
}

pub fn ids(raw: &[&str]) -> Vec<CanonicalMovieId> {
    raw.iter().map(|id| normalize(id)).collect()
}

/// A connected store whose every query fails
pub struct FailingStore;

impl FailingStore {
    fn fail<T>(query: &'static str) -> CatalogResult<T> {
        Err(CatalogError::query_failed(query, "connection reset"))
    }

    pub fn catalog() -> Catalog {
        Catalog::connected(Arc::new(FailingStore))
    }
}

impl CatalogStore for FailingStore {
    fn resolve(&self, _: &CanonicalMovieId) -> CatalogResult<Option<MovieId>> {
        Self::fail("resolve")
    }
    fn user_ratings(&self, _: &str) -> CatalogResult<Vec<Rating>> {
        Self::fail("user_ratings")
    }
    fn movie_ratings(&self, _: &str) -> CatalogResult<Vec<Rating>> {
        Self::fail("movie_ratings")
    }
    fn movie(&self, _: &str) -> CatalogResult<Option<Movie>> {
        Self::fail("movie")
    }
    fn movie_stats(&self, _: &str) -> CatalogResult<MovieStats> {
        Self::fail("movie_stats")
    }
    fn movies_by_genre(&self, _: Genre, _: Page) -> CatalogResult<Vec<MovieId>> {
        Self::fail("movies_by_genre")
    }
    fn movies_with_any_genre(&self, _: GenreFlags) -> CatalogResult<Vec<MovieId>> {
        Self::fail("movies_with_any_genre")
    }
    fn popular_movies(&self, _: f32, _: Page) -> CatalogResult<Vec<MovieId>> {
        Self::fail("popular_movies")
    }
    fn top_rated_movies(&self, _: f32, _: u32, _: Page) -> CatalogResult<Vec<MovieId>> {
        Self::fail("top_rated_movies")
    }
    fn user_ids(&self) -> CatalogResult<Vec<UserId>> {
        Self::fail("user_ids")
    }
    fn movie_ids(&self) -> CatalogResult<Vec<MovieId>> {
        Self::fail("movie_ids")
    }
}
