//! The storage seam.
//!
//! `CatalogStore` is the query interface the accessor talks to. It speaks raw
//! (stored) ids; normalization happens one layer up in [`crate::Catalog`].

use crate::error::CatalogResult;
use crate::index::{CatalogIndex, id_order};
use crate::normalize::CanonicalMovieId;
use crate::types::*;

/// Read-only queries over the movie, user and rating tables.
///
/// Every query is a single bounded read. Implementations report a failed read
/// as [`crate::CatalogError::QueryFailed`].
pub trait CatalogStore: Send + Sync {
    /// Raw id stored under a canonical id, if any
    fn resolve(&self, id: &CanonicalMovieId) -> CatalogResult<Option<MovieId>>;

    fn user_ratings(&self, user_id: &str) -> CatalogResult<Vec<Rating>>;

    fn movie_ratings(&self, movie_id: &str) -> CatalogResult<Vec<Rating>>;

    fn movie(&self, movie_id: &str) -> CatalogResult<Option<Movie>>;

    fn movie_stats(&self, movie_id: &str) -> CatalogResult<MovieStats>;

    /// Movies flagged with `genre`, most popular first
    fn movies_by_genre(&self, genre: Genre, page: Page) -> CatalogResult<Vec<MovieId>>;

    /// Movies sharing at least one flag with `genres`, most popular first
    fn movies_with_any_genre(&self, genres: GenreFlags) -> CatalogResult<Vec<MovieId>>;

    /// Movies with average ≥ `min_avg`, by rating count desc
    fn popular_movies(&self, min_avg: f32, page: Page) -> CatalogResult<Vec<MovieId>>;

    /// Movies with at least `min_count` ratings and average ≥ `min_avg`, by average desc
    fn top_rated_movies(&self, min_avg: f32, min_count: u32, page: Page)
    -> CatalogResult<Vec<MovieId>>;

    fn user_ids(&self) -> CatalogResult<Vec<UserId>>;

    fn movie_ids(&self) -> CatalogResult<Vec<MovieId>>;
}

impl CatalogStore for CatalogIndex {
    fn resolve(&self, id: &CanonicalMovieId) -> CatalogResult<Option<MovieId>> {
        Ok(CatalogIndex::resolve(self, id).cloned())
    }

    fn user_ratings(&self, user_id: &str) -> CatalogResult<Vec<Rating>> {
        Ok(self.get_user_ratings(user_id).to_vec())
    }

    fn movie_ratings(&self, movie_id: &str) -> CatalogResult<Vec<Rating>> {
        Ok(self.get_movie_ratings(movie_id).to_vec())
    }

    fn movie(&self, movie_id: &str) -> CatalogResult<Option<Movie>> {
        Ok(self.get_movie(movie_id).cloned())
    }

    fn movie_stats(&self, movie_id: &str) -> CatalogResult<MovieStats> {
        Ok(self.get_movie_stats(movie_id).copied().unwrap_or_default())
    }

    fn movies_by_genre(&self, genre: Genre, page: Page) -> CatalogResult<Vec<MovieId>> {
        Ok(page.apply(self.get_movies_by_genre(genre).iter().cloned()))
    }

    fn movies_with_any_genre(&self, genres: GenreFlags) -> CatalogResult<Vec<MovieId>> {
        Ok(self
            .popularity_order
            .iter()
            .filter(|id| {
                self.get_movie(id)
                    .is_some_and(|movie| movie.genres.intersects(genres))
            })
            .cloned()
            .collect())
    }

    fn popular_movies(&self, min_avg: f32, page: Page) -> CatalogResult<Vec<MovieId>> {
        let qualifying = self.popularity_order.iter().filter(|id| {
            self.get_movie_stats(id)
                .is_some_and(|s| s.rating_count > 0 && s.avg_rating >= min_avg)
        });
        Ok(page.apply(qualifying.cloned()))
    }

    fn top_rated_movies(
        &self,
        min_avg: f32,
        min_count: u32,
        page: Page,
    ) -> CatalogResult<Vec<MovieId>> {
        let qualifying = self.rating_order.iter().filter(|id| {
            self.get_movie_stats(id)
                .is_some_and(|s| s.rating_count >= min_count && s.avg_rating >= min_avg)
        });
        Ok(page.apply(qualifying.cloned()))
    }

    fn user_ids(&self) -> CatalogResult<Vec<UserId>> {
        let mut ids: Vec<UserId> = self.users.keys().cloned().collect();
        ids.sort_by(|a, b| id_order(a, b));
        Ok(ids)
    }

    fn movie_ids(&self) -> CatalogResult<Vec<MovieId>> {
        let mut ids: Vec<MovieId> = self.movies.keys().cloned().collect();
        ids.sort_by(|a, b| id_order(a, b));
        Ok(ids)
    }
}
