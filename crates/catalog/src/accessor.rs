//! The catalog accessor.
//!
//! [`Catalog`] is the only handle the engine holds on storage. It is either
//! connected to a [`CatalogStore`] or offline; every read on an offline
//! handle fails with [`CatalogError::StorageUnavailable`]. Every movie id a
//! read returns has gone through [`normalize`].

use crate::error::{CatalogError, CatalogResult, DataLoadError};
use crate::index::CatalogIndex;
use crate::normalize::{CanonicalMovieId, normalize};
use crate::store::CatalogStore;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One of a user's ratings, keyed by canonical movie id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRating {
    pub movie_id: CanonicalMovieId,
    pub value: u8,
}

/// A user who rated some movie, with the value they gave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rater {
    pub user_id: UserId,
    pub value: u8,
}

/// A row of the similarity join: a movie with its flags and statistics
#[derive(Debug, Clone, PartialEq)]
pub struct GenreMatch {
    pub movie_id: CanonicalMovieId,
    pub genres: GenreFlags,
    pub stats: MovieStats,
}

/// Shared, read-only storage handle. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Catalog {
    store: Option<Arc<dyn CatalogStore>>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("available", &self.is_available())
            .finish()
    }
}

impl Catalog {
    pub fn connected(store: Arc<dyn CatalogStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A handle with no storage behind it
    pub fn offline() -> Self {
        Self { store: None }
    }

    /// Load the catalog files in `data_dir` into memory and connect to them
    pub fn open(data_dir: &Path) -> Result<Self, DataLoadError> {
        let index = CatalogIndex::load_from_files(data_dir)?;
        Ok(Self::connected(Arc::new(index)))
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Drop this handle's connection. Later reads fail with `StorageUnavailable`.
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            info!("Catalog connection closed");
        }
    }

    fn store(&self) -> CatalogResult<&dyn CatalogStore> {
        self.store.as_deref().ok_or(CatalogError::StorageUnavailable)
    }

    /// Raw id for a canonical id; `None` when the catalog has no such movie
    fn raw_id(&self, id: &CanonicalMovieId) -> CatalogResult<Option<MovieId>> {
        self.store()?.resolve(id)
    }

    /// All ratings made by `user_id`
    pub fn ratings_by_user(&self, user_id: &str) -> CatalogResult<Vec<UserRating>> {
        let ratings = self.store()?.user_ratings(user_id)?;
        Ok(ratings
            .into_iter()
            .map(|rating| UserRating {
                movie_id: normalize(&rating.movie_id),
                value: rating.value,
            })
            .collect())
    }

    /// Everyone who rated `movie_id`
    pub fn raters_of(&self, movie_id: &CanonicalMovieId) -> CatalogResult<Vec<Rater>> {
        let Some(raw) = self.raw_id(movie_id)? else {
            return Ok(Vec::new());
        };
        let ratings = self.store()?.movie_ratings(&raw)?;
        Ok(ratings
            .into_iter()
            .map(|rating| Rater {
                user_id: rating.user_id,
                value: rating.value,
            })
            .collect())
    }

    pub fn movie(&self, movie_id: &CanonicalMovieId) -> CatalogResult<Option<Movie>> {
        match self.raw_id(movie_id)? {
            Some(raw) => self.store()?.movie(&raw),
            None => Ok(None),
        }
    }

    /// Genre flags for each known id in `ids`; unknown ids are left out
    pub fn movie_genres(
        &self,
        ids: &[CanonicalMovieId],
    ) -> CatalogResult<HashMap<CanonicalMovieId, GenreFlags>> {
        let mut genres = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(movie) = self.movie(id)? {
                genres.insert(id.clone(), movie.genres);
            }
        }
        Ok(genres)
    }

    /// A page of the movies flagged with `genre`, most popular first
    pub fn movies_by_genre(&self, genre: Genre, page: Page) -> CatalogResult<Vec<CanonicalMovieId>> {
        let ids = self.store()?.movies_by_genre(genre, page)?;
        Ok(normalize_all(ids))
    }

    /// Like [`Catalog::movies_by_genre`], for a genre name from outside.
    ///
    /// Names outside the closed genre set are rejected before any read.
    pub fn movies_by_genre_name(
        &self,
        name: &str,
        page: Page,
    ) -> CatalogResult<Vec<CanonicalMovieId>> {
        let genre: Genre = name.parse()?;
        self.movies_by_genre(genre, page)
    }

    /// Every movie sharing a genre with `genres`, most popular first
    pub fn movies_with_any_genre(&self, genres: GenreFlags) -> CatalogResult<Vec<GenreMatch>> {
        if genres.is_empty() {
            return Ok(Vec::new());
        }
        let store = self.store()?;
        let mut matches = Vec::new();
        for raw in store.movies_with_any_genre(genres)? {
            let Some(movie) = store.movie(&raw)? else {
                continue;
            };
            matches.push(GenreMatch {
                movie_id: normalize(&raw),
                genres: movie.genres,
                stats: store.movie_stats(&raw)?,
            });
        }
        Ok(matches)
    }

    /// Movies averaging at least `min_avg`, most rated first
    pub fn popular_movies(&self, min_avg: f32, page: Page) -> CatalogResult<Vec<CanonicalMovieId>> {
        let ids = self.store()?.popular_movies(min_avg, page)?;
        Ok(normalize_all(ids))
    }

    /// Movies with at least `min_count` ratings averaging at least `min_avg`,
    /// best average first
    pub fn top_rated_movies(
        &self,
        min_avg: f32,
        min_count: u32,
        page: Page,
    ) -> CatalogResult<Vec<CanonicalMovieId>> {
        let ids = self.store()?.top_rated_movies(min_avg, min_count, page)?;
        Ok(normalize_all(ids))
    }

    pub fn user_ids(&self) -> CatalogResult<Vec<UserId>> {
        self.store()?.user_ids()
    }

    pub fn movie_ids(&self) -> CatalogResult<Vec<CanonicalMovieId>> {
        let ids = self.store()?.movie_ids()?;
        Ok(normalize_all(ids))
    }

    /// The subset of `ids` present in the catalog
    pub fn existing(&self, ids: &[CanonicalMovieId]) -> CatalogResult<HashSet<CanonicalMovieId>> {
        let mut present = HashSet::with_capacity(ids.len());
        for id in ids {
            if self.raw_id(id)?.is_some() {
                present.insert(id.clone());
            }
        }
        Ok(present)
    }
}

fn normalize_all(ids: Vec<MovieId>) -> Vec<CanonicalMovieId> {
    ids.iter().map(|id| normalize(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Catalog {
        let users = ["1", "2"]
            .into_iter()
            .map(|id| User {
                id: id.to_string(),
                gender: Gender::Female,
                age: AgeGroup::Age35To44,
            })
            .collect();
        let movies = vec![
            Movie {
                id: "tt0111161".to_string(),
                title: "The Shawshank Redemption (1994)".to_string(),
                year: Some(1994),
                genres: [Genre::Drama].into_iter().collect(),
            },
            Movie {
                id: "42".to_string(),
                title: "Alien (1979)".to_string(),
                year: Some(1979),
                genres: [Genre::Horror, Genre::SciFi].into_iter().collect(),
            },
        ];
        let ratings = vec![
            Rating {
                user_id: "1".to_string(),
                movie_id: "tt0111161".to_string(),
                value: 5,
                timestamp: 0,
            },
            Rating {
                user_id: "2".to_string(),
                movie_id: "42".to_string(),
                value: 4,
                timestamp: 0,
            },
        ];
        let index = CatalogIndex::from_records(users, movies, ratings).unwrap();
        Catalog::connected(Arc::new(index))
    }

    #[test]
    fn test_offline_reads_are_unavailable() {
        let catalog = Catalog::offline();
        assert!(!catalog.is_available());
        assert_eq!(
            catalog.ratings_by_user("1").unwrap_err(),
            CatalogError::StorageUnavailable
        );
        assert!(catalog.movie_ids().unwrap_err().is_unavailable());
    }

    #[test]
    fn test_close_disconnects() {
        let mut catalog = fixture();
        assert!(catalog.is_available());
        catalog.close();
        assert!(catalog.user_ids().unwrap_err().is_unavailable());
    }

    #[test]
    fn test_reads_return_canonical_ids() {
        let catalog = fixture();
        let ratings = catalog.ratings_by_user("1").unwrap();
        assert_eq!(ratings[0].movie_id.as_str(), "s0111161");

        let mut ids = catalog.movie_ids().unwrap();
        ids.sort();
        assert_eq!(ids, vec![normalize("s0111161"), normalize("s42")]);
    }

    #[test]
    fn test_raters_resolve_canonical_ids() {
        let catalog = fixture();
        let raters = catalog.raters_of(&normalize("s42")).unwrap();
        assert_eq!(
            raters,
            vec![Rater {
                user_id: "2".to_string(),
                value: 4
            }]
        );
        assert!(catalog.raters_of(&normalize("s999")).unwrap().is_empty());
    }

    #[test]
    fn test_genre_name_is_checked_against_closed_set() {
        let catalog = fixture();
        let horror = catalog.movies_by_genre_name("horror", Page::first(5)).unwrap();
        assert_eq!(horror, vec![normalize("42")]);

        let err = catalog
            .movies_by_genre_name("Drama OR 1=1", Page::first(5))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownGenre(_)));
    }

    #[test]
    fn test_existing_and_genres() {
        let catalog = fixture();
        let ids = vec![normalize("s42"), normalize("s7")];
        let present = catalog.existing(&ids).unwrap();
        assert!(present.contains(&normalize("s42")));
        assert!(!present.contains(&normalize("s7")));

        let genres = catalog.movie_genres(&ids).unwrap();
        assert_eq!(genres.len(), 1);
        assert!(genres[&normalize("s42")].contains(Genre::SciFi));
    }

    #[test]
    fn test_similarity_join_carries_stats() {
        let catalog = fixture();
        let flags: GenreFlags = [Genre::SciFi].into_iter().collect();
        let matches = catalog.movies_with_any_genre(flags).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].movie_id, normalize("42"));
        assert_eq!(matches[0].stats.rating_count, 1);
        assert!(catalog.movies_with_any_genre(GenreFlags::empty()).unwrap().is_empty());
    }
}
