//! Genre profiling.
//!
//! A user's preferred genres are the genres that show up most often among
//! the movies they rated 3.5 or higher.

use catalog::{Catalog, CatalogResult, Genre, UserRating};

/// Ratings at or above this count towards the genre profile
pub const PROFILE_MIN_RATING: f32 = 3.5;

/// Profiles never return more genres than this
pub const MAX_PREFERRED_GENRES: usize = 3;

/// Substituted when a user has no qualifying ratings
pub const DEFAULT_GENRES: [Genre; 3] = [Genre::Action, Genre::Comedy, Genre::Drama];

/// Up to three preferred genres for `user_id`, strongest first
pub fn preferred_genres(catalog: &Catalog, user_id: &str) -> CatalogResult<Vec<Genre>> {
    let ratings = catalog.ratings_by_user(user_id)?;
    rank_genres(catalog, &ratings)
}

/// Profile a set of ratings that has already been fetched.
///
/// Each qualifying rating adds one to every genre its movie is flagged with.
/// Ties keep genre declaration order; zero scores are dropped.
pub fn rank_genres(catalog: &Catalog, ratings: &[UserRating]) -> CatalogResult<Vec<Genre>> {
    let liked: Vec<_> = ratings
        .iter()
        .filter(|rating| f32::from(rating.value) >= PROFILE_MIN_RATING)
        .map(|rating| rating.movie_id.clone())
        .collect();
    if liked.is_empty() {
        return Ok(Vec::new());
    }

    let flags = catalog.movie_genres(&liked)?;
    let mut scores = [0u32; Genre::ALL.len()];
    for movie_id in &liked {
        if let Some(genres) = flags.get(movie_id) {
            for genre in genres.iter() {
                scores[genre.index()] += 1;
            }
        }
    }

    let mut ranked: Vec<(Genre, u32)> = Genre::ALL
        .into_iter()
        .map(|genre| (genre, scores[genre.index()]))
        .filter(|(_, score)| *score > 0)
        .collect();
    // stable: equal scores stay in declaration order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(ranked
        .into_iter()
        .take(MAX_PREFERRED_GENRES)
        .map(|(genre, _)| genre)
        .collect())
}

/// `preferred`, or [`DEFAULT_GENRES`] when it is empty
pub fn genres_or_default(preferred: &[Genre]) -> Vec<Genre> {
    if preferred.is_empty() {
        DEFAULT_GENRES.to_vec()
    } else {
        preferred.to_vec()
    }
}
