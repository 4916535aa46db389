//! Build a [`UserContext`] from the catalog.
//!
//! Gather the user's history once up front so the scorers never re-query it.

use crate::profile;
use crate::types::UserContext;
use catalog::{Catalog, CatalogResult};

/// Ratings at or above this mark a movie as liked
pub const LIKED_MIN_RATING: u8 = 4;

/// Build the context for `user_id`.
///
/// A user with no ratings gets an empty context, not an error. Fails only
/// when the catalog itself does.
pub fn build_user_context(catalog: &Catalog, user_id: &str) -> CatalogResult<UserContext> {
    let mut context = UserContext::new(user_id);

    let ratings = catalog.ratings_by_user(user_id)?;
    if ratings.is_empty() {
        return Ok(context);
    }

    for rating in &ratings {
        context.rated.insert(rating.movie_id.clone());
        if rating.value >= LIKED_MIN_RATING {
            context.liked.push(rating.movie_id.clone());
        }
    }
    context.preferred_genres = profile::rank_genres(catalog, &ratings)?;
    context.ratings = ratings;

    Ok(context)
}

/// Mean of the user's ratings, 0.0 when there are none
pub fn average_rating(context: &UserContext) -> f32 {
    if context.ratings.is_empty() {
        return 0.0;
    }
    let total: u32 = context.ratings.iter().map(|r| u32::from(r.value)).sum();
    total as f32 / context.ratings.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CatalogBuilder, FailingStore};
    use catalog::{Genre, normalize};

    fn create_test_catalog() -> Catalog {
        CatalogBuilder::new()
            .movie("1", &[Genre::Action, Genre::Adventure])
            .movie("2", &[Genre::Drama])
            .movie("tt0000003", &[Genre::Action, Genre::SciFi])
            .rate("1", "1", 5)
            .rate("1", "2", 3)
            .rate("1", "tt0000003", 4)
            .user("2")
            .build()
    }

    #[test]
    fn test_build_user_context_basic() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "1").unwrap();

        assert_eq!(context.user_id, "1");
        assert_eq!(context.rated.len(), 3);
        assert!(context.has_rated(&normalize("s1")));
        assert!(context.has_rated(&normalize("s0000003")));
    }

    #[test]
    fn test_liked_movies() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "1").unwrap();

        assert_eq!(context.liked, vec![normalize("1"), normalize("s0000003")]);
        assert_eq!(context.preferred_genres[0], Genre::Action);
    }

    #[test]
    fn test_average_rating() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "1").unwrap();

        // (5 + 3 + 4) / 3
        assert!((average_rating(&context) - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_user_with_no_ratings() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, "2").unwrap();
        assert!(context.rated.is_empty());
        assert!(context.liked.is_empty());
        assert!(context.preferred_genres.is_empty());
        assert_eq!(average_rating(&context), 0.0);
    }

    #[test]
    fn test_catalog_failure_is_reported() {
        assert!(build_user_context(&Catalog::offline(), "1").is_err());
        assert!(build_user_context(&FailingStore::catalog(), "1").is_err());
    }
}
