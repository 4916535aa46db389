//! Integration tests for the pipeline.
//!
//! These tests run scorer output through the section pipeline in a
//! realistic scenario.

use catalog::{
    AgeGroup, CanonicalMovieId, Catalog, CatalogIndex, Gender, Genre, Movie, Page, Rating, User,
    normalize,
};
use pipeline::filters::*;
use pipeline::FilterPipeline;
use sources::{ContentScorer, user_context::build_user_context};
use std::sync::Arc;

fn movie(id: &str, genres: &[Genre]) -> Movie {
    Movie {
        id: id.to_string(),
        title: format!("Movie {id} (2001)"),
        year: Some(2001),
        genres: genres.iter().copied().collect(),
    }
}

fn rating(user_id: &str, movie_id: &str, value: u8) -> Rating {
    Rating {
        user_id: user_id.to_string(),
        movie_id: movie_id.to_string(),
        value,
        timestamp: 1000000,
    }
}

fn create_test_setup() -> Catalog {
    let users = ["1", "2"]
        .into_iter()
        .map(|id| User {
            id: id.to_string(),
            gender: Gender::Male,
            age: AgeGroup::Age25To34,
        })
        .collect();

    let movies = vec![
        movie("1", &[Genre::Action, Genre::Adventure]),
        movie("2", &[Genre::Drama]),
        movie("tt0000003", &[Genre::SciFi, Genre::Action]),
        movie("4", &[Genre::Action]),
    ];

    let ratings = vec![
        // User 1 has rated movies 1 and 2, likes Action
        rating("1", "1", 5),
        rating("1", "2", 3),
        rating("2", "4", 4),
        rating("2", "tt0000003", 4),
    ];

    let index = CatalogIndex::from_records(users, movies, ratings).unwrap();
    Catalog::connected(Arc::new(index))
}

#[test]
fn test_section_pipeline_filters_correctly() {
    let catalog = create_test_setup();
    let context = build_user_context(&catalog, "1").unwrap();

    let candidates: Vec<CanonicalMovieId> = ["1", "4", "s404", "s0000003", "4", "2"]
        .into_iter()
        .map(normalize)
        .collect();

    let pipeline = FilterPipeline::for_sections(catalog);
    let filtered = pipeline.apply(candidates, &context).unwrap();

    // 1 and 2 are rated, the second 4 is a repeat, s404 is not in the catalog
    assert_eq!(filtered, vec![normalize("4"), normalize("s0000003")]);
}

#[test]
fn test_scorer_output_survives_pipeline() {
    let catalog = create_test_setup();
    let context = build_user_context(&catalog, "1").unwrap();

    let candidates: Vec<CanonicalMovieId> = ContentScorer::new(catalog.clone())
        .get_candidates(&context, Page::first(10))
        .unwrap()
        .into_iter()
        .map(|c| c.movie_id)
        .collect();
    assert!(!candidates.is_empty());

    let filtered = FilterPipeline::for_sections(catalog)
        .apply(candidates.clone(), &context)
        .unwrap();
    assert_eq!(filtered, candidates);
}

#[test]
fn test_custom_pipeline_order() {
    let catalog = create_test_setup();
    let context = build_user_context(&catalog, "1").unwrap();

    let pipeline = FilterPipeline::new()
        .add_filter(CatalogPresenceFilter::new(catalog))
        .add_filter(DistinctFilter);

    // Without the already-rated filter, rated ids survive
    let filtered = pipeline
        .apply(vec![normalize("1"), normalize("1"), normalize("s9")], &context)
        .unwrap();
    assert_eq!(filtered, vec![normalize("1")]);
}

#[test]
fn test_offline_pipeline_keeps_everything_but_rated_and_repeats() {
    let mut context = sources::UserContext::new("500");
    context.rated.insert(normalize("tt0111161"));

    let filtered = FilterPipeline::for_sections(Catalog::offline())
        .apply(
            vec![normalize("tt0111161"), normalize("tt0068646"), normalize("s0068646")],
            &context,
        )
        .unwrap();
    assert_eq!(filtered, vec![normalize("s0068646")]);
}
