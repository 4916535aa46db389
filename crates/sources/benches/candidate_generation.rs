//! Benchmarks for candidate generation
//!
//! Run with: cargo bench --package sources
//!
//! Scores candidates over a synthetic catalog of 2,000 movies and 500 users.

use catalog::{AgeGroup, Catalog, CatalogIndex, Gender, Genre, Movie, Page, Rating, User};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sources::{ContentScorer, TieredStrategy, user_context::build_user_context};
use std::sync::Arc;

const USERS: u32 = 500;
const MOVIES: u32 = 2_000;
const RATINGS_PER_USER: u32 = 40;

fn synthetic_catalog() -> Catalog {
    let users = (1..=USERS)
        .map(|id| User {
            id: id.to_string(),
            gender: Gender::Male,
            age: AgeGroup::Age25To34,
        })
        .collect();
    let movies = (1..=MOVIES)
        .map(|id| Movie {
            id: id.to_string(),
            title: format!("Movie {id} (1999)"),
            year: Some(1999),
            genres: [
                Genre::ALL[(id as usize) % Genre::ALL.len()],
                Genre::ALL[(id as usize * 7) % Genre::ALL.len()],
            ]
            .into_iter()
            .collect(),
        })
        .collect();
    let ratings = (1..=USERS)
        .flat_map(|user| {
            (0..RATINGS_PER_USER).map(move |i| {
                let movie = (user * 13 + i * 37) % MOVIES + 1;
                Rating {
                    user_id: user.to_string(),
                    movie_id: movie.to_string(),
                    value: ((user + i) % 5 + 1) as u8,
                    timestamp: 0,
                }
            })
        })
        .collect();

    let index = CatalogIndex::from_records(users, movies, ratings).expect("synthetic catalog is valid");
    Catalog::connected(Arc::new(index))
}

fn bench_tiered_collaborative(c: &mut Criterion) {
    let catalog = synthetic_catalog();
    let strategy = TieredStrategy::new(catalog.clone());
    let context = build_user_context(&catalog, "1").expect("Failed to build user context");

    c.bench_function("tiered_strict_page", |b| {
        b.iter(|| black_box(strategy.recommend(black_box(&context), 0, 10)))
    });
    c.bench_function("tiered_extended_page", |b| {
        b.iter(|| black_box(strategy.recommend(black_box(&context), 85, 10)))
    });
}

fn bench_content_candidates(c: &mut Criterion) {
    let catalog = synthetic_catalog();
    let scorer = ContentScorer::new(catalog.clone());
    let context = build_user_context(&catalog, "1").expect("Failed to build user context");

    c.bench_function("content_get_candidates", |b| {
        b.iter(|| {
            let candidates = scorer.get_candidates(black_box(&context), Page::first(10));
            black_box(candidates)
        })
    });
}

fn bench_build_user_context(c: &mut Criterion) {
    let catalog = synthetic_catalog();

    c.bench_function("build_user_context", |b| {
        b.iter(|| {
            let context = build_user_context(&catalog, black_box("1")).unwrap();
            black_box(context)
        })
    });
}

criterion_group!(
    benches,
    bench_tiered_collaborative,
    bench_content_candidates,
    bench_build_user_context
);
criterion_main!(benches);
