//! Filtering for recommendation sections.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate id filtering
//! - FilterPipeline for composing filters
//! - The Validator (`CatalogPresenceFilter`) that strips ids missing from the catalog
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::FilterPipeline;
//!
//! let pipeline = FilterPipeline::for_sections(catalog.clone());
//! let kept = pipeline.apply(movie_ids, &context)?;
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use filters::{AlreadyRatedFilter, CatalogPresenceFilter, DistinctFilter};
pub use traits::Filter;
