//! Filter implementations for the section pipeline.

pub mod already_rated;
pub mod catalog_presence;
pub mod distinct;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use catalog_presence::CatalogPresenceFilter;
pub use distinct::DistinctFilter;
