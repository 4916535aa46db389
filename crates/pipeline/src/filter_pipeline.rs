//! The FilterPipeline chains filters together.

use crate::filters::{AlreadyRatedFilter, CatalogPresenceFilter, DistinctFilter};
use crate::traits::Filter;
use anyhow::Result;
use catalog::{CanonicalMovieId, Catalog};
use sources::UserContext;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyRatedFilter)
///     .add_filter(DistinctFilter)
///     .add_filter(CatalogPresenceFilter::new(catalog.clone()));
///
/// let kept = pipeline.apply(movie_ids, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The pipeline every response section goes through: drop rated ids,
    /// drop repeats, then drop ids missing from the catalog.
    pub fn for_sections(catalog: Catalog) -> Self {
        Self::new()
            .add_filter(AlreadyRatedFilter)
            .add_filter(DistinctFilter)
            .add_filter(CatalogPresenceFilter::new(catalog))
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence. Stops at the first failing filter.
    pub fn apply(
        &self,
        movie_ids: Vec<CanonicalMovieId>,
        context: &UserContext,
    ) -> Result<Vec<CanonicalMovieId>> {
        let mut current = movie_ids;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, context)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use catalog::normalize;

    struct Broken;

    impl Filter for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn apply(
            &self,
            _movie_ids: Vec<CanonicalMovieId>,
            _context: &UserContext,
        ) -> Result<Vec<CanonicalMovieId>> {
            bail!("broken filter")
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = UserContext::new("1");

        let ids = vec![normalize("1"), normalize("2")];
        let filtered = pipeline.apply(ids.clone(), &context).unwrap();
        assert_eq!(filtered, ids);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_single_filter() {
        let mut context = UserContext::new("1");
        context.rated.insert(normalize("1"));

        let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);

        let filtered = pipeline
            .apply(vec![normalize("1"), normalize("2")], &context)
            .unwrap();
        assert_eq!(filtered, vec![normalize("2")]);
    }

    #[test]
    fn test_failing_filter_stops_pipeline() {
        let pipeline = FilterPipeline::new()
            .add_filter(DistinctFilter)
            .add_filter(Broken);
        let result = pipeline.apply(vec![normalize("1")], &UserContext::new("1"));
        assert!(result.is_err());
    }

    #[test]
    fn test_section_pipeline_offline() {
        let pipeline = FilterPipeline::for_sections(Catalog::offline());
        assert_eq!(pipeline.len(), 3);

        let mut context = UserContext::new("1");
        context.rated.insert(normalize("3"));
        let ids = vec![normalize("1"), normalize("3"), normalize("1"), normalize("2")];
        let filtered = pipeline.apply(ids, &context).unwrap();
        assert_eq!(filtered, vec![normalize("1"), normalize("2")]);
    }
}
