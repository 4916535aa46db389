//! Filter to drop repeated ids. The first occurrence wins.

use crate::traits::Filter;
use anyhow::Result;
use catalog::CanonicalMovieId;
use sources::UserContext;
use std::collections::HashSet;

pub struct DistinctFilter;

impl Filter for DistinctFilter {
    fn name(&self) -> &str {
        "DistinctFilter"
    }

    fn apply(
        &self,
        movie_ids: Vec<CanonicalMovieId>,
        _context: &UserContext,
    ) -> Result<Vec<CanonicalMovieId>> {
        let mut seen = HashSet::with_capacity(movie_ids.len());
        Ok(movie_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::normalize;

    #[test]
    fn test_keeps_first_occurrence() {
        let ids = vec![
            normalize("2"),
            normalize("1"),
            normalize("tt2"),
            normalize("3"),
            normalize("1"),
        ];
        let filtered = DistinctFilter.apply(ids, &UserContext::new("u")).unwrap();
        assert_eq!(filtered, vec![normalize("2"), normalize("1"), normalize("3")]);
    }
}
