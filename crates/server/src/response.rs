//! The typed recommendation response.
//!
//! Serialized shape:
//! ```json
//! { "collaborative": ["s1"], "contentBased": ["s2"], "genres": { "Drama": ["s3"] } }
//! ```

use catalog::{CanonicalMovieId, Genre};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Most genre sections a response carries
pub const MAX_GENRE_SECTIONS: usize = 3;

/// Genre → ids, in insertion order (strongest preference first).
///
/// Holds at most [`MAX_GENRE_SECTIONS`] entries and never an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreSections {
    entries: Vec<(Genre, Vec<CanonicalMovieId>)>,
}

impl GenreSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section. Empty lists, repeated genres and anything past the
    /// cap are ignored; returns whether the section was kept.
    pub fn insert(&mut self, genre: Genre, movie_ids: Vec<CanonicalMovieId>) -> bool {
        if movie_ids.is_empty() || self.is_full() || self.get(genre).is_some() {
            return false;
        }
        self.entries.push((genre, movie_ids));
        true
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_GENRE_SECTIONS
    }

    pub fn get(&self, genre: Genre) -> Option<&[CanonicalMovieId]> {
        self.entries
            .iter()
            .find(|(g, _)| *g == genre)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn genres(&self) -> impl Iterator<Item = Genre> + '_ {
        self.entries.iter().map(|(genre, _)| *genre)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Genre, &[CanonicalMovieId])> {
        self.entries.iter().map(|(genre, ids)| (*genre, ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for GenreSections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (genre, ids) in &self.entries {
            map.serialize_entry(genre.name(), ids)?;
        }
        map.end()
    }
}

/// The three sections returned for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub collaborative: Vec<CanonicalMovieId>,
    pub content_based: Vec<CanonicalMovieId>,
    pub genres: GenreSections,
}

impl RecommendationSet {
    /// Every id in the set, section by section
    pub fn all_ids(&self) -> impl Iterator<Item = &CanonicalMovieId> {
        self.collaborative
            .iter()
            .chain(&self.content_based)
            .chain(self.genres.entries.iter().flat_map(|(_, ids)| ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::normalize;

    #[test]
    fn test_genre_sections_cap_and_skip_empty() {
        let mut sections = GenreSections::new();
        assert!(!sections.insert(Genre::Action, Vec::new()));
        assert!(sections.insert(Genre::Drama, vec![normalize("1")]));
        assert!(!sections.insert(Genre::Drama, vec![normalize("2")]));
        assert!(sections.insert(Genre::Comedy, vec![normalize("3")]));
        assert!(sections.insert(Genre::War, vec![normalize("4")]));
        assert!(!sections.insert(Genre::Horror, vec![normalize("5")]));

        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections.genres().collect::<Vec<_>>(),
            vec![Genre::Drama, Genre::Comedy, Genre::War]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut genres = GenreSections::new();
        genres.insert(Genre::SciFi, vec![normalize("tt0133093")]);
        genres.insert(Genre::Action, vec![normalize("7")]);
        let set = RecommendationSet {
            collaborative: vec![normalize("1")],
            content_based: vec![normalize("s2")],
            genres,
        };

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"{"collaborative":["s1"],"contentBased":["s2"],"genres":{"SciFi":["s0133093"],"Action":["s7"]}}"#
        );
    }
}
