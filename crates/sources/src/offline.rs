//! Deterministic offline mode.
//!
//! With no storage connection every section is served from a fixed sample
//! catalog. Selection is a pure function of `(user_id, section, page)`:
//! - `user_seed` turns the user id into a number
//! - a stable 64-bit mix of that seed picks a start position and a stride
//!   coprime with the sample size, giving a permutation of the sample
//! - the section constant shifts the start, so sections never coincide
//! - a page is the permutation positions `offset .. offset + limit`,
//!   wrapping around the end of the sample

use crate::types::Section;
use catalog::{CanonicalMovieId, Genre, Page, normalize};

/// The fixed offline sample catalog, as external ids
pub const SAMPLE_MOVIE_IDS: [&str; 40] = [
    "tt0111161", "tt0068646", "tt0071562", "tt0468569", "tt0050083", "tt0108052", "tt0167260",
    "tt0110912", "tt0060196", "tt0120737", "tt0109830", "tt0167261", "tt0080684", "tt0133093",
    "tt0099685", "tt0073486", "tt0047478", "tt0114369", "tt0317248", "tt0038650", "tt0102926",
    "tt0076759", "tt0120815", "tt0103064", "tt0088763", "tt0054215", "tt0110413", "tt0120586",
    "tt0021749", "tt0120689", "tt0245429", "tt0209144", "tt0056058", "tt0095327", "tt0910970",
    "tt0407887", "tt0114814", "tt0172495", "tt0040522", "tt0482571",
];

/// Genres offline genre sections are drawn from
pub const OFFLINE_GENRES: [Genre; 9] = [
    Genre::Action,
    Genre::Comedy,
    Genre::Drama,
    Genre::Horror,
    Genre::SciFi,
    Genre::Thriller,
    Genre::Romance,
    Genre::Animation,
    Genre::Documentary,
];

/// User ids `generate_all` covers when offline
pub const SAMPLE_USERS: std::ops::Range<u32> = 500..600;

/// Number of genre sections picked per user
const OFFLINE_GENRE_PICKS: usize = 3;

/// Section constant for genre selection, outside the range of [`Section::seed_offset`]
const GENRE_PICK_OFFSET: u64 = 0x100;

const STRIDE_SALT: u64 = 0x5bd1_e995_c6a4_a793;

/// The numeric value of an all-digit id, else the sum of its character codes
pub fn user_seed(user_id: &str) -> u64 {
    if !user_id.is_empty() && user_id.bytes().all(|b| b.is_ascii_digit()) {
        user_id
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(10).wrapping_add(u64::from(b - b'0')))
    } else {
        user_id.chars().map(|c| u64::from(c as u32)).sum()
    }
}

/// SplitMix64 finalizer: a fixed, platform-independent 64-bit mix
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A permutation of `0..len`: position `i` maps to `(start + i * stride) % len`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicIndex {
    len: usize,
    start: usize,
    stride: usize,
}

impl DeterministicIndex {
    /// Permutation for `seed`, with the start shifted by `section_offset`
    pub fn new(seed: u64, section_offset: u64, len: usize) -> Self {
        if len <= 1 {
            return Self { len, start: 0, stride: 1 };
        }
        let n = len as u64;
        let start = (mix(seed) % n + section_offset % n) % n;

        let mut stride = (1 + mix(seed ^ STRIDE_SALT) % (n - 1)) as usize;
        while gcd(stride, len) != 1 {
            stride = stride % (len - 1) + 1;
        }

        Self {
            len,
            start: start as usize,
            stride,
        }
    }

    pub fn position(&self, i: usize) -> usize {
        if self.len == 0 {
            return 0;
        }
        let step = (i % self.len) * self.stride % self.len;
        (self.start + step) % self.len
    }

    /// Positions for a page. Never more than `len`, so a page holds no repeats.
    pub fn window(&self, page: Page) -> impl Iterator<Item = usize> + '_ {
        let count = page.limit.min(self.len);
        let base = if self.len == 0 { 0 } else { page.offset % self.len };
        (0..count).map(move |i| self.position(base + i))
    }
}

/// The fixed sample catalog and the deterministic reads over it
#[derive(Debug, Clone)]
pub struct OfflineCatalog {
    movies: Vec<CanonicalMovieId>,
}

impl Default for OfflineCatalog {
    fn default() -> Self {
        Self::sample()
    }
}

impl OfflineCatalog {
    pub fn sample() -> Self {
        Self {
            movies: SAMPLE_MOVIE_IDS.iter().map(|id| normalize(id)).collect(),
        }
    }

    pub fn movie_ids(&self) -> &[CanonicalMovieId] {
        &self.movies
    }

    pub fn contains(&self, movie_id: &CanonicalMovieId) -> bool {
        self.movies.contains(movie_id)
    }

    /// One page of `section` for `user_id`
    pub fn page(&self, user_id: &str, section: Section, page: Page) -> Vec<CanonicalMovieId> {
        let index = DeterministicIndex::new(user_seed(user_id), section.seed_offset(), self.movies.len());
        index
            .window(page)
            .map(|position| self.movies[position].clone())
            .collect()
    }

    /// The genre sections shown to `user_id` offline
    pub fn genres_for(&self, user_id: &str) -> Vec<Genre> {
        let index =
            DeterministicIndex::new(user_seed(user_id), GENRE_PICK_OFFSET, OFFLINE_GENRES.len());
        index
            .window(Page::first(OFFLINE_GENRE_PICKS))
            .map(|position| OFFLINE_GENRES[position])
            .collect()
    }

    pub fn sample_users() -> Vec<String> {
        SAMPLE_USERS.map(|id| id.to_string()).collect()
    }
}
