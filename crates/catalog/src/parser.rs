//! Parser for the catalog files.
//!
//! All three files are `::`-separated, one record per line:
//! - users.dat: userId::gender::age[::...]
//! - movies.dat: movieId::title::genres (pipe-separated genre labels)
//! - ratings.dat: userId::movieId::rating::timestamp

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const FIELD_SEPARATOR: &str = "::";

/// Read a file as ISO-8859-1 (Latin-1) and split it into lines.
///
/// Each byte maps directly to the Unicode code point of the same value, so
/// the conversion never fails.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|_| DataLoadError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(str::to_string).collect())
}

/// One non-empty line of a catalog file, split into its named fields
struct Record<'a> {
    file: &'static str,
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    /// Split `line` and require at least one field per entry in `names`
    fn split(file: &'static str, line: usize, text: &'a str, names: &[&str]) -> Result<Self> {
        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
        if let Some(missing) = names.get(fields.len()) {
            return Err(DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: format!("Missing {missing}"),
            });
        }
        Ok(Self { file, line, fields })
    }

    fn text(&self, idx: usize) -> &'a str {
        self.fields[idx].trim()
    }

    fn parse<T>(&self, idx: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(idx).parse().map_err(|e| DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason: format!("Invalid {name}: {e}"),
        })
    }
}

/// Non-empty, trimmed lines with their 1-based line numbers
fn data_lines(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn parse_gender(s: &str) -> Result<Gender> {
    match s {
        "M" => Ok(Gender::Male),
        "F" => Ok(Gender::Female),
        _ => Err(DataLoadError::InvalidValue {
            field: "gender".to_string(),
            value: s.to_string(),
        }),
    }
}

fn parse_age_group(s: &str) -> Result<AgeGroup> {
    match s {
        "1" => Ok(AgeGroup::Under18),
        "18" => Ok(AgeGroup::Age18To24),
        "25" => Ok(AgeGroup::Age25To34),
        "35" => Ok(AgeGroup::Age35To44),
        "45" => Ok(AgeGroup::Age45To49),
        "50" => Ok(AgeGroup::Age50To55),
        "56" => Ok(AgeGroup::Age56Plus),
        _ => Err(DataLoadError::InvalidValue {
            field: "age".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse the users file. Trailing fields (occupation, zipcode) are ignored.
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    let lines = read_lines_latin1(path)?;
    data_lines(&lines)
        .map(|(line_no, line)| {
            let record = Record::split("users.dat", line_no, line, &["userId", "gender", "age"])?;
            Ok(User {
                id: record.text(0).to_string(),
                gender: parse_gender(record.text(1))?,
                age: parse_age_group(record.text(2))?,
            })
        })
        .collect()
}

/// Parse the movies file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let lines = read_lines_latin1(path)?;
    data_lines(&lines)
        .map(|(line_no, line)| {
            let record =
                Record::split("movies.dat", line_no, line, &["movieId", "title", "genres"])?;
            let title = record.text(1);
            Ok(Movie {
                id: record.text(0).to_string(),
                title: title.to_string(),
                year: extract_year_from_title(title),
                genres: parse_genres(record.text(2))?,
            })
        })
        .collect()
}

/// Parse the ratings file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let lines = read_lines_latin1(path)?;
    data_lines(&lines)
        .map(|(line_no, line)| {
            let record = Record::split(
                "ratings.dat",
                line_no,
                line,
                &["userId", "movieId", "rating", "timestamp"],
            )?;
            Ok(Rating {
                user_id: record.text(0).to_string(),
                movie_id: record.text(1).to_string(),
                value: record.parse(2, "rating")?,
                timestamp: record.parse(3, "timestamp")?,
            })
        })
        .collect()
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

/// Parse pipe-separated genre labels into flags.
///
/// "Action|Adventure|Sci-Fi" -> {Action, Adventure, SciFi}. An empty field
/// or "(no genres listed)" yields no flags.
fn parse_genres(s: &str) -> Result<GenreFlags> {
    if s.is_empty() || s.eq_ignore_ascii_case("(no genres listed)") {
        return Ok(GenreFlags::empty());
    }
    s.split('|')
        .map(|label| {
            label.parse::<Genre>().map_err(|_| DataLoadError::InvalidValue {
                field: "genre".to_string(),
                value: label.to_string(),
            })
        })
        .collect()
}
