use serde::{Deserialize, Serialize};

pub mod film;

pub use film::{Film, FilmPayload, FilmRow, IdRef};

pub type FilmId = i64;
pub type UserId = i64;
pub type GenreId = i64;
pub type DirectorId = i64;
pub type MpaId = i64;

/// Film genre from the static genre table
///
/// Ordering is by id first, which is the order genres are reported in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::FromRow)]
pub struct Director {
    pub id: DirectorId,
    pub name: String,
}

/// Content rating (G, PG, PG-13, R, NC-17)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::FromRow)]
pub struct MpaRating {
    pub id: MpaId,
    pub name: String,
}

/// Director body accepted on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorPayload {
    #[serde(default)]
    pub id: Option<DirectorId>,
    pub name: String,
}

/// Which film fields a catalog search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Title,
    Director,
    #[default]
    Both,
}

impl SearchScope {
    /// Parses a `by` parameter such as `title`, `director` or `director,title`.
    ///
    /// Missing, blank or unrecognised values search both fields.
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = match raw {
            Some(value) if !value.trim().is_empty() => value.to_lowercase().replace(' ', ""),
            _ => return SearchScope::Both,
        };

        let title = normalized.contains("title");
        let director = normalized.contains("director");

        match (title, director) {
            (true, false) => SearchScope::Title,
            (false, true) => SearchScope::Director,
            _ => SearchScope::Both,
        }
    }

    pub fn matches_title(self) -> bool {
        matches!(self, SearchScope::Title | SearchScope::Both)
    }

    pub fn matches_director(self) -> bool {
        matches!(self, SearchScope::Director | SearchScope::Both)
    }
}

/// Ordering for a director's filmography
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Year,
    Likes,
}

impl SortOrder {
    /// Parses a `sortBy` parameter, defaulting to `Year`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("likes") => SortOrder::Likes,
            _ => SortOrder::Year,
        }
    }
}
