use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::{Director, DirectorId, FilmId, Genre, GenreId, MpaId, MpaRating};

/// Longest description a film may carry, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Films released on or before this date are rejected
pub fn earliest_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

/// Base film record as stored, joined with its MPA rating but without
/// genres, directors or likes
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FilmRow {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i32,
    pub mpa_id: MpaId,
    pub mpa_name: String,
}

impl FilmRow {
    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }
}

/// Fully hydrated film returned to callers
///
/// `genres` and `directors` are always the complete associated sets, ordered
/// by ascending id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i32,
    pub mpa: MpaRating,
    pub genres: Vec<Genre>,
    pub directors: Vec<Director>,
    pub likes: u64,
}

impl Film {
    pub fn from_row(row: FilmRow, genres: Vec<Genre>, directors: Vec<Director>, likes: u64) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            release_date: row.release_date,
            duration: row.duration,
            mpa: MpaRating {
                id: row.mpa_id,
                name: row.mpa_name,
            },
            genres,
            directors,
            likes,
        }
    }

    pub fn genre_ids(&self) -> Vec<GenreId> {
        self.genres.iter().map(|g| g.id).collect()
    }
}

/// Reference to an existing entity by id, as sent by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdRef<T> {
    pub id: T,
}

/// Film body accepted on create and update
///
/// `genres` and `directors` always describe the full target set: an update
/// replaces whatever was associated before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmPayload {
    #[serde(default)]
    pub id: Option<FilmId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i32,
    pub mpa: IdRef<MpaId>,
    #[serde(default)]
    pub genres: Vec<IdRef<GenreId>>,
    #[serde(default)]
    pub directors: Vec<IdRef<DirectorId>>,
}

impl FilmPayload {
    /// Checks the field-level invariants of a film
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Film name cannot be blank".to_string(),
            ));
        }

        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::InvalidArgument(format!(
                "Description must not exceed {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }

        if self.release_date <= earliest_release_date() {
            return Err(AppError::InvalidArgument(
                "Release date must be after 1895-12-28".to_string(),
            ));
        }

        if self.duration <= 0 {
            return Err(AppError::InvalidArgument(
                "Duration must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Distinct genre ids, ascending
    pub fn genre_ids(&self) -> Vec<GenreId> {
        let mut ids: Vec<GenreId> = self.genres.iter().map(|g| g.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Distinct director ids, ascending
    pub fn director_ids(&self) -> Vec<DirectorId> {
        let mut ids: Vec<DirectorId> = self.directors.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> FilmPayload {
        FilmPayload {
            id: None,
            name: "Solaris".to_string(),
            description: "A psychologist is sent to a space station".to_string(),
            release_date: NaiveDate::from_ymd_opt(1972, 3, 20).unwrap(),
            duration: 167,
            mpa: IdRef { id: 2 },
            genres: vec![IdRef { id: 2 }, IdRef { id: 1 }, IdRef { id: 2 }],
            directors: vec![],
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut film = payload();
        film.name = "   ".to_string();
        assert!(matches!(film.validate(), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_description_length_boundary() {
        let mut film = payload();
        film.description = "x".repeat(MAX_DESCRIPTION_CHARS);
        assert!(film.validate().is_ok());

        film.description.push('x');
        assert!(matches!(film.validate(), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_release_date_must_follow_first_screening() {
        let mut film = payload();
        film.release_date = earliest_release_date();
        assert!(film.validate().is_err());

        film.release_date = NaiveDate::from_ymd_opt(1895, 12, 29).unwrap();
        assert!(film.validate().is_ok());
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut film = payload();
        film.duration = 0;
        assert!(film.validate().is_err());
    }

    #[test]
    fn test_genre_ids_are_sorted_and_unique() {
        assert_eq!(payload().genre_ids(), vec![1, 2]);
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let json = r#"{
            "name": "Stalker",
            "description": "",
            "releaseDate": "1979-05-25",
            "duration": 161,
            "mpa": {"id": 1},
            "genres": [{"id": 2}]
        }"#;
        let film: FilmPayload = serde_json::from_str(json).unwrap();
        assert_eq!(film.release_date, NaiveDate::from_ymd_opt(1979, 5, 25).unwrap());
        assert_eq!(film.genre_ids(), vec![2]);
        assert!(film.directors.is_empty());
        assert_eq!(film.id, None);
    }
}
