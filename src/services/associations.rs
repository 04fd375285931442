//! Batch loading of the many-to-many film relations (genres, directors).
//!
//! A whole collection of films is resolved with one store query per
//! relation, never one query per film.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::{
    db::QueryStore,
    error::AppResult,
    models::{Director, FilmId, Genre},
};

/// Genres and directors for a set of films
///
/// Films without an entry have an empty association set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilmAssociations {
    pub genres: HashMap<FilmId, Vec<Genre>>,
    pub directors: HashMap<FilmId, Vec<Director>>,
}

impl FilmAssociations {
    /// Removes and returns both sets for one film
    pub fn take(&mut self, film_id: FilmId) -> (Vec<Genre>, Vec<Director>) {
        (
            self.genres.remove(&film_id).unwrap_or_default(),
            self.directors.remove(&film_id).unwrap_or_default(),
        )
    }
}

#[derive(Clone)]
pub struct AssociationLoader {
    store: Arc<dyn QueryStore>,
}

impl AssociationLoader {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    /// Genres for every requested film, each list ascending by genre id
    pub async fn load_genres(&self, film_ids: &[FilmId]) -> AppResult<HashMap<FilmId, Vec<Genre>>> {
        let ids = distinct(film_ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut genres = self.store.genres_for_films(&ids).await?;
        genres.values_mut().for_each(normalize);
        Ok(genres)
    }

    /// Directors for every requested film, each list ascending by director id
    pub async fn load_directors(
        &self,
        film_ids: &[FilmId],
    ) -> AppResult<HashMap<FilmId, Vec<Director>>> {
        let ids = distinct(film_ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut directors = self.store.directors_for_films(&ids).await?;
        directors.values_mut().for_each(normalize);
        Ok(directors)
    }

    /// Both relations at once; the two queries run concurrently
    pub async fn load(&self, film_ids: &[FilmId]) -> AppResult<FilmAssociations> {
        let (genres, directors) =
            tokio::try_join!(self.load_genres(film_ids), self.load_directors(film_ids))?;

        tracing::debug!(
            films = film_ids.len(),
            with_genres = genres.len(),
            with_directors = directors.len(),
            "Loaded film associations"
        );

        Ok(FilmAssociations { genres, directors })
    }

    /// Current genre set of a single film
    pub async fn film_genres(&self, film_id: FilmId) -> AppResult<Vec<Genre>> {
        let mut genres = self.load_genres(&[film_id]).await?;
        Ok(genres.remove(&film_id).unwrap_or_default())
    }
}

fn distinct(film_ids: &[FilmId]) -> Vec<FilmId> {
    film_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize<T: Ord>(items: &mut Vec<T>) {
    items.sort();
    items.dedup();
}
