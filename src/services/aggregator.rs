use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    db::QueryStore,
    error::{AppError, AppResult},
    models::{Film, FilmId, FilmRow},
    services::associations::{AssociationLoader, FilmAssociations},
};

/// Turns base film rows into complete `Film` values
///
/// Hydration is a single batched pass: one genre query, one director query
/// and one like-count query for the whole input, whatever its size.
#[derive(Clone)]
pub struct FilmAggregator {
    store: Arc<dyn QueryStore>,
    loader: AssociationLoader,
}

impl FilmAggregator {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self {
            loader: AssociationLoader::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn QueryStore> {
        &self.store
    }

    /// Loads and hydrates one film
    pub async fn film_by_id(&self, id: FilmId) -> AppResult<Film> {
        let row = self
            .store
            .film_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Film with id {} not found", id)))?;

        let mut films = self.hydrate(vec![row]).await?;
        films
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Hydration dropped film {}", id)))
    }

    /// Every film in the catalog, ascending by id
    pub async fn all_films(&self) -> AppResult<Vec<Film>> {
        let rows = self.store.all_film_rows().await?;
        self.hydrate(rows).await
    }

    /// Hydrates rows, keeping their order
    pub async fn hydrate(&self, rows: Vec<FilmRow>) -> AppResult<Vec<Film>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<FilmId> = rows.iter().map(|row| row.id).collect();
        let (associations, likes) =
            tokio::try_join!(self.loader.load(&ids), self.store.like_counts(&ids))?;

        Ok(assemble(rows, associations, &likes))
    }

    /// Hydrates rows whose like counts the caller already holds
    pub async fn hydrate_counted(
        &self,
        rows: Vec<FilmRow>,
        likes: &HashMap<FilmId, u64>,
    ) -> AppResult<Vec<Film>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<FilmId> = rows.iter().map(|row| row.id).collect();
        let associations = self.loader.load(&ids).await?;

        Ok(assemble(rows, associations, likes))
    }

    /// Fetches and hydrates films in the order of `ids`
    ///
    /// Ids with no base row are skipped.
    pub async fn hydrate_ids(&self, ids: &[FilmId]) -> AppResult<Vec<Film>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.film_rows_by_ids(ids).await?;
        self.hydrate(order_rows(rows, ids)).await
    }

    /// Same as `hydrate_ids` with like counts already known
    pub async fn hydrate_ids_counted(
        &self,
        ids: &[FilmId],
        likes: &HashMap<FilmId, u64>,
    ) -> AppResult<Vec<Film>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.film_rows_by_ids(ids).await?;
        self.hydrate_counted(order_rows(rows, ids), likes).await
    }
}

fn assemble(
    rows: Vec<FilmRow>,
    mut associations: FilmAssociations,
    likes: &HashMap<FilmId, u64>,
) -> Vec<Film> {
    rows.into_iter()
        .map(|row| {
            let (genres, directors) = associations.take(row.id);
            let like_count = likes.get(&row.id).copied().unwrap_or(0);
            Film::from_row(row, genres, directors, like_count)
        })
        .collect()
}

fn order_rows(rows: Vec<FilmRow>, ids: &[FilmId]) -> Vec<FilmRow> {
    let mut by_id: HashMap<FilmId, FilmRow> = rows.into_iter().map(|row| (row.id, row)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
