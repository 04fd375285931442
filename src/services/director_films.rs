use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{DirectorId, Film, FilmId, SortOrder},
    services::{aggregator::FilmAggregator, popularity::sort_by_popularity},
};

/// A director's filmography
#[derive(Clone)]
pub struct DirectorFilms {
    aggregator: FilmAggregator,
}

impl DirectorFilms {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self { aggregator }
    }

    /// Films by the director, oldest first or most liked first
    #[instrument(skip(self))]
    pub async fn films_by_director(
        &self,
        director_id: DirectorId,
        order: SortOrder,
    ) -> AppResult<Vec<Film>> {
        let store = self.aggregator.store();

        if store.directors_by_ids(&[director_id]).await?.is_empty() {
            return Err(AppError::NotFound(format!(
                "Director with id {} not found",
                director_id
            )));
        }

        let ids: Vec<FilmId> = store
            .film_ids_with_director(director_id)
            .await?
            .into_iter()
            .collect();
        let mut films = self.aggregator.hydrate_ids(&ids).await?;

        match order {
            SortOrder::Year => films.sort_by(|a, b| {
                a.release_date
                    .cmp(&b.release_date)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            SortOrder::Likes => sort_by_popularity(&mut films),
        }

        Ok(films)
    }
}
