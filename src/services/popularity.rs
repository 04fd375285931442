use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Film, FilmId, FilmRow, GenreId},
    services::aggregator::FilmAggregator,
};

/// Orders by like count descending, then film id ascending
pub fn popularity_cmp(a: (FilmId, u64), b: (FilmId, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Sorts hydrated films most-liked first, ties by ascending id
pub fn sort_by_popularity(films: &mut [Film]) {
    films.sort_by(|a, b| popularity_cmp((a.id, a.likes), (b.id, b.likes)));
}

/// Top-N films by like count
#[derive(Clone)]
pub struct PopularityRanker {
    aggregator: FilmAggregator,
}

impl PopularityRanker {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self { aggregator }
    }

    /// The `limit` most liked films, optionally restricted to a genre and a
    /// release year
    ///
    /// Unliked films count as zero likes and still qualify. An unknown genre
    /// simply matches nothing.
    #[instrument(skip(self))]
    pub async fn rank(
        &self,
        limit: i64,
        genre_id: Option<GenreId>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>> {
        if limit <= 0 {
            return Err(AppError::InvalidArgument(format!(
                "count must be a positive integer, got {}",
                limit
            )));
        }

        let store = self.aggregator.store();
        let mut rows = store.all_film_rows().await?;

        if let Some(genre_id) = genre_id {
            let in_genre = store.film_ids_with_genre(genre_id).await?;
            rows.retain(|row| in_genre.contains(&row.id));
        }

        if let Some(year) = year {
            rows.retain(|row| row.release_year() == year);
        }

        if rows.is_empty() {
            tracing::info!("No films match popularity filters");
            return Ok(Vec::new());
        }

        let ids: Vec<FilmId> = rows.iter().map(|row| row.id).collect();
        let likes = store.like_counts(&ids).await?;
        let top = top_rows(rows, &likes, limit as usize);

        let films = self.aggregator.hydrate_counted(top, &likes).await?;

        tracing::info!(returned = films.len(), "Popular films ranked");

        Ok(films)
    }
}

fn top_rows(mut rows: Vec<FilmRow>, likes: &HashMap<FilmId, u64>, limit: usize) -> Vec<FilmRow> {
    let count = |id: FilmId| likes.get(&id).copied().unwrap_or(0);
    rows.sort_by(|a, b| popularity_cmp((a.id, count(a.id)), (b.id, count(b.id))));
    rows.truncate(limit);
    rows
}
