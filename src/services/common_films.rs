use tracing::instrument;

use crate::{
    error::AppResult,
    models::{Film, FilmId, UserId},
    services::{aggregator::FilmAggregator, popularity::popularity_cmp},
};

/// Films liked by both of two users
#[derive(Clone)]
pub struct CommonFilmsFinder {
    aggregator: FilmAggregator,
}

impl CommonFilmsFinder {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self { aggregator }
    }

    /// Intersection of the two like-sets, most liked first
    ///
    /// Passing the same user twice yields that user's whole like-set.
    #[instrument(skip(self))]
    pub async fn common_films(&self, user_id: UserId, friend_id: UserId) -> AppResult<Vec<Film>> {
        let store = self.aggregator.store();

        let mut common: Vec<FilmId> = if user_id == friend_id {
            store.likes_for_user(user_id).await?.into_iter().collect()
        } else {
            let (mine, theirs) = tokio::try_join!(
                store.likes_for_user(user_id),
                store.likes_for_user(friend_id)
            )?;
            mine.intersection(&theirs).copied().collect()
        };

        if common.is_empty() {
            return Ok(Vec::new());
        }

        let likes = store.like_counts(&common).await?;
        let count = |id: FilmId| likes.get(&id).copied().unwrap_or(0);
        common.sort_by(|a, b| popularity_cmp((*a, count(*a)), (*b, count(*b))));

        tracing::debug!(common = common.len(), "Intersected like-sets");

        self.aggregator.hydrate_ids_counted(&common, &likes).await
    }
}
