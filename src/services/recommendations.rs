use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::{
    error::AppResult,
    models::{Film, FilmId, UserId},
    services::aggregator::FilmAggregator,
};

pub const DEFAULT_NEIGHBOR_LIMIT: usize = 10;
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Collaborative filtering over like-sets
///
/// A neighbor is any other user sharing at least one like with the target.
/// The closest neighbors by overlap size vote for the films they liked that
/// the target has not; each neighbor casts at most one vote per film.
#[derive(Clone)]
pub struct RecommendationEngine {
    aggregator: FilmAggregator,
    neighbor_limit: usize,
    result_limit: usize,
}

impl RecommendationEngine {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self {
            aggregator,
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_neighbor_limit(mut self, limit: usize) -> Self {
        self.neighbor_limit = limit;
        self
    }

    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Films the user has not liked, strongest recommendation first
    ///
    /// A user without likes, or without neighbors, gets an empty list.
    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: UserId) -> AppResult<Vec<Film>> {
        let store = self.aggregator.store();

        let target = store.likes_for_user(user_id).await?;
        if target.is_empty() {
            tracing::debug!("User has no likes, nothing to recommend from");
            return Ok(Vec::new());
        }

        let target_ids: Vec<FilmId> = target.iter().copied().collect();
        let overlaps = store.users_liking_films(&target_ids).await?;
        let neighbors = select_neighbors(user_id, &overlaps, self.neighbor_limit);
        if neighbors.is_empty() {
            tracing::debug!("No neighbors share a like with user");
            return Ok(Vec::new());
        }

        let neighbor_likes = store.likes_for_users(&neighbors).await?;
        let ranked = score_candidates(&target, &neighbor_likes, self.result_limit);

        tracing::info!(
            liked = target.len(),
            neighbors = neighbors.len(),
            recommended = ranked.len(),
            "Computed recommendations"
        );

        self.aggregator.hydrate_ids(&ranked).await
    }
}

/// Top `limit` neighbors by overlap size descending, ties by ascending user id
///
/// The target user is never its own neighbor.
pub fn select_neighbors(
    user_id: UserId,
    overlaps: &HashMap<UserId, HashSet<FilmId>>,
    limit: usize,
) -> Vec<UserId> {
    let mut candidates: Vec<(UserId, usize)> = overlaps
        .iter()
        .filter(|(neighbor, shared)| **neighbor != user_id && !shared.is_empty())
        .map(|(neighbor, shared)| (*neighbor, shared.len()))
        .collect();

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    candidates.truncate(limit);
    candidates.into_iter().map(|(neighbor, _)| neighbor).collect()
}

/// Candidate film ids ranked by distinct neighbor votes, ties by ascending id
pub fn score_candidates(
    target: &HashSet<FilmId>,
    neighbor_likes: &HashMap<UserId, HashSet<FilmId>>,
    limit: usize,
) -> Vec<FilmId> {
    let mut votes: HashMap<FilmId, usize> = HashMap::new();

    for liked in neighbor_likes.values() {
        for film_id in liked.iter().filter(|id| !target.contains(*id)) {
            *votes.entry(*film_id).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(FilmId, usize)> = votes.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(film_id, _)| film_id).collect()
}
