use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{
        Director, DirectorId, FilmId, FilmPayload, FilmRow, Genre, GenreId, MpaId, MpaRating,
        UserId,
    },
};

/// Query interface over the film catalog's persistent state
///
/// Every read the aggregation core performs goes through this trait, so the
/// engine never depends on whether persistence is in-memory or durable.
///
/// Batch methods take a slice of ids and must answer with a single round
/// trip. Ids with no matching rows are simply absent from the returned map;
/// they are never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QueryStore: Send + Sync {
    /// Base row for one film, `None` when the id is unknown
    async fn film_by_id(&self, id: FilmId) -> AppResult<Option<FilmRow>>;

    /// Every base film row, ascending by id
    async fn all_film_rows(&self) -> AppResult<Vec<FilmRow>>;

    /// Base rows for the given ids, in no particular order
    async fn film_rows_by_ids(&self, ids: &[FilmId]) -> AppResult<Vec<FilmRow>>;

    /// Writes a film and its full genre and director sets as one unit
    ///
    /// `None` inserts and returns the assigned id. `Some(id)` overwrites that
    /// film and returns `None` when it does not exist. Either the scalar row
    /// and both association sets are all stored, or nothing is.
    async fn save_film(&self, id: Option<FilmId>, film: &FilmPayload)
        -> AppResult<Option<FilmId>>;

    /// Genres keyed by film id for every requested film that has any
    async fn genres_for_films(&self, ids: &[FilmId]) -> AppResult<HashMap<FilmId, Vec<Genre>>>;

    /// Directors keyed by film id for every requested film that has any
    async fn directors_for_films(
        &self,
        ids: &[FilmId],
    ) -> AppResult<HashMap<FilmId, Vec<Director>>>;

    /// Ids of films associated with the genre
    async fn film_ids_with_genre(&self, genre_id: GenreId) -> AppResult<HashSet<FilmId>>;

    /// Ids of films associated with the director
    async fn film_ids_with_director(&self, director_id: DirectorId)
        -> AppResult<HashSet<FilmId>>;

    /// Replaces the film's whole genre set (delete-then-insert)
    async fn replace_film_genres(&self, film_id: FilmId, genre_ids: &[GenreId]) -> AppResult<()>;

    /// Replaces the film's whole director set (delete-then-insert)
    async fn replace_film_directors(
        &self,
        film_id: FilmId,
        director_ids: &[DirectorId],
    ) -> AppResult<()>;

    /// Films the user has liked
    async fn likes_for_user(&self, user_id: UserId) -> AppResult<HashSet<FilmId>>;

    /// Full like-sets for several users, keyed by user id
    async fn likes_for_users(
        &self,
        user_ids: &[UserId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>>;

    /// For every user who liked at least one of `film_ids`, the subset of
    /// `film_ids` they liked
    async fn users_liking_films(
        &self,
        film_ids: &[FilmId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>>;

    /// Like totals for the requested films; unliked films are absent
    async fn like_counts(&self, film_ids: &[FilmId]) -> AppResult<HashMap<FilmId, u64>>;

    /// Records a like; repeating it is a no-op
    async fn add_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()>;

    async fn remove_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()>;

    async fn all_genres(&self) -> AppResult<Vec<Genre>>;

    async fn genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>>;

    async fn all_mpa_ratings(&self) -> AppResult<Vec<MpaRating>>;

    async fn mpa_rating_by_id(&self, id: MpaId) -> AppResult<Option<MpaRating>>;

    async fn all_directors(&self) -> AppResult<Vec<Director>>;

    async fn directors_by_ids(&self, ids: &[DirectorId]) -> AppResult<Vec<Director>>;

    async fn insert_director(&self, name: &str) -> AppResult<Director>;

    /// Renames a director; `false` when the director does not exist
    async fn update_director(&self, id: DirectorId, name: &str) -> AppResult<bool>;

    /// Deletes a director and its film associations; `false` when absent
    async fn delete_director(&self, id: DirectorId) -> AppResult<bool>;
}
