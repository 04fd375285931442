//! Film writes and likes.
//!
//! Genre and director sets are always replaced whole: whatever the payload
//! lists becomes the film's complete association set.

use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Film, FilmId, FilmPayload, UserId},
    services::aggregator::FilmAggregator,
};

#[derive(Clone)]
pub struct FilmCatalog {
    aggregator: FilmAggregator,
}

impl FilmCatalog {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self { aggregator }
    }

    pub async fn all_films(&self) -> AppResult<Vec<Film>> {
        self.aggregator.all_films().await
    }

    pub async fn film(&self, id: FilmId) -> AppResult<Film> {
        self.aggregator.film_by_id(id).await
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_film(&self, payload: FilmPayload) -> AppResult<Film> {
        payload.validate()?;
        self.check_references(&payload).await?;

        let id = self
            .aggregator
            .store()
            .save_film(None, &payload)
            .await?
            .ok_or_else(|| AppError::Internal("Store assigned no id to new film".to_string()))?;

        tracing::info!(film_id = id, "Film created");

        self.aggregator.film_by_id(id).await
    }

    #[instrument(skip(self, payload), fields(film_id = ?payload.id))]
    pub async fn update_film(&self, payload: FilmPayload) -> AppResult<Film> {
        let id = payload
            .id
            .ok_or_else(|| AppError::InvalidArgument("Film id is required".to_string()))?;

        payload.validate()?;
        self.check_references(&payload).await?;

        if self.aggregator.store().save_film(Some(id), &payload).await?.is_none() {
            return Err(AppError::NotFound(format!("Film with id {} not found", id)));
        }

        tracing::info!("Film updated");

        self.aggregator.film_by_id(id).await
    }

    #[instrument(skip(self))]
    pub async fn add_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        self.ensure_film(film_id).await?;
        self.aggregator.store().add_like(film_id, user_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        self.ensure_film(film_id).await?;
        self.aggregator.store().remove_like(film_id, user_id).await
    }

    async fn ensure_film(&self, film_id: FilmId) -> AppResult<()> {
        match self.aggregator.store().film_by_id(film_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!(
                "Film with id {} not found",
                film_id
            ))),
        }
    }

    /// Every referenced rating, genre and director must exist
    async fn check_references(&self, payload: &FilmPayload) -> AppResult<()> {
        let store = self.aggregator.store();
        let genre_ids = payload.genre_ids();
        let director_ids = payload.director_ids();

        let (mpa, genres, directors) = tokio::try_join!(
            store.mpa_rating_by_id(payload.mpa.id),
            store.genres_by_ids(&genre_ids),
            store.directors_by_ids(&director_ids)
        )?;

        if mpa.is_none() {
            return Err(AppError::NotFound(format!(
                "MPA rating with id {} not found",
                payload.mpa.id
            )));
        }

        if let Some(missing) = genre_ids
            .iter()
            .find(|id| !genres.iter().any(|genre| genre.id == **id))
        {
            return Err(AppError::NotFound(format!(
                "Genre with id {} not found",
                missing
            )));
        }

        if let Some(missing) = director_ids
            .iter()
            .find(|id| !directors.iter().any(|director| director.id == **id))
        {
            return Err(AppError::NotFound(format!(
                "Director with id {} not found",
                missing
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, MockQueryStore, QueryStore};
    use crate::models::{Genre, IdRef, MpaRating};
    use crate::services::associations::AssociationLoader;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn payload(name: &str, genres: &[i64]) -> FilmPayload {
        FilmPayload {
            id: None,
            name: name.to_string(),
            description: "A film".to_string(),
            release_date: NaiveDate::from_ymd_opt(2010, 7, 16).unwrap(),
            duration: 148,
            mpa: IdRef { id: 3 },
            genres: genres.iter().map(|id| IdRef { id: *id }).collect(),
            directors: vec![],
        }
    }

    fn catalog() -> (Arc<InMemoryStore>, FilmCatalog) {
        let store = Arc::new(InMemoryStore::new());
        let catalog = FilmCatalog::new(FilmAggregator::new(store.clone()));
        (store, catalog)
    }

    #[tokio::test]
    async fn test_create_film_hydrates_associations() {
        let (store, catalog) = catalog();
        let director = store.insert_director("Christopher Nolan").await.unwrap();
        let mut body = payload("Inception", &[4, 6, 4]);
        body.directors = vec![IdRef { id: director.id }];

        let film = catalog.create_film(body).await.unwrap();

        assert_eq!(film.id, 1);
        assert_eq!(film.mpa.name, "PG-13");
        assert_eq!(film.genre_ids(), vec![4, 6]);
        assert_eq!(film.directors, vec![director]);
        assert_eq!(film.likes, 0);
    }

    #[tokio::test]
    async fn test_replacing_genres_drops_previous_set() {
        let (store, catalog) = catalog();
        let created = catalog
            .create_film(payload("Paddington", &[1, 2]))
            .await
            .unwrap();

        let mut update = payload("Paddington", &[6]);
        update.id = Some(created.id);
        catalog.update_film(update).await.unwrap();

        let loader = AssociationLoader::new(store);
        let genres = loader.film_genres(created.id).await.unwrap();
        let ids: Vec<i64> = genres.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![6]);
    }

    #[tokio::test]
    async fn test_replacing_with_same_set_is_idempotent() {
        let (_, catalog) = catalog();
        let created = catalog
            .create_film(payload("Amelie", &[1, 2]))
            .await
            .unwrap();

        let mut update = payload("Amelie", &[2, 1]);
        update.id = Some(created.id);
        let once = catalog.update_film(update.clone()).await.unwrap();
        let twice = catalog.update_film(update).await.unwrap();

        assert_eq!(once.genres, twice.genres);
        assert_eq!(twice.genre_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected_before_store() {
        let (store, catalog) = catalog();
        let mut body = payload("Too Early", &[]);
        body.release_date = NaiveDate::from_ymd_opt(1890, 1, 1).unwrap();

        let result = catalog.create_film(body).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
        assert!(store.all_film_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_references_not_found() {
        let (_, catalog) = catalog();

        let mut bad_mpa = payload("Film", &[]);
        bad_mpa.mpa = IdRef { id: 99 };
        let bad_genre = payload("Film", &[1, 42]);
        let mut bad_director = payload("Film", &[]);
        bad_director.directors = vec![IdRef { id: 5 }];

        assert!(matches!(
            catalog.create_film(bad_mpa).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.create_film(bad_genre).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.create_film(bad_director).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_existing_film() {
        let (_, catalog) = catalog();

        let missing_id = catalog.update_film(payload("Ghost", &[])).await;
        let mut unknown = payload("Ghost", &[]);
        unknown.id = Some(404);
        let unknown = catalog.update_film(unknown).await;

        assert!(matches!(missing_id, Err(AppError::InvalidArgument(_))));
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_likes_round_trip() {
        let (_, catalog) = catalog();
        let film = catalog.create_film(payload("Up", &[3])).await.unwrap();

        catalog.add_like(film.id, 10).await.unwrap();
        catalog.add_like(film.id, 10).await.unwrap();
        catalog.add_like(film.id, 11).await.unwrap();
        assert_eq!(catalog.film(film.id).await.unwrap().likes, 2);

        catalog.remove_like(film.id, 10).await.unwrap();
        assert_eq!(catalog.film(film.id).await.unwrap().likes, 1);
    }

    #[tokio::test]
    async fn test_like_unknown_film_not_found() {
        let (_, catalog) = catalog();

        let result = catalog.add_like(3, 1).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_partial_write() {
        let mut store = MockQueryStore::new();
        store.expect_mpa_rating_by_id().returning(|id| {
            Ok(Some(MpaRating {
                id,
                name: "G".to_string(),
            }))
        });
        store.expect_genres_by_ids().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| Genre {
                    id: *id,
                    name: format!("Genre {}", id),
                })
                .collect())
        });
        store.expect_directors_by_ids().returning(|_| Ok(vec![]));
        store
            .expect_save_film()
            .times(1)
            .returning(|_, _| Err(AppError::StoreUnavailable("connection reset".to_string())));
        store.expect_replace_film_genres().times(0);
        store.expect_replace_film_directors().times(0);
        store.expect_film_by_id().times(0);
        let catalog = FilmCatalog::new(FilmAggregator::new(Arc::new(store)));

        let mut update = payload("Renamed", &[6]);
        update.id = Some(1);
        let result = catalog.update_film(update).await;

        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_update_of_unknown_film_keeps_catalog_unchanged() {
        let (store, catalog) = catalog();
        let created = catalog
            .create_film(payload("Original", &[1, 2]))
            .await
            .unwrap();

        let mut stray = payload("Stray", &[6]);
        stray.id = Some(created.id + 1);
        let result = catalog.update_film(stray).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        let film = catalog.film(created.id).await.unwrap();
        assert_eq!(film.name, "Original");
        assert_eq!(film.genre_ids(), vec![1, 2]);
        assert!(store.film_ids_with_genre(6).await.unwrap().is_empty());
    }
}
