use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::QueryStore,
    error::{AppError, AppResult},
    models::{Director, DirectorId, DirectorPayload, Genre, GenreId, MpaId, MpaRating},
};

/// Lookups over genres and MPA ratings, and director management
#[derive(Clone)]
pub struct ReferenceData {
    store: Arc<dyn QueryStore>,
}

impl ReferenceData {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    pub async fn genres(&self) -> AppResult<Vec<Genre>> {
        self.store.all_genres().await
    }

    pub async fn genre(&self, id: GenreId) -> AppResult<Genre> {
        self.store
            .genres_by_ids(&[id])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Genre with id {} not found", id)))
    }

    pub async fn mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        self.store.all_mpa_ratings().await
    }

    pub async fn mpa_rating(&self, id: MpaId) -> AppResult<MpaRating> {
        self.store
            .mpa_rating_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("MPA rating with id {} not found", id)))
    }

    pub async fn directors(&self) -> AppResult<Vec<Director>> {
        self.store.all_directors().await
    }

    pub async fn director(&self, id: DirectorId) -> AppResult<Director> {
        self.store
            .directors_by_ids(&[id])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Director with id {} not found", id)))
    }

    #[instrument(skip(self, payload))]
    pub async fn create_director(&self, payload: DirectorPayload) -> AppResult<Director> {
        let name = director_name(&payload)?;
        let director = self.store.insert_director(name).await?;

        tracing::info!(director_id = director.id, "Director created");

        Ok(director)
    }

    #[instrument(skip(self, payload), fields(director_id = ?payload.id))]
    pub async fn update_director(&self, payload: DirectorPayload) -> AppResult<Director> {
        let id = payload
            .id
            .ok_or_else(|| AppError::InvalidArgument("Director id is required".to_string()))?;
        let name = director_name(&payload)?;

        if !self.store.update_director(id, name).await? {
            return Err(AppError::NotFound(format!(
                "Director with id {} not found",
                id
            )));
        }

        Ok(Director {
            id,
            name: name.to_string(),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_director(&self, id: DirectorId) -> AppResult<()> {
        if !self.store.delete_director(id).await? {
            return Err(AppError::NotFound(format!(
                "Director with id {} not found",
                id
            )));
        }

        tracing::info!("Director deleted");

        Ok(())
    }
}

fn director_name(payload: &DirectorPayload) -> AppResult<&str> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidArgument(
            "Director name cannot be blank".to_string(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, MockQueryStore};

    fn reference() -> ReferenceData {
        ReferenceData::new(Arc::new(InMemoryStore::new()))
    }

    fn director(id: Option<DirectorId>, name: &str) -> DirectorPayload {
        DirectorPayload {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeded_lookups() {
        let reference = reference();

        assert_eq!(reference.genres().await.unwrap().len(), 6);
        assert_eq!(reference.genre(2).await.unwrap().name, "Drama");
        assert_eq!(reference.mpa_ratings().await.unwrap().len(), 5);
        assert_eq!(reference.mpa_rating(5).await.unwrap().name, "NC-17");
    }

    #[tokio::test]
    async fn test_unknown_reference_ids_not_found() {
        let reference = reference();

        assert!(matches!(reference.genre(100).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            reference.mpa_rating(0).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            reference.director(1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_director_lifecycle() {
        let reference = reference();

        let created = reference
            .create_director(director(None, "  Sofia Coppola "))
            .await
            .unwrap();
        assert_eq!(created.name, "Sofia Coppola");

        let renamed = reference
            .update_director(director(Some(created.id), "Francis Ford Coppola"))
            .await
            .unwrap();
        assert_eq!(reference.director(created.id).await.unwrap(), renamed);

        reference.delete_director(created.id).await.unwrap();
        assert!(reference.directors().await.unwrap().is_empty());
        assert!(matches!(
            reference.delete_director(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_director_name_rejected() {
        let reference = reference();

        let result = reference.create_director(director(None, "   ")).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_director_not_found() {
        let mut store = MockQueryStore::new();
        store.expect_update_director().returning(|_, _| Ok(false));
        let reference = ReferenceData::new(Arc::new(store));

        let result = reference.update_director(director(Some(8), "Nobody")).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
