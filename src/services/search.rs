use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Film, SearchScope},
    services::{aggregator::FilmAggregator, popularity::sort_by_popularity},
};

/// Case-insensitive substring search over titles and director names
#[derive(Clone)]
pub struct CatalogSearch {
    aggregator: FilmAggregator,
}

impl CatalogSearch {
    pub fn new(aggregator: FilmAggregator) -> Self {
        Self { aggregator }
    }

    /// Every matching film, most liked first, with no limit applied
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, scope: SearchScope) -> AppResult<Vec<Film>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }

        let mut films: Vec<Film> = self
            .aggregator
            .all_films()
            .await?
            .into_iter()
            .filter(|film| film_matches(film, &needle, scope))
            .collect();

        sort_by_popularity(&mut films);

        tracing::info!(matched = films.len(), "Catalog search completed");

        Ok(films)
    }
}

fn film_matches(film: &Film, needle: &str, scope: SearchScope) -> bool {
    let by_title = scope.matches_title() && film.name.to_lowercase().contains(needle);
    let by_director = scope.matches_director()
        && film
            .directors
            .iter()
            .any(|director| director.name.to_lowercase().contains(needle));

    by_title || by_director
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, QueryStore};
    use crate::models::{FilmId, FilmPayload, IdRef};
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn catalog() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let nolan = store.insert_director("Christopher Nolan").await.unwrap();
        let gerwig = store.insert_director("Greta Gerwig").await.unwrap();

        let films = [
            ("Interstellar", nolan.id),
            ("Little Women", gerwig.id),
            ("Barbie", gerwig.id),
            ("The Dark Knight", nolan.id),
        ];
        for (name, director) in films {
            let payload = FilmPayload {
                id: None,
                name: name.to_string(),
                description: String::new(),
                release_date: NaiveDate::from_ymd_opt(2014, 11, 7).unwrap(),
                duration: 150,
                mpa: IdRef { id: 3 },
                genres: vec![],
                directors: vec![],
            };
            let id = store.save_film(None, &payload).await.unwrap().unwrap();
            store.replace_film_directors(id, &[director]).await.unwrap();
        }
        store.add_like(4, 1).await.unwrap();
        store
    }

    fn ids(films: &[Film]) -> Vec<FilmId> {
        films.iter().map(|f| f.id).collect()
    }

    #[tokio::test]
    async fn test_empty_term_rejected() {
        let search = CatalogSearch::new(FilmAggregator::new(catalog().await));

        let empty = search.search("", SearchScope::Title).await;
        let blank = search.search("   ", SearchScope::Both).await;

        assert!(matches!(empty, Err(AppError::InvalidArgument(_))));
        assert!(matches!(blank, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_title_match_is_case_insensitive() {
        let search = CatalogSearch::new(FilmAggregator::new(catalog().await));

        let films = search.search("BARB", SearchScope::Title).await.unwrap();

        assert_eq!(ids(&films), vec![3]);
    }

    #[tokio::test]
    async fn test_director_scope_ignores_titles() {
        let search = CatalogSearch::new(FilmAggregator::new(catalog().await));

        let by_director = search.search("nolan", SearchScope::Director).await.unwrap();
        let by_title = search.search("nolan", SearchScope::Title).await.unwrap();

        assert_eq!(ids(&by_director), vec![4, 1]);
        assert!(by_title.is_empty());
    }

    #[tokio::test]
    async fn test_both_scopes_union_in_popularity_order() {
        let search = CatalogSearch::new(FilmAggregator::new(catalog().await));

        let films = search.search("i", SearchScope::Both).await.unwrap();

        assert_eq!(ids(&films), vec![4, 1, 2, 3]);
    }
}
