use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::{
    db::QueryStore,
    error::AppResult,
    models::{
        Director, DirectorId, FilmId, FilmPayload, FilmRow, Genre, GenreId, MpaId, MpaRating,
        UserId,
    },
};

/// Rating and genre tables every fresh catalog starts with
pub const SEED_MPA_RATINGS: [(MpaId, &str); 5] =
    [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

pub const SEED_GENRES: [(GenreId, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Animation"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

#[derive(Debug, Clone)]
struct StoredFilm {
    name: String,
    description: String,
    release_date: NaiveDate,
    duration: i32,
    mpa_id: MpaId,
}

#[derive(Debug, Default)]
struct Tables {
    films: BTreeMap<FilmId, StoredFilm>,
    mpa_ratings: BTreeMap<MpaId, String>,
    genres: BTreeMap<GenreId, String>,
    directors: BTreeMap<DirectorId, String>,
    film_genres: HashMap<FilmId, BTreeSet<GenreId>>,
    film_directors: HashMap<FilmId, BTreeSet<DirectorId>>,
    film_likes: HashMap<FilmId, BTreeSet<UserId>>,
    next_film_id: FilmId,
    next_director_id: DirectorId,
}

impl Tables {
    fn row(&self, id: FilmId, film: &StoredFilm) -> FilmRow {
        FilmRow {
            id,
            name: film.name.clone(),
            description: film.description.clone(),
            release_date: film.release_date,
            duration: film.duration,
            mpa_id: film.mpa_id,
            mpa_name: self
                .mpa_ratings
                .get(&film.mpa_id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn set_genres(&mut self, film_id: FilmId, genre_ids: &[GenreId]) {
        let genres: BTreeSet<GenreId> = genre_ids.iter().copied().collect();
        if genres.is_empty() {
            self.film_genres.remove(&film_id);
        } else {
            self.film_genres.insert(film_id, genres);
        }
    }

    fn set_directors(&mut self, film_id: FilmId, director_ids: &[DirectorId]) {
        let directors: BTreeSet<DirectorId> = director_ids.iter().copied().collect();
        if directors.is_empty() {
            self.film_directors.remove(&film_id);
        } else {
            self.film_directors.insert(film_id, directors);
        }
    }

    fn stored(film: &FilmPayload) -> StoredFilm {
        StoredFilm {
            name: film.name.clone(),
            description: film.description.clone(),
            release_date: film.release_date,
            duration: film.duration,
            mpa_id: film.mpa.id,
        }
    }
}

/// `QueryStore` kept entirely in process memory
///
/// All tables sit behind one `RwLock`, so a replacement of a film's genre or
/// director set is observed atomically by readers.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a store seeded with the MPA rating and genre tables
    pub fn new() -> Self {
        let mut tables = Tables {
            next_film_id: 1,
            next_director_id: 1,
            ..Tables::default()
        };

        for (id, name) in SEED_MPA_RATINGS {
            tables.mpa_ratings.insert(id, name.to_string());
        }
        for (id, name) in SEED_GENRES {
            tables.genres.insert(id, name.to_string());
        }

        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait::async_trait]
impl QueryStore for InMemoryStore {
    async fn film_by_id(&self, id: FilmId) -> AppResult<Option<FilmRow>> {
        let tables = self.tables.read().await;
        Ok(tables.films.get(&id).map(|film| tables.row(id, film)))
    }

    async fn all_film_rows(&self) -> AppResult<Vec<FilmRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .films
            .iter()
            .map(|(id, film)| tables.row(*id, film))
            .collect())
    }

    async fn film_rows_by_ids(&self, ids: &[FilmId]) -> AppResult<Vec<FilmRow>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<FilmId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| tables.films.get(&id).map(|film| tables.row(id, film)))
            .collect())
    }

    async fn save_film(
        &self,
        id: Option<FilmId>,
        film: &FilmPayload,
    ) -> AppResult<Option<FilmId>> {
        let mut tables = self.tables.write().await;

        let film_id = match id {
            Some(id) if !tables.films.contains_key(&id) => return Ok(None),
            Some(id) => id,
            None => {
                let id = tables.next_film_id;
                tables.next_film_id += 1;
                id
            }
        };

        tables.films.insert(film_id, Tables::stored(film));
        tables.set_genres(film_id, &film.genre_ids());
        tables.set_directors(film_id, &film.director_ids());

        Ok(Some(film_id))
    }

    async fn genres_for_films(&self, ids: &[FilmId]) -> AppResult<HashMap<FilmId, Vec<Genre>>> {
        let tables = self.tables.read().await;
        let mut result = HashMap::new();

        for id in ids {
            let Some(genre_ids) = tables.film_genres.get(id) else {
                continue;
            };
            let genres: Vec<Genre> = genre_ids
                .iter()
                .filter_map(|genre_id| {
                    tables.genres.get(genre_id).map(|name| Genre {
                        id: *genre_id,
                        name: name.clone(),
                    })
                })
                .collect();
            if !genres.is_empty() {
                result.insert(*id, genres);
            }
        }

        Ok(result)
    }

    async fn directors_for_films(
        &self,
        ids: &[FilmId],
    ) -> AppResult<HashMap<FilmId, Vec<Director>>> {
        let tables = self.tables.read().await;
        let mut result = HashMap::new();

        for id in ids {
            let Some(director_ids) = tables.film_directors.get(id) else {
                continue;
            };
            let directors: Vec<Director> = director_ids
                .iter()
                .filter_map(|director_id| {
                    tables.directors.get(director_id).map(|name| Director {
                        id: *director_id,
                        name: name.clone(),
                    })
                })
                .collect();
            if !directors.is_empty() {
                result.insert(*id, directors);
            }
        }

        Ok(result)
    }

    async fn film_ids_with_genre(&self, genre_id: GenreId) -> AppResult<HashSet<FilmId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_genres
            .iter()
            .filter(|(_, genres)| genres.contains(&genre_id))
            .map(|(film_id, _)| *film_id)
            .collect())
    }

    async fn film_ids_with_director(
        &self,
        director_id: DirectorId,
    ) -> AppResult<HashSet<FilmId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_directors
            .iter()
            .filter(|(_, directors)| directors.contains(&director_id))
            .map(|(film_id, _)| *film_id)
            .collect())
    }

    async fn replace_film_genres(&self, film_id: FilmId, genre_ids: &[GenreId]) -> AppResult<()> {
        self.tables.write().await.set_genres(film_id, genre_ids);
        Ok(())
    }

    async fn replace_film_directors(
        &self,
        film_id: FilmId,
        director_ids: &[DirectorId],
    ) -> AppResult<()> {
        self.tables.write().await.set_directors(film_id, director_ids);
        Ok(())
    }

    async fn likes_for_user(&self, user_id: UserId) -> AppResult<HashSet<FilmId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .film_likes
            .iter()
            .filter(|(_, users)| users.contains(&user_id))
            .map(|(film_id, _)| *film_id)
            .collect())
    }

    async fn likes_for_users(
        &self,
        user_ids: &[UserId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>> {
        let tables = self.tables.read().await;
        let wanted: HashSet<UserId> = user_ids.iter().copied().collect();
        let mut result: HashMap<UserId, HashSet<FilmId>> = HashMap::new();

        for (film_id, users) in &tables.film_likes {
            for user_id in users.iter().filter(|u| wanted.contains(*u)) {
                result.entry(*user_id).or_default().insert(*film_id);
            }
        }

        Ok(result)
    }

    async fn users_liking_films(
        &self,
        film_ids: &[FilmId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>> {
        let tables = self.tables.read().await;
        let mut result: HashMap<UserId, HashSet<FilmId>> = HashMap::new();

        for film_id in film_ids {
            if let Some(users) = tables.film_likes.get(film_id) {
                for user_id in users {
                    result.entry(*user_id).or_default().insert(*film_id);
                }
            }
        }

        Ok(result)
    }

    async fn like_counts(&self, film_ids: &[FilmId]) -> AppResult<HashMap<FilmId, u64>> {
        let tables = self.tables.read().await;
        Ok(film_ids
            .iter()
            .filter_map(|id| {
                tables
                    .film_likes
                    .get(id)
                    .filter(|users| !users.is_empty())
                    .map(|users| (*id, users.len() as u64))
            })
            .collect())
    }

    async fn add_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.film_likes.entry(film_id).or_default().insert(user_id);
        Ok(())
    }

    async fn remove_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(users) = tables.film_likes.get_mut(&film_id) {
            users.remove(&user_id);
            if users.is_empty() {
                tables.film_likes.remove(&film_id);
            }
        }
        Ok(())
    }

    async fn all_genres(&self) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables
            .genres
            .iter()
            .map(|(id, name)| Genre {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<GenreId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| {
                tables.genres.get(&id).map(|name| Genre {
                    id,
                    name: name.clone(),
                })
            })
            .collect())
    }

    async fn all_mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        let tables = self.tables.read().await;
        Ok(tables
            .mpa_ratings
            .iter()
            .map(|(id, name)| MpaRating {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn mpa_rating_by_id(&self, id: MpaId) -> AppResult<Option<MpaRating>> {
        let tables = self.tables.read().await;
        Ok(tables.mpa_ratings.get(&id).map(|name| MpaRating {
            id,
            name: name.clone(),
        }))
    }

    async fn all_directors(&self) -> AppResult<Vec<Director>> {
        let tables = self.tables.read().await;
        Ok(tables
            .directors
            .iter()
            .map(|(id, name)| Director {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn directors_by_ids(&self, ids: &[DirectorId]) -> AppResult<Vec<Director>> {
        let tables = self.tables.read().await;
        let wanted: BTreeSet<DirectorId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| {
                tables.directors.get(&id).map(|name| Director {
                    id,
                    name: name.clone(),
                })
            })
            .collect())
    }

    async fn insert_director(&self, name: &str) -> AppResult<Director> {
        let mut tables = self.tables.write().await;
        let id = tables.next_director_id;
        tables.next_director_id += 1;
        tables.directors.insert(id, name.to_string());
        Ok(Director {
            id,
            name: name.to_string(),
        })
    }

    async fn update_director(&self, id: DirectorId, name: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.directors.get_mut(&id) {
            Some(stored) => {
                *stored = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_director(&self, id: DirectorId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.directors.remove(&id).is_none() {
            return Ok(false);
        }
        tables.film_directors.retain(|_, directors| {
            directors.remove(&id);
            !directors.is_empty()
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdRef;

    fn payload(name: &str) -> FilmPayload {
        FilmPayload {
            id: None,
            name: name.to_string(),
            description: String::new(),
            release_date: NaiveDate::from_ymd_opt(2001, 7, 20).unwrap(),
            duration: 125,
            mpa: IdRef { id: 2 },
            genres: vec![],
            directors: vec![],
        }
    }

    #[tokio::test]
    async fn test_seeded_reference_tables() {
        let store = InMemoryStore::new();
        assert_eq!(store.all_mpa_ratings().await.unwrap().len(), 5);
        assert_eq!(store.all_genres().await.unwrap().len(), 6);
        assert!(store.all_directors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let first = store.save_film(None, &payload("Spirited Away")).await.unwrap().unwrap();
        let second = store.save_film(None, &payload("Mulholland Drive")).await.unwrap().unwrap();
        assert_eq!((first, second), (1, 2));

        let row = store.film_by_id(first).await.unwrap().unwrap();
        assert_eq!(row.name, "Spirited Away");
        assert_eq!(row.mpa_name, "PG");
    }

    #[tokio::test]
    async fn test_save_film_writes_row_and_associations_together() {
        let store = InMemoryStore::new();
        let director = store.insert_director("Jean-Pierre Jeunet").await.unwrap();
        let mut film = payload("Amelie");
        film.genres = vec![IdRef { id: 2 }, IdRef { id: 1 }];
        film.directors = vec![IdRef { id: director.id }];

        let id = store.save_film(None, &film).await.unwrap().unwrap();

        film.name = "Delicatessen".to_string();
        film.genres = vec![IdRef { id: 6 }];
        film.directors = vec![];
        assert_eq!(store.save_film(Some(id), &film).await.unwrap(), Some(id));

        let row = store.film_by_id(id).await.unwrap().unwrap();
        let genres = store.genres_for_films(&[id]).await.unwrap();
        assert_eq!(row.name, "Delicatessen");
        assert_eq!(genres[&id], vec![Genre { id: 6, name: "Action".to_string() }]);
        assert!(store.directors_for_films(&[id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_unknown_film_writes_nothing() {
        let store = InMemoryStore::new();
        let mut film = payload("Ghost");
        film.genres = vec![IdRef { id: 1 }];

        assert_eq!(store.save_film(Some(9), &film).await.unwrap(), None);

        assert!(store.film_by_id(9).await.unwrap().is_none());
        assert!(store.genres_for_films(&[9]).await.unwrap().is_empty());
        assert!(store.film_ids_with_genre(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_genres_discards_previous_set() {
        let store = InMemoryStore::new();
        let id = store.save_film(None, &payload("Amelie")).await.unwrap().unwrap();

        store.replace_film_genres(id, &[1, 2]).await.unwrap();
        store.replace_film_genres(id, &[6]).await.unwrap();

        let genres = store.genres_for_films(&[id]).await.unwrap();
        assert_eq!(genres[&id], vec![Genre { id: 6, name: "Action".to_string() }]);
    }

    #[tokio::test]
    async fn test_replace_with_empty_set_clears() {
        let store = InMemoryStore::new();
        let id = store.save_film(None, &payload("Amelie")).await.unwrap().unwrap();

        store.replace_film_genres(id, &[1]).await.unwrap();
        store.replace_film_genres(id, &[]).await.unwrap();

        assert!(store.genres_for_films(&[id]).await.unwrap().is_empty());
        assert!(store.film_ids_with_genre(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_pair_is_unique() {
        let store = InMemoryStore::new();
        let id = store.save_film(None, &payload("Memento")).await.unwrap().unwrap();

        store.add_like(id, 7).await.unwrap();
        store.add_like(id, 7).await.unwrap();
        store.add_like(id, 8).await.unwrap();

        let counts = store.like_counts(&[id]).await.unwrap();
        assert_eq!(counts[&id], 2);

        store.remove_like(id, 7).await.unwrap();
        store.remove_like(id, 8).await.unwrap();
        assert!(store.like_counts(&[id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_users_liking_films_reports_overlap_subset() {
        let store = InMemoryStore::new();
        for name in ["A", "B", "C"] {
            store.save_film(None, &payload(name)).await.unwrap().unwrap();
        }
        store.add_like(1, 10).await.unwrap();
        store.add_like(2, 10).await.unwrap();
        store.add_like(3, 10).await.unwrap();
        store.add_like(2, 11).await.unwrap();

        let neighbors = store.users_liking_films(&[1, 2]).await.unwrap();
        assert_eq!(neighbors[&10], HashSet::from([1, 2]));
        assert_eq!(neighbors[&11], HashSet::from([2]));
    }

    #[tokio::test]
    async fn test_delete_director_drops_associations() {
        let store = InMemoryStore::new();
        let id = store.save_film(None, &payload("Heat")).await.unwrap().unwrap();
        let director = store.insert_director("Michael Mann").await.unwrap();
        store.replace_film_directors(id, &[director.id]).await.unwrap();

        assert!(store.delete_director(director.id).await.unwrap());
        assert!(store.directors_for_films(&[id]).await.unwrap().is_empty());
        assert!(!store.delete_director(director.id).await.unwrap());
    }
}
