use std::collections::{HashMap, HashSet};

use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};

use crate::{
    db::QueryStore,
    error::AppResult,
    models::{
        Director, DirectorId, FilmId, FilmPayload, FilmRow, Genre, GenreId, MpaId, MpaRating,
        UserId,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const FILM_SELECT: &str = r#"
    SELECT f.id, f.name, f.description, f.release_date, f.duration,
           f.mpa_id, r.name AS mpa_name
    FROM film f
    JOIN mpa_rating r ON r.id = f.mpa_id
"#;

#[derive(sqlx::FromRow)]
struct FilmGenreRow {
    film_id: FilmId,
    id: GenreId,
    name: String,
}

#[derive(sqlx::FromRow)]
struct FilmDirectorRow {
    film_id: FilmId,
    id: DirectorId,
    name: String,
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    user_id: UserId,
    film_id: FilmId,
}

fn group_likes_by_user(rows: Vec<LikeRow>) -> HashMap<UserId, HashSet<FilmId>> {
    let mut result: HashMap<UserId, HashSet<FilmId>> = HashMap::new();
    for row in rows {
        result.entry(row.user_id).or_default().insert(row.film_id);
    }
    result
}

/// Delete-then-insert of a film's genre set on an open connection
async fn write_film_genres(
    conn: &mut PgConnection,
    film_id: FilmId,
    genre_ids: &[GenreId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM film_genre WHERE film_id = $1")
        .bind(film_id)
        .execute(&mut *conn)
        .await?;

    if !genre_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO film_genre (film_id, genre_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(film_id)
        .bind(genre_ids)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn write_film_directors(
    conn: &mut PgConnection,
    film_id: FilmId,
    director_ids: &[DirectorId],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM film_director WHERE film_id = $1")
        .bind(film_id)
        .execute(&mut *conn)
        .await?;

    if !director_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO film_director (film_id, director_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(film_id)
        .bind(director_ids)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// `QueryStore` backed by PostgreSQL
///
/// Batch lookups bind the id list as one array parameter (`= ANY($1)`), so a
/// request for any number of films is a single statement.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QueryStore for PgStore {
    async fn film_by_id(&self, id: FilmId) -> AppResult<Option<FilmRow>> {
        let row = sqlx::query_as::<_, FilmRow>(&format!("{FILM_SELECT} WHERE f.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn all_film_rows(&self) -> AppResult<Vec<FilmRow>> {
        let rows = sqlx::query_as::<_, FilmRow>(&format!("{FILM_SELECT} ORDER BY f.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn film_rows_by_ids(&self, ids: &[FilmId]) -> AppResult<Vec<FilmRow>> {
        let rows = sqlx::query_as::<_, FilmRow>(&format!("{FILM_SELECT} WHERE f.id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn save_film(
        &self,
        id: Option<FilmId>,
        film: &FilmPayload,
    ) -> AppResult<Option<FilmId>> {
        let mut tx = self.pool.begin().await?;

        let saved = match id {
            None => Some(
                sqlx::query_scalar::<_, FilmId>(
                    r#"
                    INSERT INTO film (name, description, release_date, duration, mpa_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&film.name)
                .bind(&film.description)
                .bind(film.release_date)
                .bind(film.duration)
                .bind(film.mpa.id)
                .fetch_one(&mut *tx)
                .await?,
            ),
            Some(id) => {
                sqlx::query_scalar::<_, FilmId>(
                    r#"
                    UPDATE film
                    SET name = $1, description = $2, release_date = $3, duration = $4, mpa_id = $5
                    WHERE id = $6
                    RETURNING id
                    "#,
                )
                .bind(&film.name)
                .bind(&film.description)
                .bind(film.release_date)
                .bind(film.duration)
                .bind(film.mpa.id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let Some(film_id) = saved else {
            tx.rollback().await?;
            return Ok(None);
        };

        write_film_genres(&mut tx, film_id, &film.genre_ids()).await?;
        write_film_directors(&mut tx, film_id, &film.director_ids()).await?;

        tx.commit().await?;
        Ok(Some(film_id))
    }

    async fn genres_for_films(&self, ids: &[FilmId]) -> AppResult<HashMap<FilmId, Vec<Genre>>> {
        let rows = sqlx::query_as::<_, FilmGenreRow>(
            r#"
            SELECT fg.film_id, g.id, g.name
            FROM film_genre fg
            JOIN genre g ON g.id = fg.genre_id
            WHERE fg.film_id = ANY($1)
            ORDER BY fg.film_id, g.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut result: HashMap<FilmId, Vec<Genre>> = HashMap::new();
        for row in rows {
            result.entry(row.film_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
            });
        }
        Ok(result)
    }

    async fn directors_for_films(
        &self,
        ids: &[FilmId],
    ) -> AppResult<HashMap<FilmId, Vec<Director>>> {
        let rows = sqlx::query_as::<_, FilmDirectorRow>(
            r#"
            SELECT fd.film_id, d.id, d.name
            FROM film_director fd
            JOIN director d ON d.id = fd.director_id
            WHERE fd.film_id = ANY($1)
            ORDER BY fd.film_id, d.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut result: HashMap<FilmId, Vec<Director>> = HashMap::new();
        for row in rows {
            result.entry(row.film_id).or_default().push(Director {
                id: row.id,
                name: row.name,
            });
        }
        Ok(result)
    }

    async fn film_ids_with_genre(&self, genre_id: GenreId) -> AppResult<HashSet<FilmId>> {
        let ids = sqlx::query_scalar::<_, FilmId>(
            "SELECT film_id FROM film_genre WHERE genre_id = $1",
        )
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn film_ids_with_director(
        &self,
        director_id: DirectorId,
    ) -> AppResult<HashSet<FilmId>> {
        let ids = sqlx::query_scalar::<_, FilmId>(
            "SELECT film_id FROM film_director WHERE director_id = $1",
        )
        .bind(director_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn replace_film_genres(&self, film_id: FilmId, genre_ids: &[GenreId]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        write_film_genres(&mut tx, film_id, genre_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_film_directors(
        &self,
        film_id: FilmId,
        director_ids: &[DirectorId],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        write_film_directors(&mut tx, film_id, director_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn likes_for_user(&self, user_id: UserId) -> AppResult<HashSet<FilmId>> {
        let ids = sqlx::query_scalar::<_, FilmId>("SELECT film_id FROM film_like WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn likes_for_users(
        &self,
        user_ids: &[UserId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>> {
        let rows = sqlx::query_as::<_, LikeRow>(
            "SELECT user_id, film_id FROM film_like WHERE user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(group_likes_by_user(rows))
    }

    async fn users_liking_films(
        &self,
        film_ids: &[FilmId],
    ) -> AppResult<HashMap<UserId, HashSet<FilmId>>> {
        let rows = sqlx::query_as::<_, LikeRow>(
            "SELECT user_id, film_id FROM film_like WHERE film_id = ANY($1)",
        )
        .bind(film_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(group_likes_by_user(rows))
    }

    async fn like_counts(&self, film_ids: &[FilmId]) -> AppResult<HashMap<FilmId, u64>> {
        let rows = sqlx::query_as::<_, (FilmId, i64)>(
            r#"
            SELECT film_id, COUNT(user_id)
            FROM film_like
            WHERE film_id = ANY($1)
            GROUP BY film_id
            "#,
        )
        .bind(film_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(film_id, count)| (film_id, count.max(0) as u64))
            .collect())
    }

    async fn add_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO film_like (film_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(film_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_like(&self, film_id: FilmId, user_id: UserId) -> AppResult<()> {
        sqlx::query("DELETE FROM film_like WHERE film_id = $1 AND user_id = $2")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genre ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn genres_by_ids(&self, ids: &[GenreId]) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genre WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn all_mpa_ratings(&self) -> AppResult<Vec<MpaRating>> {
        let ratings = sqlx::query_as::<_, MpaRating>("SELECT id, name FROM mpa_rating ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ratings)
    }

    async fn mpa_rating_by_id(&self, id: MpaId) -> AppResult<Option<MpaRating>> {
        let rating = sqlx::query_as::<_, MpaRating>("SELECT id, name FROM mpa_rating WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rating)
    }

    async fn all_directors(&self) -> AppResult<Vec<Director>> {
        let directors = sqlx::query_as::<_, Director>("SELECT id, name FROM director ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(directors)
    }

    async fn directors_by_ids(&self, ids: &[DirectorId]) -> AppResult<Vec<Director>> {
        let directors = sqlx::query_as::<_, Director>(
            "SELECT id, name FROM director WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(directors)
    }

    async fn insert_director(&self, name: &str) -> AppResult<Director> {
        let director = sqlx::query_as::<_, Director>(
            "INSERT INTO director (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(director)
    }

    async fn update_director(&self, id: DirectorId, name: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE director SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_director(&self, id: DirectorId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM director WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_likes_by_user() {
        let rows = vec![
            LikeRow { user_id: 1, film_id: 10 },
            LikeRow { user_id: 2, film_id: 10 },
            LikeRow { user_id: 1, film_id: 11 },
        ];

        let grouped = group_likes_by_user(rows);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1], HashSet::from([10, 11]));
        assert_eq!(grouped[&2], HashSet::from([10]));
    }

    #[test]
    fn test_group_likes_by_user_empty() {
        assert!(group_likes_by_user(Vec::new()).is_empty());
    }
}
