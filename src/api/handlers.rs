use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{
        Director, DirectorId, DirectorPayload, Film, FilmId, FilmPayload, Genre, GenreId, MpaId,
        MpaRating, SearchScope, SortOrder, UserId,
    },
};

use super::AppState;

// Query parameters

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularQuery {
    pub count: Option<i64>,
    pub genre_id: Option<GenreId>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonQuery {
    pub user_id: UserId,
    pub friend_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorFilmsQuery {
    pub sort_by: Option<String>,
}

// Handlers

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn get_films(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.catalog.all_films().await?))
}

pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<FilmId>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.film(id).await?))
}

pub async fn create_film(
    State(state): State<AppState>,
    Json(payload): Json<FilmPayload>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let film = state.catalog.create_film(payload).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn update_film(
    State(state): State<AppState>,
    Json(payload): Json<FilmPayload>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.catalog.update_film(payload).await?))
}

pub async fn add_like(
    State(state): State<AppState>,
    Path((film_id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    state.catalog.add_like(film_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path((film_id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    state.catalog.remove_like(film_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn popular_films(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let count = params.count.unwrap_or(state.popular_default_count);
    let films = state
        .popularity
        .rank(count, params.genre_id, params.year)
        .await?;
    Ok(Json(films))
}

pub async fn common_films(
    State(state): State<AppState>,
    Query(params): Query<CommonQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state
        .common_films
        .common_films(params.user_id, params.friend_id)
        .await?;
    Ok(Json(films))
}

pub async fn search_films(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let scope = SearchScope::parse(params.by.as_deref());
    Ok(Json(state.search.search(&params.query, scope).await?))
}

pub async fn director_films(
    State(state): State<AppState>,
    Path(director_id): Path<DirectorId>,
    Query(params): Query<DirectorFilmsQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let order = SortOrder::parse(params.sort_by.as_deref());
    let films = state
        .director_films
        .films_by_director(director_id, order)
        .await?;
    Ok(Json(films))
}

pub async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.recommendations.recommend(user_id).await?))
}

pub async fn get_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.reference.genres().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<GenreId>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.reference.genre(id).await?))
}

pub async fn get_mpa_ratings(State(state): State<AppState>) -> AppResult<Json<Vec<MpaRating>>> {
    Ok(Json(state.reference.mpa_ratings().await?))
}

pub async fn get_mpa_rating(
    State(state): State<AppState>,
    Path(id): Path<MpaId>,
) -> AppResult<Json<MpaRating>> {
    Ok(Json(state.reference.mpa_rating(id).await?))
}

pub async fn get_directors(State(state): State<AppState>) -> AppResult<Json<Vec<Director>>> {
    Ok(Json(state.reference.directors().await?))
}

pub async fn get_director(
    State(state): State<AppState>,
    Path(id): Path<DirectorId>,
) -> AppResult<Json<Director>> {
    Ok(Json(state.reference.director(id).await?))
}

pub async fn create_director(
    State(state): State<AppState>,
    Json(payload): Json<DirectorPayload>,
) -> AppResult<(StatusCode, Json<Director>)> {
    let director = state.reference.create_director(payload).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

pub async fn update_director(
    State(state): State<AppState>,
    Json(payload): Json<DirectorPayload>,
) -> AppResult<Json<Director>> {
    Ok(Json(state.reference.update_director(payload).await?))
}

pub async fn delete_director(
    State(state): State<AppState>,
    Path(id): Path<DirectorId>,
) -> AppResult<StatusCode> {
    state.reference.delete_director(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
