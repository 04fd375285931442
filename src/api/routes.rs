use axum::{
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Films
        .route(
            "/films",
            get(handlers::get_films)
                .post(handlers::create_film)
                .put(handlers::update_film),
        )
        .route("/films/popular", get(handlers::popular_films))
        .route("/films/common", get(handlers::common_films))
        .route("/films/search", get(handlers::search_films))
        .route("/films/director/:director_id", get(handlers::director_films))
        .route("/films/:id", get(handlers::get_film))
        .route(
            "/films/:id/like/:user_id",
            put(handlers::add_like).delete(handlers::remove_like),
        )
        // Users
        .route(
            "/users/:user_id/recommendations",
            get(handlers::recommendations),
        )
        // Reference data
        .route("/genres", get(handlers::get_genres))
        .route("/genres/:id", get(handlers::get_genre))
        .route("/mpa", get(handlers::get_mpa_ratings))
        .route("/mpa/:id", get(handlers::get_mpa_rating))
        .route(
            "/directors",
            get(handlers::get_directors)
                .post(handlers::create_director)
                .put(handlers::update_director),
        )
        .route(
            "/directors/:id",
            get(handlers::get_director).delete(handlers::delete_director),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
