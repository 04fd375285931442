use std::sync::Arc;

use filmgraph_api::{
    api::{create_router, AppState},
    config::{Config, StoreKind},
    db::{create_pool, run_migrations, InMemoryStore, PgStore, QueryStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("filmgraph_api=info,tower_http=info")
            }),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn QueryStore> = match config.store {
        StoreKind::Postgres => {
            let pool = create_pool(&config.database_url, config.max_connections).await?;
            run_migrations(&pool).await?;
            tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::info!("Using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let state = AppState::new(store, &config);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
