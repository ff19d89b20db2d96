use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use filmshare_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgStore},
    routes::{create_router, AppState},
    services::catalog::{GenreCache, TmdbCatalog},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filmshare_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let genres = Arc::new(GenreCache::new(config.genre_cache_ttl()));
    let catalog = Arc::new(TmdbCatalog::new(
        cache,
        genres,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.movie_cache_ttl_secs,
    ));
    let store = Arc::new(PgStore::new(pool));

    let state = Arc::new(AppState::new(store, catalog, config.catalog_timeout()));
    let app = create_router(state).layer(CorsLayer::permissive());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
