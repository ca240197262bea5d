use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod forecast;
mod gateway;
mod routes;

use cache::{ForecastStore, MemoryStore, RedisStore};
use config::{CacheBackend, Config};
use forecast::visualcrossing::VisualCrossingClient;
use gateway::ForecastGateway;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The .env file is mandatory; remember the outcome until logging is up
    let dotenv_result = dotenv::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_gateway_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv_result {
        tracing::error!("Error loading .env file: {}", e);
        return Err(anyhow::anyhow!("Error loading .env file: {e}"));
    }

    let config = Config::from_env()?;

    let store: Arc<dyn ForecastStore> = match config.cache_backend {
        CacheBackend::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
        CacheBackend::Memory => {
            tracing::info!("Using in-memory forecast cache");
            Arc::new(MemoryStore::new(config.memory_cache_capacity))
        }
    };

    let weather_client = Arc::new(VisualCrossingClient::new(&config)?);

    let gateway = Arc::new(ForecastGateway::new(
        weather_client,
        store,
        config.cache_ttl(),
        config.default_location.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        gateway,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server starting on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
