use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinerec_api::{
    config::Config,
    db,
    routes::create_router,
    services::providers::DashScopeProvider,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let cache = db::Cache::new(redis_client);

    let provider = Arc::new(DashScopeProvider::new(
        config.ai_api_key.clone(),
        config.ai_api_url.clone(),
        config.ai_model.clone(),
        config.ai_timeout_secs,
    )?);

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, cache, config, provider);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
