use std::sync::Arc;

use sqlx::PgPool;

use crate::{config::Config, db::Cache, services::providers::TextGenProvider};

/// Shared application state
///
/// Everything here is either a connection handle or immutable configuration;
/// request handlers hold no mutable in-process state.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: Cache,
    pub config: Arc<Config>,
    pub provider: Arc<dyn TextGenProvider>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        cache: Cache,
        config: Config,
        provider: Arc<dyn TextGenProvider>,
    ) -> Self {
        Self {
            pool,
            cache,
            config: Arc::new(config),
            provider,
        }
    }
}
