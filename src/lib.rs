//! Fleetgate — brand-isolated fleet analytics API for OEM vehicle data.
//!
//! Library crate so integration tests in `tests/` can build the router and
//! application state directly.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod dataset;
pub mod errors;

use analytics::AggregationEngine;
use auth::credentials::CredentialStore;
use auth::token::TokenService;
use dataset::CsvStore;

/// Shared application state passed to handlers and middleware.
/// Constructed once at process start — no process-wide mutable singletons.
pub struct AppState {
    pub config: config::Config,
    pub creds: CredentialStore,
    pub tokens: TokenService,
    pub datasets: CsvStore,
    pub engine: AggregationEngine<CsvStore>,
}

impl AppState {
    /// Connect the credential store, run migrations and wire the dataset
    /// store and aggregation engine off the configured dataset root.
    pub async fn new(config: config::Config) -> anyhow::Result<Self> {
        let creds = CredentialStore::connect(&config.database_url).await?;
        creds.migrate().await?;

        let tokens = TokenService::new(&config.secret_key, config.token_ttl_minutes);
        let datasets = CsvStore::new(config.data_dir.clone());
        let engine = AggregationEngine::new(datasets.clone());

        Ok(Self {
            config,
            creds,
            tokens,
            datasets,
            engine,
        })
    }
}
