use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// JWT signing secret (HMAC-SHA-256).
    pub secret_key: String,
    /// Access token lifetime in minutes. Default: 60.
    pub token_ttl_minutes: i64,
    /// Root directory under which per-brand dataset files live.
    /// This is the single source of truth for dataset discovery — there is
    /// no fallback path probing at runtime.
    pub data_dir: PathBuf,
    /// Comma-separated list of allowed CORS origins.
    pub allowed_origins: Vec<String>,
    /// Create the demo operator at startup if it does not exist.
    pub seed_demo_user: bool,
    /// Decimal places for single-brand summary figures.
    pub summary_precision: u32,
    /// Decimal places for cross-brand ranking figures.
    pub ranking_precision: u32,
}

const PLACEHOLDER_SECRET: &str = "dev-secret-key-change-this";

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let secret_key =
        std::env::var("FLEETGATE_SECRET_KEY").unwrap_or_else(|_| PLACEHOLDER_SECRET.into());

    if secret_key == PLACEHOLDER_SECRET {
        let env_mode = std::env::var("FLEETGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "FLEETGATE_SECRET_KEY is still the insecure placeholder. \
                 Set a proper signing secret before running in production."
            );
        }
        tracing::warn!(
            "FLEETGATE_SECRET_KEY is not set — using insecure placeholder. \
             Set a real signing secret for production."
        );
    }

    Ok(Config {
        port: std::env::var("FLEETGATE_PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .unwrap_or(8000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://users.db?mode=rwc".into()),
        secret_key,
        token_ttl_minutes: std::env::var("FLEETGATE_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
        data_dir: std::env::var("FLEETGATE_DATA_DIR")
            .unwrap_or_else(|_| "data/processed".into())
            .into(),
        allowed_origins: std::env::var("FLEETGATE_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        seed_demo_user: std::env::var("FLEETGATE_SEED_DEMO_USER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true),
        summary_precision: std::env::var("FLEETGATE_SUMMARY_PRECISION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
        ranking_precision: std::env::var("FLEETGATE_RANKING_PRECISION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2),
    })
}
