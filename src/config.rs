//! Environment-sourced configuration
//!
//! Every value has a logged fallback so the service can start with no
//! environment at all; the delete secret warns loudly when defaulted.

use std::path::PathBuf;
use tracing::{info, warn};

/// Default delete-route secret for local development. Only used when
/// `CAFE_API_KEY` is unset.
const DEFAULT_API_KEY: &str = "TopSecretAPIKey";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_path: String,
    pub static_dir: PathBuf,
    pub api_key: String,
}

impl Config {
    pub fn load() -> Self {
        let bind_address = env_or("BIND_ADDRESS", "0.0.0.0:8000");
        let database_path = env_or("DATABASE_PATH", "./data/cafes.db");
        let static_dir = PathBuf::from(env_or("STATIC_DIR", "./static"));

        let api_key = std::env::var("CAFE_API_KEY").unwrap_or_else(|_| {
            warn!("CAFE_API_KEY not set, using default (insecure for production)");
            DEFAULT_API_KEY.to_string()
        });

        Self {
            bind_address,
            database_path,
            static_dir,
            api_key,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
