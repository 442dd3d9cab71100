//! Cafe Directory API
//!
//! A small REST service over a single `cafe` table: list, random pick,
//! search by location, add via form, price update, and delete guarded by a
//! shared secret. Uses SQLite (embedded) so the whole service runs from one
//! binary plus a database file.

mod config;
mod error;
mod handlers;
mod models;
mod storage;

use anyhow::{Context, Result};
use axum::routing::{delete, get, get_service, patch};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting cafe-api v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = Config::load();
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let static_dir = config.static_dir.clone();
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    };

    let app = router(state.clone(), &static_dir);

    let addr: SocketAddr = state
        .config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// The two view routes serve static pages; everything else is JSON.
pub(crate) fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/all", get(handlers::cafes::all))
        .route("/random", get(handlers::cafes::random))
        .route("/search", get(handlers::cafes::search))
        .route(
            "/add",
            get_service(ServeFile::new(static_dir.join("add.html"))).post(handlers::cafes::add),
        )
        .route("/update-price/:cafe_id", patch(handlers::cafes::update_price))
        .route(
            "/report-closed/:cafe_id",
            delete(handlers::cafes::report_closed),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
