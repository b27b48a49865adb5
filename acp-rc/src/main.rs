//! acp-rc - Recovery Controller service
//!
//! Self-healing controller for the article production pipeline: receives
//! failure reports from phase workers, job runners and the promotion step,
//! decides whether and how to resurrect failed items, and runs the bounded
//! targeted sweep on behalf of the external scheduler.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use acp_common::config::{ServiceConfig, DATABASE_FILE};
use acp_rc::{build_router, AppState, RecoveryEngine};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5741";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting acp-rc (Recovery Controller) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::load();

    // CLI argument outranks ACP_ROOT_FOLDER, which outranks the TOML file
    let cli_root = std::env::args().nth(1);
    let root_folder = acp_common::config::resolve_root_folder(cli_root.as_deref());
    let db_path = root_folder.join(DATABASE_FILE);
    info!("Database: {}", db_path.display());

    let db_pool = acp_rc::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let engine = RecoveryEngine::new(
        db_pool.clone(),
        config.recovery.clone(),
        config.jobs.clone(),
    );

    let state = AppState::new(db_pool, engine);
    let app = build_router(state);

    let bind_address = config
        .bind_address
        .as_deref()
        .unwrap_or(DEFAULT_BIND_ADDRESS);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
