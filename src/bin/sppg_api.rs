//! SPPG Dashboard API Server
//!
//! REST backend for the SPPG operations dashboard (finance, inventory,
//! nutrition) on top of Supabase.
//!
//! Usage:
//!   cargo run --bin sppg_api
//!
//! Environment:
//!   SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY - Supabase project (required)
//!   PORT / SPPG_PORT - Server port (default: 3001)
//!   SPPG_HOST        - Server host (default: 0.0.0.0)
//!   SPPG_STORE       - `memory` runs without Supabase (demo data is lost on exit)
//!   RUST_LOG         - Log level (default: info)

use sppg_dashboard::api::{create_router, start_cleanup_task, AppState};
use sppg_dashboard::utils::constants::{APP_NAME, APP_VERSION};
use sppg_dashboard::{db, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::from_env().map_err(|e| {
        error!(code = e.code_str(), "❌ {}", e.message);
        eyre::eyre!(e)
    })?;

    let database = db::connect(&config)?;
    info!(backend = database.backend_name(), "🗄️ Storage ready");

    let state = Arc::new(AppState::new(database, &config)?);

    let cleanup = start_cleanup_task(state.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;

    info!("🚀 {} v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /health                          - Health check");
    info!("  *    /api/finance/...                 - RAB, belanja, payroll, laporan, dashboard");
    info!("  GET  /api/inventory/summary           - Ringkasan stok");
    info!("  GET  /api/nutrition/search?q=         - Cari produk (OpenFoodFacts)");
    info!("  GET  /api/nutrition/foods/:id/label   - Label gizi TKPI");
    info!("  *    /api/:table[/:id]                - CRUD tabel generik");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received, cleaning up...");
    cleanup.abort();
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║        S P P G   D A S H B O A R D           ║
    ║     Keuangan · Stok · Gizi  (API v{:<8})  ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#,
        APP_VERSION
    );
}
