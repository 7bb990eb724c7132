//! Hacker News Stories Dashboard — Binary Entrypoint
//! Loads configuration, boots the Axum HTTP server and serves the dashboard.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hn_stories_dashboard::{app, DashboardConfig};

/// Compact logs by default; `DASHBOARD_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hn_stories_dashboard=info,tower_http=warn"));

    let json = std::env::var("DASHBOARD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DashboardConfig::load_default().context("loading dashboard config")?;
    let router = app(&cfg)?;

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    info!(addr = %cfg.bind, "Hacker News Stories Visualization listening");

    axum::serve(listener, router).await?;
    Ok(())
}
