// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod series;
pub mod store;
pub mod story;
pub mod wordcloud;

use std::sync::Arc;

use axum::Router;
use tracing::info;

pub use crate::api::router;
pub use crate::config::DashboardConfig;
pub use crate::error::{DashboardError, StoreError};
pub use crate::pipeline::{DashboardPipeline, DashboardView};
pub use crate::series::Selector;

use crate::metrics::Metrics;
use crate::store::PgStoryStore;
use crate::wordcloud::WordCloudRenderer;

/// Build the full router from configuration: Postgres store, optional word
/// cloud, metrics and static UI. No database connection is opened here.
pub fn app(cfg: &DashboardConfig) -> anyhow::Result<Router> {
    let store = PgStoryStore::new(&cfg.database)?;
    let mut pipeline = DashboardPipeline::new(Arc::new(store));
    if cfg.wordcloud.enabled {
        pipeline = pipeline.with_wordcloud(WordCloudRenderer::new(&cfg.wordcloud)?);
    }

    info!(
        table = %cfg.database.table,
        wordcloud = pipeline.wordcloud_enabled(),
        "dashboard pipeline ready"
    );

    let state = api::AppState::new(pipeline)
        .with_ui_dir(cfg.ui_dir.clone())
        .with_metrics(Metrics::init()?);
    Ok(api::router(state))
}
