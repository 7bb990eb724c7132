use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::error;

use crate::error::DashboardError;
use crate::metrics::Metrics;
use crate::pipeline::{DashboardPipeline, DashboardView};
use crate::series::Selector;

const INDEX_HTML: &str = include_str!("../ui/index.html");

#[derive(Clone)]
pub struct AppState {
    pub pipeline: DashboardPipeline,
    pub ui_dir: PathBuf,
    pub metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(pipeline: DashboardPipeline) -> Self {
        Self {
            pipeline,
            ui_dir: PathBuf::from("ui"),
            metrics: None,
        }
    }

    pub fn with_ui_dir(mut self, dir: PathBuf) -> Self {
        self.ui_dir = dir;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let mut app: Router<AppState> = Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/options", get(options))
        .route("/api/dashboard", get(dashboard))
        .nest_service("/static", ServeDir::new(&state.ui_dir));

    if let Some(m) = &state.metrics {
        app = app.merge(m.router::<AppState>());
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct OptionOut {
    label: &'static str,
    value: Selector,
}

async fn options() -> Json<Vec<OptionOut>> {
    Json(
        Selector::ALL_OPTIONS
            .iter()
            .map(|s| OptionOut {
                label: s.label(),
                value: *s,
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub id: &'static str,
}

/// Data-table columns, in display order.
pub const COLUMNS: [Column; 5] = [
    Column { name: "ID", id: "id" },
    Column { name: "Story ID", id: "story_id" },
    Column { name: "Title", id: "title" },
    Column { name: "Created At", id: "created_at" },
    Column { name: "Contains AI", id: "contains_ai" },
];

#[derive(Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    filter: Option<String>,
}

#[derive(Serialize)]
struct DashboardOut {
    #[serde(flatten)]
    view: DashboardView,
    columns: &'static [Column],
}

async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<DashboardOut>, DashboardError> {
    let selector = match q.filter.as_deref() {
        None | Some("") => Selector::default(),
        Some(raw) => raw.parse()?,
    };

    let view = state.pipeline.refresh(selector).await.map_err(|e| {
        error!(target: "dashboard", filter = %selector, error = %e, "refresh failed");
        e
    })?;

    Ok(Json(DashboardOut {
        view,
        columns: &COLUMNS,
    }))
}
