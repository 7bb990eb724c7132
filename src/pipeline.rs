// src/pipeline.rs
//! Dashboard refresh: fetch → classify → filter → aggregate → (word cloud).
//!
//! Every call recomputes from a full fetch. Nothing is cached between calls.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::DashboardError;
use crate::series::{daily_counts, filter_records, DailyCount, Selector};
use crate::store::StoryStore;
use crate::story::StoryRecord;
use crate::wordcloud::WordCloudRenderer;

/// Line-chart payload in the shape the dashboard page plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub data: Vec<ChartTrace>,
    pub layout: ChartLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTrace {
    pub x: Vec<String>,
    pub y: Vec<u64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub line: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: &'static str,
    pub xaxis: AxisTitle,
    pub yaxis: AxisTitle,
    pub plot_bgcolor: &'static str,
    pub paper_bgcolor: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub title: &'static str,
}

impl ChartPayload {
    pub fn from_series(series: &[DailyCount]) -> Self {
        Self {
            data: vec![ChartTrace {
                x: series.iter().map(|c| c.date.to_string()).collect(),
                y: series.iter().map(|c| c.count).collect(),
                kind: "line",
                name: "Submissions",
                line: LineStyle { color: "blue" },
            }],
            layout: ChartLayout {
                title: "Total Submissions Over Time",
                xaxis: AxisTitle { title: "Date" },
                yaxis: AxisTitle { title: "Count" },
                plot_bgcolor: "rgb(230, 230, 230)",
                paper_bgcolor: "rgb(248, 248, 248)",
            },
        }
    }
}

/// Everything one refresh hands back to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filter: Selector,
    pub series: Vec<DailyCount>,
    pub chart: ChartPayload,
    /// `data:image/png;base64,...`, absent when word clouds are disabled.
    pub wordcloud: Option<String>,
    pub rows: Vec<StoryRecord>,
}

#[derive(Clone)]
pub struct DashboardPipeline {
    store: Arc<dyn StoryStore>,
    wordcloud: Option<Arc<WordCloudRenderer>>,
}

impl DashboardPipeline {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self {
            store,
            wordcloud: None,
        }
    }

    pub fn with_wordcloud(mut self, renderer: WordCloudRenderer) -> Self {
        self.wordcloud = Some(Arc::new(renderer));
        self
    }

    pub fn wordcloud_enabled(&self) -> bool {
        self.wordcloud.is_some()
    }

    pub async fn refresh(&self, selector: Selector) -> Result<DashboardView, DashboardError> {
        let started = Instant::now();
        counter!("dashboard_refresh_total", "filter" => selector.as_str()).increment(1);

        let result = self.run(selector).await;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("dashboard_refresh_ms").record(elapsed_ms);
        match &result {
            Ok(view) => {
                gauge!("dashboard_rows_returned").set(view.rows.len() as f64);
                info!(
                    target: "dashboard",
                    filter = %selector,
                    store = self.store.name(),
                    rows = view.rows.len(),
                    days = view.series.len(),
                    elapsed_ms,
                    "refresh done"
                );
            }
            Err(_) => counter!("dashboard_refresh_errors_total").increment(1),
        }
        result
    }

    async fn run(&self, selector: Selector) -> Result<DashboardView, DashboardError> {
        let raw = self.store.fetch_all().await?;
        let records = raw
            .into_iter()
            .map(StoryRecord::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let rows = filter_records(records, selector);
        let series = daily_counts(&rows);
        let chart = ChartPayload::from_series(&series);

        let wordcloud = match &self.wordcloud {
            Some(renderer) => Some(render_titles(Arc::clone(renderer), &rows).await?),
            None => None,
        };

        Ok(DashboardView {
            filter: selector,
            series,
            chart,
            wordcloud,
            rows,
        })
    }
}

async fn render_titles(
    renderer: Arc<WordCloudRenderer>,
    rows: &[StoryRecord],
) -> Result<String, DashboardError> {
    let text = rows
        .iter()
        .filter_map(|r| r.title.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(target: "dashboard", text_len = text.len(), "rendering word cloud");

    tokio::task::spawn_blocking(move || renderer.render_data_uri(&text))
        .await
        .map_err(|e| DashboardError::WordCloud(format!("render task failed: {e}")))?
}
