use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the
    /// refresh series. Later calls reuse the same handle.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE.get_or_try_init(|| -> anyhow::Result<PrometheusHandle> {
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe_counter!("dashboard_refresh_total", "Dashboard refreshes by filter.");
            describe_counter!(
                "dashboard_refresh_errors_total",
                "Refreshes that failed in fetch, parse or rendering."
            );
            describe_histogram!("dashboard_refresh_ms", "Refresh duration in milliseconds.");
            describe_gauge!(
                "dashboard_rows_returned",
                "Rows returned by the most recent successful refresh."
            );
            Ok(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
