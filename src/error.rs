// src/error.rs
//! Error types for the store and the refresh pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures reaching or reading the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("pool setup failed: {0}")]
    Pool(String),

    #[error("connection checkout failed: {0}")]
    Checkout(#[from] deadpool_postgres::PoolError),

    #[error("query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("invalid table name: {0:?}")]
    InvalidTable(String),
}

/// Everything that can fail a single dashboard refresh.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("row {id}: unparseable created_at {raw:?}")]
    Timestamp { id: i64, raw: String },

    #[error("unknown filter {0:?} (expected ALL or AI)")]
    InvalidSelector(String),

    #[error("word cloud rendering failed: {0}")]
    WordCloud(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::InvalidSelector(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
