//! HTTP surface of the monitoring backend.
//!
//! Stateless request-scoped handlers: each invocation reads or writes rows
//! through the injected [`RowStore`], performs a pure transformation and
//! returns. Every route carries permissive CORS so browser dashboards and
//! pushing applications can call it cross-origin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::alerts::{compile_rules, AlertRule};
use crate::error::{Error, Result};
use crate::exposition::parse_text;
use crate::extract::extract;
use crate::model::Metric;
use crate::scrape::{self, ScrapeConfig};
use crate::store::RowStore;

/// Default number of samples returned by the metrics read endpoint,
/// matching one hour of points at the dashboard's refresh cadence.
const DEFAULT_METRICS_LIMIT: i64 = 60;
const MAX_METRICS_LIMIT: i64 = 1000;

/// Shared handler state: the injected store handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/collect-metrics", post(collect_metrics))
        .route("/alert-rules", get(alert_rules))
        .route("/scrape-config", get(scrape_config))
        .route("/applications/{id}/metrics", get(application_metrics))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = router(state);

    info!("Starting monitoring backend on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct CollectMetricsRequest {
    #[serde(default)]
    application_id: Option<String>,
    #[serde(default)]
    metrics_text: Option<String>,
}

/// `POST /collect-metrics` — ingest one metrics push.
///
/// Parses the exposition text, extracts the tracked fields and appends one
/// sample row stamped with the current time. Resubmitting the same payload
/// appends another row; there is no deduplication. The application id is not
/// checked for existence here; an unknown id fails the insert at the store.
async fn collect_metrics(
    State(state): State<AppState>,
    Json(request): Json<CollectMetricsRequest>,
) -> Result<Json<Value>> {
    let (application_id, metrics_text) =
        match (request.application_id, request.metrics_text) {
            (Some(id), Some(text)) if !id.is_empty() && !text.is_empty() => (id, text),
            _ => {
                return Err(Error::Validation("Missing required fields".to_string()));
            }
        };

    let samples = parse_text(&metrics_text)?;
    let sample = extract(&samples);

    state
        .store
        .insert_metric(&application_id, Utc::now(), &sample)
        .await
        .map_err(|e| {
            error!("Failed to store metrics for {}: {}", application_id, e);
            e
        })?;

    info!(
        "Stored metrics sample for application {} ({} parsed samples)",
        application_id,
        samples.len()
    );

    Ok(Json(json!({ "success": true })))
}

/// `GET /alert-rules` — compile alerting rules from enabled configurations.
async fn alert_rules(State(state): State<AppState>) -> Result<Json<Vec<AlertRule>>> {
    let rows = state.store.enabled_alert_configs().await?;
    Ok(Json(compile_rules(&rows)))
}

/// `GET /scrape-config` — scrape configuration for all active applications.
async fn scrape_config(State(state): State<AppState>) -> Result<Json<ScrapeConfig>> {
    let apps = state.store.active_applications().await?;
    Ok(Json(scrape::generate(&apps)?))
}

#[derive(Debug, Deserialize)]
struct MetricsQuery {
    limit: Option<i64>,
}

/// `GET /applications/{id}/metrics` — recent samples, newest first.
async fn application_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Vec<Metric>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_METRICS_LIMIT)
        .clamp(1, MAX_METRICS_LIMIT);
    let metrics = state.store.recent_metrics(&id, limit).await?;
    Ok(Json(metrics))
}

async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
