//! Row store access.
//!
//! The external store is reached through the [`RowStore`] trait so the HTTP
//! layer receives an explicitly injected handle instead of an ambient
//! singleton. [`PgStore`] is the production implementation over PostgreSQL.
//!
//! Application identifiers are bound with a `::uuid` cast: a malformed or
//! unknown identifier fails at the storage layer (foreign-key constraint),
//! which is the documented ingestion contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::extract::MetricSample;
use crate::model::{
    AlertChannel, AlertConfig, AlertConfigRow, Application, AppStatus, Metric,
};

/// Operations the monitoring core needs from the external row store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append one metrics sample row. Not idempotent; every call appends.
    async fn insert_metric(
        &self,
        application_id: &str,
        timestamp: DateTime<Utc>,
        sample: &MetricSample,
    ) -> Result<()>;

    /// All enabled alert configurations, each joined with its owning
    /// application's name. A stored row whose channel payload does not match
    /// its declared channel type is incomplete and therefore not active: it
    /// is excluded from the result, not an error for the whole set.
    async fn enabled_alert_configs(&self) -> Result<Vec<AlertConfigRow>>;

    /// All applications with status `active`.
    async fn active_applications(&self) -> Result<Vec<Application>>;

    /// The most recent samples for one application, newest first.
    async fn recent_metrics(&self, application_id: &str, limit: i64) -> Result<Vec<Metric>>;
}

/// PostgreSQL-backed row store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RowStore for PgStore {
    async fn insert_metric(
        &self,
        application_id: &str,
        timestamp: DateTime<Utc>,
        sample: &MetricSample,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO metrics
                (application_id, timestamp, cpu_usage, memory_usage, network_rx, network_tx)
            VALUES ($1::uuid, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(application_id)
        .bind(timestamp)
        .bind(sample.cpu_usage)
        .bind(sample.memory_usage)
        .bind(sample.network_rx)
        .bind(sample.network_tx)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn enabled_alert_configs(&self) -> Result<Vec<AlertConfigRow>> {
        let rows = sqlx::query(
            r#"
            SELECT ac.id, ac.application_id, ac.type, ac.threshold_value,
                   ac.channel_type, ac.channel_config, ac.enabled,
                   ac.created_at, ac.updated_at,
                   a.name AS application_name
            FROM alert_configs ac
            JOIN applications a ON a.id = ac.application_id
            WHERE ac.enabled = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let raw: Vec<RawAlertRow> = rows
            .iter()
            .map(raw_alert_row)
            .collect::<Result<_>>()?;
        Ok(validate_alert_rows(raw))
    }

    async fn active_applications(&self) -> Result<Vec<Application>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, description, metrics_endpoint, status,
                   created_at, updated_at
            FROM applications
            WHERE status = 'active'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(application_from_row).collect()
    }

    async fn recent_metrics(&self, application_id: &str, limit: i64) -> Result<Vec<Metric>> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, timestamp, cpu_usage, memory_usage,
                   network_rx, network_tx
            FROM metrics
            WHERE application_id = $1::uuid
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(application_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(metric_from_row).collect()
    }
}

/// An alert_configs row as stored, before channel validation.
struct RawAlertRow {
    id: Uuid,
    application_id: Uuid,
    alert_type: String,
    threshold_value: f64,
    channel_type: String,
    channel_config: Value,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    application_name: String,
}

/// Validate the channel of each stored row. Rows with a mismatched or
/// incomplete channel payload are skipped with a warning so one bad row
/// cannot fail rule compilation for every other configuration.
fn validate_alert_rows(rows: Vec<RawAlertRow>) -> Vec<AlertConfigRow> {
    rows.into_iter()
        .filter_map(|raw| {
            match AlertChannel::from_parts(&raw.channel_type, &raw.channel_config) {
                Ok(channel) => Some(AlertConfigRow {
                    config: AlertConfig {
                        id: raw.id,
                        application_id: raw.application_id,
                        alert_type: raw.alert_type.into(),
                        threshold_value: raw.threshold_value,
                        channel,
                        enabled: raw.enabled,
                        created_at: raw.created_at,
                        updated_at: raw.updated_at,
                    },
                    application_name: raw.application_name,
                }),
                Err(e) => {
                    warn!("Skipping alert config {}: {}", raw.id, e);
                    None
                }
            }
        })
        .collect()
}

fn application_from_row(row: &PgRow) -> Result<Application> {
    let status: String = row.try_get("status")?;
    Ok(Application {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        metrics_endpoint: row.try_get("metrics_endpoint")?,
        status: AppStatus::from_str(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn metric_from_row(row: &PgRow) -> Result<Metric> {
    Ok(Metric {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        timestamp: row.try_get("timestamp")?,
        cpu_usage: row.try_get("cpu_usage")?,
        memory_usage: row.try_get("memory_usage")?,
        network_rx: row.try_get("network_rx")?,
        network_tx: row.try_get("network_tx")?,
    })
}

fn raw_alert_row(row: &PgRow) -> Result<RawAlertRow> {
    Ok(RawAlertRow {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        alert_type: row.try_get("type")?,
        threshold_value: row.try_get("threshold_value")?,
        channel_type: row.try_get("channel_type")?,
        channel_config: row.try_get("channel_config")?,
        enabled: row.try_get("enabled")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        application_name: row.try_get("application_name")?,
    })
}
