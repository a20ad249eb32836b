//! Entity types stored in the external row store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Application lifecycle status. Transitions are driven externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Active,
    Inactive,
    Error,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Active => "active",
            AppStatus::Inactive => "inactive",
            AppStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for AppStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(AppStatus::Active),
            "inactive" => Ok(AppStatus::Inactive),
            "error" => Ok(AppStatus::Error),
            other => Err(Error::Validation(format!(
                "unknown application status '{other}'"
            ))),
        }
    }
}

/// A registered application exposing a metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Human label, unique per owning user
    pub name: String,
    pub description: Option<String>,
    /// Absolute URL of the application's metrics endpoint
    pub metrics_endpoint: String,
    pub status: AppStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored metrics sample. Immutable once written; append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: Uuid,
    pub application_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub network_rx: f64,
    pub network_tx: f64,
}

/// Alert condition kind.
///
/// Unrecognized values are preserved rather than rejected: the rule compiler
/// emits an empty expression for them instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertType {
    Cpu,
    Memory,
    ErrorRate,
    Other(String),
}

impl AlertType {
    pub fn as_str(&self) -> &str {
        match self {
            AlertType::Cpu => "cpu",
            AlertType::Memory => "memory",
            AlertType::ErrorRate => "error_rate",
            AlertType::Other(s) => s,
        }
    }
}

impl From<String> for AlertType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "cpu" => AlertType::Cpu,
            "memory" => AlertType::Memory,
            "error_rate" => AlertType::ErrorRate,
            _ => AlertType::Other(s),
        }
    }
}

impl From<AlertType> for String {
    fn from(t: AlertType) -> Self {
        t.as_str().to_string()
    }
}

/// Notification transport for a triggered alert.
///
/// The variant is keyed by the stored `channel_type` column; the payload shape
/// must match it, so construction goes through [`AlertChannel::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertChannel {
    Webhook { url: String },
    Email { email: String },
}

impl AlertChannel {
    /// Build a channel from the stored `channel_type` / `channel_config` pair,
    /// rejecting payloads whose shape does not match the declared type.
    pub fn from_parts(channel_type: &str, config: &Value) -> Result<Self> {
        match channel_type {
            "webhook" => {
                let url = config
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::Validation(
                            "webhook channel config is missing 'url'".to_string(),
                        )
                    })?;
                Ok(AlertChannel::Webhook {
                    url: url.to_string(),
                })
            }
            "email" => {
                let email = config
                    .get("email")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::Validation(
                            "email channel config is missing 'email'".to_string(),
                        )
                    })?;
                Ok(AlertChannel::Email {
                    email: email.to_string(),
                })
            }
            other => Err(Error::Validation(format!(
                "unknown channel type '{other}'"
            ))),
        }
    }

    pub fn channel_type(&self) -> &'static str {
        match self {
            AlertChannel::Webhook { .. } => "webhook",
            AlertChannel::Email { .. } => "email",
        }
    }
}

/// A stored alerting configuration for one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub id: Uuid,
    pub application_id: Uuid,
    pub alert_type: AlertType,
    pub threshold_value: f64,
    pub channel: AlertChannel,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An enabled alert configuration joined with its owning application's name,
/// as read back from the store for rule compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfigRow {
    pub config: AlertConfig,
    pub application_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_channel_from_parts() {
        let channel =
            AlertChannel::from_parts("webhook", &json!({ "url": "https://hooks.example/x" }))
                .unwrap();
        assert_eq!(
            channel,
            AlertChannel::Webhook {
                url: "https://hooks.example/x".to_string()
            }
        );
        assert_eq!(channel.channel_type(), "webhook");
    }

    #[test]
    fn test_email_channel_from_parts() {
        let channel =
            AlertChannel::from_parts("email", &json!({ "email": "ops@example.com" })).unwrap();
        assert_eq!(channel.channel_type(), "email");
    }

    #[test]
    fn test_mismatched_channel_shape_rejected() {
        let err = AlertChannel::from_parts("webhook", &json!({ "email": "ops@example.com" }))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = AlertChannel::from_parts("email", &json!({ "url": "https://x" })).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_channel_type_rejected() {
        let err = AlertChannel::from_parts("pager", &json!({})).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_alert_type_round_trip() {
        assert_eq!(AlertType::from("cpu".to_string()), AlertType::Cpu);
        assert_eq!(AlertType::from("error_rate".to_string()), AlertType::ErrorRate);
        assert_eq!(
            AlertType::from("disk".to_string()),
            AlertType::Other("disk".to_string())
        );
        assert_eq!(AlertType::Memory.as_str(), "memory");
    }

    #[test]
    fn test_app_status_parse() {
        use std::str::FromStr;
        assert_eq!(AppStatus::from_str("active").unwrap(), AppStatus::Active);
        assert!(AppStatus::from_str("paused").is_err());
    }
}
