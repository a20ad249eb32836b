//! Scrape configuration generation.
//!
//! Builds the document that tells the external metrics collector which
//! targets to poll. One scrape job per active application, derived from its
//! registered metrics endpoint URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::model::Application;

const SCRAPE_INTERVAL: &str = "15s";
const EVALUATION_INTERVAL: &str = "15s";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub global: GlobalConfig,
    pub scrape_configs: Vec<ScrapeJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub scrape_interval: String,
    pub evaluation_interval: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub job_name: String,
    pub static_configs: Vec<StaticConfig>,
    pub metrics_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,
    pub labels: TargetLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLabels {
    pub app: String,
    pub app_id: String,
}

/// Generate the scrape configuration for the given active applications.
///
/// Fails with a validation error when any application's metrics endpoint is
/// not an absolute URL with a host, since target and path extraction require
/// one. Deterministic for a given input row set.
pub fn generate(apps: &[Application]) -> Result<ScrapeConfig> {
    let mut scrape_configs = Vec::with_capacity(apps.len());

    for app in apps {
        let endpoint = Url::parse(&app.metrics_endpoint).map_err(|e| {
            Error::Validation(format!(
                "application '{}' has an invalid metrics endpoint '{}': {e}",
                app.name, app.metrics_endpoint
            ))
        })?;
        let host = endpoint.host_str().ok_or_else(|| {
            Error::Validation(format!(
                "application '{}' metrics endpoint '{}' has no host",
                app.name, app.metrics_endpoint
            ))
        })?;
        let target = match endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        scrape_configs.push(ScrapeJob {
            job_name: app.name.clone(),
            static_configs: vec![StaticConfig {
                targets: vec![target],
                labels: TargetLabels {
                    app: app.name.clone(),
                    app_id: app.id.to_string(),
                },
            }],
            metrics_path: endpoint.path().to_string(),
        });
    }

    Ok(ScrapeConfig {
        global: GlobalConfig {
            scrape_interval: SCRAPE_INTERVAL.to_string(),
            evaluation_interval: EVALUATION_INTERVAL.to_string(),
        },
        scrape_configs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn app(name: &str, endpoint: &str) -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            metrics_endpoint: endpoint.to_string(),
            status: AppStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_target_includes_port() {
        let a = app("checkout", "https://host.example:9000/metrics");
        let config = generate(&[a.clone()]).unwrap();

        assert_eq!(config.scrape_configs.len(), 1);
        let job = &config.scrape_configs[0];
        assert_eq!(job.job_name, "checkout");
        assert_eq!(job.static_configs[0].targets, vec!["host.example:9000"]);
        assert_eq!(job.metrics_path, "/metrics");
        assert_eq!(job.static_configs[0].labels.app, "checkout");
        assert_eq!(job.static_configs[0].labels.app_id, a.id.to_string());
    }

    #[test]
    fn test_target_without_port() {
        let config = generate(&[app("api", "https://api.example.com/internal/metrics")]).unwrap();
        let job = &config.scrape_configs[0];

        assert_eq!(job.static_configs[0].targets, vec!["api.example.com"]);
        assert_eq!(job.metrics_path, "/internal/metrics");
    }

    #[test]
    fn test_global_intervals_fixed() {
        let config = generate(&[]).unwrap();
        assert_eq!(config.global.scrape_interval, "15s");
        assert_eq!(config.global.evaluation_interval, "15s");
        assert!(config.scrape_configs.is_empty());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = generate(&[app("broken", "not a url")]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_relative_endpoint_rejected() {
        let err = generate(&[app("broken", "/metrics")]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let apps = vec![
            app("checkout", "https://a.example:9100/metrics"),
            app("api", "http://b.example/metrics"),
        ];
        assert_eq!(generate(&apps).unwrap(), generate(&apps).unwrap());
    }
}
