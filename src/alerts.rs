//! Alert rule compilation.
//!
//! Turns stored alert configurations into Prometheus-style alerting rule
//! descriptors for the external alert evaluator. Pure transformation: the
//! same input rows always yield the same descriptors.

use serde::{Deserialize, Serialize};

use crate::model::{AlertConfigRow, AlertType};

/// Fixed severity attached to every derived rule.
const RULE_SEVERITY: &str = "warning";

/// One compiled alerting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Rule identifier, `{application_name}_{alert_type}`
    pub alert: String,
    /// Threshold expression; empty for unrecognized alert types
    pub expr: String,
    pub labels: RuleLabels,
    pub annotations: RuleAnnotations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLabels {
    pub severity: String,
    pub app: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAnnotations {
    pub summary: String,
    pub description: String,
}

/// Compile one rule per enabled alert configuration.
pub fn compile_rules(rows: &[AlertConfigRow]) -> Vec<AlertRule> {
    rows.iter().map(compile_rule).collect()
}

fn compile_rule(row: &AlertConfigRow) -> AlertRule {
    let name = &row.application_name;
    let alert_type = &row.config.alert_type;
    let threshold = row.config.threshold_value;

    AlertRule {
        alert: format!("{name}_{}", alert_type.as_str()),
        expr: threshold_expr(alert_type, name, threshold),
        labels: RuleLabels {
            severity: RULE_SEVERITY.to_string(),
            app: name.clone(),
        },
        annotations: RuleAnnotations {
            summary: format!("{} alert for {name}", alert_type.as_str()),
            description: rule_description(alert_type, threshold),
        },
    }
}

/// Threshold comparison expression for the rule. An unrecognized alert type
/// yields an empty expression, not an error.
fn threshold_expr(alert_type: &AlertType, app: &str, threshold: f64) -> String {
    match alert_type {
        AlertType::Cpu => format!(r#"cpu_usage{{app="{app}"}} > {threshold}"#),
        AlertType::Memory => format!(r#"memory_usage{{app="{app}"}} > {threshold}"#),
        AlertType::ErrorRate => format!(
            r#"rate(http_requests_total{{app="{app}",status=~"5.."}}[5m]) > {threshold}"#
        ),
        AlertType::Other(_) => String::new(),
    }
}

fn rule_description(alert_type: &AlertType, threshold: f64) -> String {
    match alert_type {
        AlertType::Cpu => format!("CPU usage is above {threshold}%"),
        AlertType::Memory => format!("Memory usage is above {threshold}%"),
        AlertType::ErrorRate => {
            format!("Error rate is above {threshold} errors per minute")
        }
        AlertType::Other(_) => String::new(),
    }
}
