//! Mapping from parsed exposition samples to the tracked metric fields.

use serde::{Deserialize, Serialize};

use crate::exposition::RawSample;

/// Exposition metric name backing `cpu_usage`
pub const CPU_USAGE_METRIC: &str = "process_cpu_usage";
/// Exposition metric name backing `memory_usage`
pub const MEMORY_USAGE_METRIC: &str = "process_resident_memory_bytes";
/// Exposition metric name backing `network_rx`
pub const NETWORK_RX_METRIC: &str = "process_network_rx_bytes";
/// Exposition metric name backing `network_tx`
pub const NETWORK_TX_METRIC: &str = "process_network_tx_bytes";

/// The four tracked fields extracted from one metrics push.
///
/// A field whose metric name does not appear in the push defaults to `0.0`.
/// This makes a missing metric indistinguishable from an explicit zero; that
/// is a known limitation of the extraction contract, kept deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub network_rx: f64,
    pub network_tx: f64,
}

/// Extract the tracked fields from a parsed sample sequence.
///
/// Policy: the first occurrence of a name in parse order wins. Duplicate
/// lines are neither summed nor overridden by later occurrences.
pub fn extract(samples: &[RawSample]) -> MetricSample {
    MetricSample {
        cpu_usage: first_value(samples, CPU_USAGE_METRIC),
        memory_usage: first_value(samples, MEMORY_USAGE_METRIC),
        network_rx: first_value(samples, NETWORK_RX_METRIC),
        network_tx: first_value(samples, NETWORK_TX_METRIC),
    }
}

fn first_value(samples: &[RawSample], name: &str) -> f64 {
    samples
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.value)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposition::parse_text;

    #[test]
    fn test_extracts_cpu_usage() {
        let samples = parse_text("process_cpu_usage 42.5\n").unwrap();
        let extracted = extract(&samples);
        assert_eq!(extracted.cpu_usage, 42.5);
    }

    #[test]
    fn test_all_fields_populated() {
        let text = "process_cpu_usage 12.5\n\
                    process_resident_memory_bytes 2097152\n\
                    process_network_rx_bytes 300\n\
                    process_network_tx_bytes 120\n";
        let extracted = extract(&parse_text(text).unwrap());

        assert_eq!(extracted.cpu_usage, 12.5);
        assert_eq!(extracted.memory_usage, 2097152.0);
        assert_eq!(extracted.network_rx, 300.0);
        assert_eq!(extracted.network_tx, 120.0);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let samples = parse_text("go_goroutines 12\nup 1\n").unwrap();
        let extracted = extract(&samples);

        assert_eq!(extracted.cpu_usage, 0.0);
        assert_eq!(extracted.memory_usage, 0.0);
        assert_eq!(extracted.network_rx, 0.0);
        assert_eq!(extracted.network_tx, 0.0);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let samples = parse_text("process_cpu_usage 10\nprocess_cpu_usage 99\n").unwrap();
        assert_eq!(extract(&samples).cpu_usage, 10.0);
    }

    #[test]
    fn test_unknown_names_ignored() {
        let samples =
            parse_text("custom_metric 7\nprocess_cpu_usage 3\n").unwrap();
        assert_eq!(extract(&samples).cpu_usage, 3.0);
    }
}
