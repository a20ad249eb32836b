//! # appwatch
//!
//! Backend core of an application-monitoring platform. Applications push
//! Prometheus exposition-format metrics text; the service parses it, extracts
//! the tracked fields (cpu, memory, network rx/tx) and appends a sample row
//! to the external store. On demand it derives Prometheus-style alerting
//! rules from stored alert configurations and a scrape configuration from
//! registered applications.
//!
//! All store and identity concerns live in external collaborators; this crate
//! holds the parsing, extraction and document-derivation logic plus the thin
//! HTTP surface around them.

pub mod alerts;
pub mod config;
pub mod error;
pub mod exposition;
pub mod extract;
pub mod logging;
pub mod model;
pub mod scrape;
pub mod server;
pub mod store;

pub use error::{Error, Result};
pub use server::{router, serve, AppState};
pub use store::{PgStore, RowStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_carries_detail() {
        let err = Error::Validation("Missing required fields".to_string());
        assert!(err.to_string().contains("Missing required fields"));
    }
}
