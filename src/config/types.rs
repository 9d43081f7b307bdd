// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the client configuration, supporting JSON and YAML formats.
//! Every field has a default pointing at a local development collector.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::identity::DEFAULT_SERVICE_NAMESPACE;

pub const DEFAULT_COLLECTOR_HOST: &str = "localhost";
pub const DEFAULT_COLLECTOR_PORT: u16 = 8000;
pub const DEFAULT_SUBMIT_PATH: &str = "/submit/";
pub const DEFAULT_PROJECT_ID: u64 = 1;
pub const DEFAULT_BUCKET_WIDTH_SECS: u64 = 60;
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_EXPORT_TIMEOUT_MS: u64 = 5_000;

/// Client configuration.
/// Can be defined in .servicegraph.json or .servicegraph.yaml in the working directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Collector host name
    pub collector_host: String,

    /// Collector port
    pub collector_port: u16,

    /// Submission path on the collector
    pub submit_path: String,

    /// Project the graph belongs to
    pub project_id: u64,

    /// Namespace service ids are derived under; must agree across a deployment
    pub service_namespace: Uuid,

    /// Width of edge aggregation buckets
    pub bucket_width_secs: u64,

    /// Cadence of the background flush
    pub flush_interval_secs: u64,

    /// Upper bound for one submission
    pub export_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collector_host: DEFAULT_COLLECTOR_HOST.to_string(),
            collector_port: DEFAULT_COLLECTOR_PORT,
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            project_id: DEFAULT_PROJECT_ID,
            service_namespace: DEFAULT_SERVICE_NAMESPACE,
            bucket_width_secs: DEFAULT_BUCKET_WIDTH_SECS,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            export_timeout_ms: DEFAULT_EXPORT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Set the collector address.
    pub fn with_collector(mut self, host: impl Into<String>, port: u16) -> Self {
        self.collector_host = host.into();
        self.collector_port = port;
        self
    }

    pub fn with_project_id(mut self, project_id: u64) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_service_namespace(mut self, namespace: Uuid) -> Self {
        self.service_namespace = namespace;
        self
    }

    pub fn with_bucket_width(mut self, width: Duration) -> Self {
        self.bucket_width_secs = width.as_secs();
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_secs = interval.as_secs();
        self
    }

    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Full URL batches are POSTed to.
    pub fn submit_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.collector_host, self.collector_port, self.submit_path
        )
    }

    pub fn bucket_width(&self) -> Duration {
        Duration::from_secs(self.bucket_width_secs)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_ms)
    }

    /// Check the values a running client depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collector_host.trim().is_empty() {
            return Err(ConfigError::invalid("collectorHost", "must not be empty"));
        }
        if !self.submit_path.starts_with('/') {
            return Err(ConfigError::invalid("submitPath", "must start with '/'"));
        }
        if self.bucket_width_secs == 0 {
            return Err(ConfigError::invalid("bucketWidthSecs", "must be greater than 0"));
        }
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::invalid("flushIntervalSecs", "must be greater than 0"));
        }
        if self.export_timeout_ms == 0 {
            return Err(ConfigError::invalid("exportTimeoutMs", "must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.submit_url(), "http://localhost:8000/submit/");
        assert_eq!(config.project_id, 1);
        assert_eq!(config.service_namespace, DEFAULT_SERVICE_NAMESPACE);
        assert_eq!(config.bucket_width(), Duration::from_secs(60));
        assert_eq!(config.flush_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"collectorHost": "collector", "projectId": 7}"#).unwrap();
        assert_eq!(config.collector_host, "collector");
        assert_eq!(config.project_id, 7);
        assert_eq!(config.collector_port, DEFAULT_COLLECTOR_PORT);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .with_collector("graph.internal", 9000)
            .with_bucket_width(Duration::from_secs(10))
            .with_export_timeout(Duration::from_millis(250));
        assert_eq!(config.submit_url(), "http://graph.internal:9000/submit/");
        assert_eq!(config.bucket_width_secs, 10);
        assert_eq!(config.export_timeout_ms, 250);
    }

    #[test]
    fn test_validate_rejects_zero_bucket() {
        let config = ClientConfig {
            bucket_width_secs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "bucketWidthSecs"
        ));
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let config = ClientConfig {
            submit_path: "submit".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
