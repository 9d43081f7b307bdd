// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the service graph client.
//!
//! This module provides strongly-typed errors for different parts of the client,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation.
//!
//! Only API misuse ([`ClientError`]) ever reaches the host application.
//! [`ExportError`] is logged and counted by the exporter, then dropped.

use thiserror::Error;

/// Errors returned to callers of the client API.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport setup failed: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while submitting a batch to the collector.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Collector rejected batch with status {code}")]
    Status { code: u16 },

    #[error("Failed to serialize batch: {0}")]
    Serialize(String),
}

impl ExportError {
    /// Whether a later attempt could plausibly succeed.
    ///
    /// Batches are never retried; this only shapes how failures are logged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { code } => *code >= 500,
            Self::Serialize(_) => false,
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status {
                code: status.as_u16(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_retryable() {
        assert!(ExportError::Network("connection refused".to_string()).is_retryable());
        assert!(ExportError::Timeout(5000).is_retryable());
        assert!(ExportError::Status { code: 503 }.is_retryable());
        assert!(!ExportError::Status { code: 400 }.is_retryable());
        assert!(!ExportError::Serialize("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::NotFound(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid json");
        let json_err = result.unwrap_err();
        let config_err: ConfigError = json_err.into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_client_error_from_config() {
        let client_err: ClientError = ConfigError::invalid("bucketWidthSecs", "must be > 0").into();
        assert!(matches!(client_err, ClientError::Config(_)));
        assert!(client_err.to_string().contains("bucketWidthSecs"));
    }

    #[test]
    fn test_error_display() {
        let err = ExportError::Status { code: 502 };
        assert_eq!(err.to_string(), "Collector rejected batch with status 502");
        let err = ClientError::UnknownNodeType("endpoint".to_string());
        assert_eq!(err.to_string(), "Unknown node type: endpoint");
    }
}
