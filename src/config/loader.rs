// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files and the environment.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ConfigError;

use super::types::ClientConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    ".servicegraph.json",
    ".servicegraph.yaml",
    ".servicegraph.yml",
];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".servicegraph";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

pub const ENV_HOST: &str = "SERVICEGRAPH_HOST";
pub const ENV_PORT: &str = "SERVICEGRAPH_PORT";
pub const ENV_PROJECT_ID: &str = "SERVICEGRAPH_PROJECT_ID";
pub const ENV_SERVICE_NS: &str = "SERVICEGRAPH_SERVICE_NS";
pub const ENV_BUCKET_SECS: &str = "SERVICEGRAPH_BUCKET_SECS";
pub const ENV_FLUSH_SECS: &str = "SERVICEGRAPH_FLUSH_SECS";

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        "json" | "" => serde_json::from_str(&content).map_err(ConfigError::from),
        other => Err(ConfigError::InvalidFormat(format!(
            "unsupported config extension: .{other}"
        ))),
    }
}

/// Find the first config file in `dir`.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Load configuration from `dir`, falling back to the global file, then defaults.
pub fn load_config_from_dir(dir: &Path) -> Result<ClientConfig, ConfigError> {
    if let Some(path) = find_config_file(dir) {
        return load_config_file(&path);
    }
    match get_global_config_path() {
        Some(path) if path.exists() => load_config_file(&path),
        _ => Ok(ClientConfig::default()),
    }
}

/// Apply `SERVICEGRAPH_*` overrides read through `lookup`.
///
/// `lookup` is usually `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides<F>(
    mut config: ClientConfig,
    lookup: F,
) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        config.collector_host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.collector_port = parse_env(ENV_PORT, &port)?;
    }
    if let Some(project_id) = lookup(ENV_PROJECT_ID) {
        config.project_id = parse_env(ENV_PROJECT_ID, &project_id)?;
    }
    if let Some(ns) = lookup(ENV_SERVICE_NS) {
        config.service_namespace = Uuid::parse_str(ns.trim())
            .map_err(|e| ConfigError::invalid(ENV_SERVICE_NS, e.to_string()))?;
    }
    if let Some(secs) = lookup(ENV_BUCKET_SECS) {
        config.bucket_width_secs = parse_env(ENV_BUCKET_SECS, &secs)?;
    }
    if let Some(secs) = lookup(ENV_FLUSH_SECS) {
        config.flush_interval_secs = parse_env(ENV_FLUSH_SECS, &secs)?;
    }
    Ok(config)
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".servicegraph.json");
        std::fs::write(&path, r#"{"collectorPort": 9100, "bucketWidthSecs": 10}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.collector_port, 9100);
        assert_eq!(config.bucket_width_secs, 10);
    }

    #[test]
    fn test_load_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".servicegraph.yaml");
        std::fs::write(
            &path,
            concat!(
                "collectorHost: collector.svc\n",
                "projectId: 42\n",
                "serviceNamespace: 8f211529-1b79-4d02-9b34-44bbffdc54fa\n",
            ),
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.collector_host, "collector.svc");
        assert_eq!(config.project_id, 42);
        assert_eq!(
            config.service_namespace.to_string(),
            "8f211529-1b79-4d02-9b34-44bbffdc54fa"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_config_file(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".servicegraph.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config_file(&path).unwrap_err(),
            ConfigError::JsonError(_)
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "x = 1").unwrap();
        assert!(matches!(
            load_config_file(&path).unwrap_err(),
            ConfigError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_find_config_file_order() {
        let temp = TempDir::new().unwrap();
        assert!(find_config_file(temp.path()).is_none());

        std::fs::write(temp.path().join(".servicegraph.yaml"), "projectId: 2\n").unwrap();
        std::fs::write(temp.path().join(".servicegraph.json"), r#"{"projectId": 3}"#).unwrap();

        let found = find_config_file(temp.path()).unwrap();
        assert!(found.ends_with(".servicegraph.json"));
        assert_eq!(load_config_from_dir(temp.path()).unwrap().project_id, 3);
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(
            ClientConfig::default(),
            env(&[
                (ENV_HOST, "collector"),
                (ENV_PORT, "9000"),
                (ENV_PROJECT_ID, "12"),
                (ENV_BUCKET_SECS, " 30 "),
            ]),
        )
        .unwrap();

        assert_eq!(config.submit_url(), "http://collector:9000/submit/");
        assert_eq!(config.project_id, 12);
        assert_eq!(config.bucket_width_secs, 30);
        assert_eq!(config.flush_interval_secs, 1);
    }

    #[test]
    fn test_env_override_invalid_port() {
        let err = apply_env_overrides(ClientConfig::default(), env(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == ENV_PORT));
    }

    #[test]
    fn test_env_override_invalid_namespace() {
        let err = apply_env_overrides(ClientConfig::default(), env(&[(ENV_SERVICE_NS, "xyz")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
