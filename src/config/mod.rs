// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for the service graph client.
//!
//! Handles loading and validation of configuration from multiple sources:
//! - Global config: ~/.servicegraph/config.json
//! - Local config: .servicegraph.json or .servicegraph.yaml
//! - Environment: `SERVICEGRAPH_*` variables
//!
//! Configuration is merged with precedence (env > local > global > defaults).
//! Command-line flags, where a binary offers them, are applied on top.

mod loader;
mod types;

pub use loader::{
    apply_env_overrides, find_config_file, get_global_config_path, load_config_file,
    load_config_from_dir, CONFIG_FILES, ENV_BUCKET_SECS, ENV_FLUSH_SECS, ENV_HOST, ENV_PORT,
    ENV_PROJECT_ID, ENV_SERVICE_NS, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE,
};

pub use types::{
    ClientConfig, DEFAULT_BUCKET_WIDTH_SECS, DEFAULT_COLLECTOR_HOST, DEFAULT_COLLECTOR_PORT,
    DEFAULT_EXPORT_TIMEOUT_MS, DEFAULT_FLUSH_INTERVAL_SECS, DEFAULT_PROJECT_ID,
    DEFAULT_SUBMIT_PATH,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load, override and validate the configuration for a process.
///
/// This is the main entry point for configuration loading.
pub fn load_config(dir: &Path) -> Result<ClientConfig, ConfigError> {
    let config = load_config_from_dir(dir)?;
    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
