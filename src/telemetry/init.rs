// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Log output initialization for binaries embedding the client.
//!
//! The client library only emits `tracing` events. Installing a subscriber is
//! left to whoever owns the process; the `servicegraph` binary uses this.

use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this crate if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include file/line information.
    pub include_file_line: bool,

    /// Whether to use ANSI colors in output.
    pub ansi_colors: bool,

    /// Custom filter directive (overrides RUST_LOG and default_level).
    pub filter_directive: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            include_file_line: false,
            ansi_colors: true,
            filter_directive: None,
        }
    }
}

impl LogConfig {
    /// Debug output for the client and the CLI, for troubleshooting exports.
    pub fn debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_file_line: true,
            ..Self::default()
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    /// Directive used when neither a custom filter nor RUST_LOG applies.
    ///
    /// Only this crate is raised to `default_level`; dependencies stay at warn.
    pub fn default_directive(&self) -> String {
        let level = self.default_level.to_string().to_lowercase();
        format!("warn,servicegraph={level}")
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let filter = match &config.filter_directive {
        Some(directive) => EnvFilter::try_new(directive)
            .unwrap_or_else(|_| EnvFilter::new(config.default_directive())),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_directive())),
    };

    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_writer(io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
