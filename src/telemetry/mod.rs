// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Observability of the client itself.
//!
//! - **Logging**: `tracing` events from every component; [`init_logging`]
//!   installs a subscriber for binaries that own the process
//! - **Metrics**: [`ClientMetrics`] counters for registrations and flush outcomes
//!
//! # Usage
//!
//! ```rust,ignore
//! use servicegraph::telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! let report = client.metrics().format_report();
//! ```

mod init;
pub mod metrics;

pub use init::{init_logging, LogConfig};
pub use metrics::{ClientMetrics, ClientMetricsSnapshot};
