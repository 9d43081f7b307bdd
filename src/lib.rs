// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Service graph auto-instrumentation client.
//!
//! Reconstructs a live graph of which services call which, by transaction,
//! with the outcome of each call. Node ids are derived deterministically so
//! independent processes agree on them without coordination; calls are
//! counted into time buckets and exported to a collector in batches.
//!
//! # Architecture
//!
//! - [`types`] - Node ids, nodes, edges, statuses
//! - [`identity`] - Namespace-salted v5 UUID derivation
//! - [`registry`] - Node deduplication and pending-node tracking
//! - [`context`] - Task-local per-call context and instrumentation suppression
//! - [`codec`] - The `servicegraph-context` header
//! - [`aggregator`] - Time-bucketed, status-partitioned edge counters
//! - [`exporter`] - Batch submission with drop-on-failure
//! - [`client`] - The facade owning all state, plus the flush loop
//! - [`hooks`] - Inbound and outbound interceptor traits
//! - [`config`] - Configuration loading from files and environment
//! - [`error`] - Error types and result aliases
//! - [`telemetry`] - Log setup and client self-metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use servicegraph::{Client, ClientConfig, InboundRequest, instrument_inbound};
//!
//! let client = Client::new(ClientConfig::default())?;
//! let flush_loop = client.spawn_flush_loop();
//!
//! let request = InboundRequest::new("shop").with_transaction("checkout");
//! let (body, header) = instrument_inbound(&client, &request, handle(req)).await;
//!
//! flush_loop.shutdown().await;
//! ```

pub mod aggregator;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod exporter;
pub mod hooks;
pub mod identity;
pub mod registry;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use aggregator::{Clock, SystemClock};
pub use client::{Client, ClientBuilder, FlushLoop, SelfReport};
pub use codec::{DecodedContext, CONTEXT_HEADER};
pub use config::ClientConfig;
pub use context::CallContext;
pub use error::{ClientError, ConfigError, ExportError, Result};
pub use exporter::{ExportBatch, ExportOutcome, HttpTransport, Transport};
pub use hooks::{
    instrument_inbound, InboundInterceptor, InboundRequest, OutboundCall, OutboundInterceptor,
    OutboundRequest, OutboundResponse,
};
pub use types::{Edge, EdgeStatus, Node, NodeId, NodeMetadata, NodeType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let config = ClientConfig::default();
        assert_eq!(config.project_id, 1);
        assert_eq!(CONTEXT_HEADER, "servicegraph-context");
        assert_eq!(EdgeStatus::from_http_status(404), EdgeStatus::ExpectedError);
    }
}
