// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Self-metrics of the client.
//!
//! Lock-free counters describing what the client registered and what
//! happened to each flush. A collector that is unreachable shows up here as
//! a growing dropped-batch count, since export failures are never raised.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::exporter::ExportOutcome;

/// Counters owned by one client.
#[derive(Debug)]
pub struct ClientMetrics {
    nodes_registered: AtomicU64,
    edges_recorded: AtomicU64,
    batches_sent: AtomicU64,
    batches_skipped: AtomicU64,
    batches_dropped: AtomicU64,
    nodes_exported: AtomicU64,
    edges_exported: AtomicU64,
    /// Millisecond timestamp of the last dropped batch, 0 when none.
    last_drop_ms: AtomicI64,
    start_time: Instant,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            nodes_registered: AtomicU64::new(0),
            edges_recorded: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
            batches_skipped: AtomicU64::new(0),
            batches_dropped: AtomicU64::new(0),
            nodes_exported: AtomicU64::new(0),
            edges_exported: AtomicU64::new(0),
            last_drop_ms: AtomicI64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_nodes_registered(&self, count: u64) {
        self.nodes_registered.fetch_add(count, Ordering::Relaxed);
    }

    /// Record `n` observed calls.
    pub fn record_edge(&self, n: u32) {
        self.edges_recorded.fetch_add(u64::from(n), Ordering::Relaxed);
    }

    /// Record the outcome of one flush.
    pub fn record_export(&self, outcome: &ExportOutcome) {
        match outcome {
            ExportOutcome::Skipped => {
                self.batches_skipped.fetch_add(1, Ordering::Relaxed);
            }
            ExportOutcome::Sent { nodes, edges } => {
                self.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.nodes_exported.fetch_add(*nodes as u64, Ordering::Relaxed);
                self.edges_exported.fetch_add(*edges as u64, Ordering::Relaxed);
            }
            ExportOutcome::Dropped { .. } => {
                self.batches_dropped.fetch_add(1, Ordering::Relaxed);
                self.last_drop_ms
                    .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
            }
        }
    }

    /// Get uptime since the client was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> ClientMetricsSnapshot {
        let last_drop_ms = self.last_drop_ms.load(Ordering::Relaxed);
        ClientMetricsSnapshot {
            nodes_registered: self.nodes_registered.load(Ordering::Relaxed),
            edges_recorded: self.edges_recorded.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            nodes_exported: self.nodes_exported.load(Ordering::Relaxed),
            edges_exported: self.edges_exported.load(Ordering::Relaxed),
            last_drop: (last_drop_ms != 0)
                .then(|| DateTime::from_timestamp_millis(last_drop_ms))
                .flatten(),
            uptime: self.uptime(),
        }
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of the client counters at a point in time.
#[derive(Debug, Clone)]
pub struct ClientMetricsSnapshot {
    pub nodes_registered: u64,

    /// Sum of call counts handed to the aggregator.
    pub edges_recorded: u64,

    pub batches_sent: u64,
    pub batches_skipped: u64,
    pub batches_dropped: u64,
    pub nodes_exported: u64,

    /// Exported edge records (one per bucket and status).
    pub edges_exported: u64,

    pub last_drop: Option<DateTime<Utc>>,

    /// Uptime when snapshot was taken.
    pub uptime: Duration,
}

impl ClientMetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Service Graph Client ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));
        report.push_str(&format!(
            "Recorded: {} nodes, {} calls\n",
            self.nodes_registered, self.edges_recorded
        ));
        report.push_str(&format!(
            "Batches: {} sent, {} skipped, {} dropped\n",
            self.batches_sent, self.batches_skipped, self.batches_dropped
        ));
        report.push_str(&format!(
            "Exported: {} nodes, {} edge records\n",
            self.nodes_exported, self.edges_exported
        ));
        if let Some(last_drop) = self.last_drop {
            report.push_str(&format!("Last dropped batch: {}\n", last_drop.to_rfc3339()));
        }

        report
    }
}
