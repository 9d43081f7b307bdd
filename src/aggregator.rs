// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Time-bucketed edge aggregation.
//!
//! Every observed call increments one counter keyed by
//! `(bucket, from, to)` and partitioned by [`EdgeStatus`]. High-frequency
//! identical calls collapse into a single exported record per bucket and
//! status, which bounds export volume independently of request rate.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{Edge, EdgeStatus, NodeId, NodeMetadata};

/// Source of the current time for bucketing.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Truncate `ts` to the start of its epoch-aligned bucket.
pub fn bucket_start(ts: DateTime<Utc>, width: Duration) -> DateTime<Utc> {
    let width_ms = (width.as_millis() as i64).max(1);
    let ms = ts.timestamp_millis();
    DateTime::from_timestamp_millis(ms - ms.rem_euclid(width_ms)).unwrap_or(ts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct EdgeKey {
    bucket: DateTime<Utc>,
    from: NodeId,
    to: NodeId,
}

#[derive(Debug, Default)]
struct EdgeCounters {
    counts: [u32; 3],
    metadata: NodeMetadata,
}

/// Pending edge counters. Not synchronized; owned by the client state.
#[derive(Debug)]
pub struct EdgeAggregator {
    bucket_width: Duration,
    counters: BTreeMap<EdgeKey, EdgeCounters>,
}

impl EdgeAggregator {
    pub fn new(bucket_width: Duration) -> Self {
        Self {
            bucket_width,
            counters: BTreeMap::new(),
        }
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    /// Add `n` calls from `from` to `to` with `status`, observed at `now`.
    ///
    /// Metadata, when given, replaces whatever the bucket carried before.
    pub fn record(
        &mut self,
        from: NodeId,
        to: NodeId,
        status: EdgeStatus,
        n: u32,
        metadata: Option<NodeMetadata>,
        now: DateTime<Utc>,
    ) {
        let key = EdgeKey {
            bucket: bucket_start(now, self.bucket_width),
            from,
            to,
        };
        let counters = self.counters.entry(key).or_default();
        let slot = &mut counters.counts[status.index()];
        *slot = slot.saturating_add(n);
        if let Some(metadata) = metadata {
            counters.metadata = metadata;
        }
    }

    /// Number of distinct `(bucket, from, to)` keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Emit one edge per key and non-zero status, then reset.
    pub fn take_edges(&mut self) -> Vec<Edge> {
        let counters = std::mem::take(&mut self.counters);
        let mut edges = Vec::with_capacity(counters.len());

        for (key, entry) in counters {
            for status in EdgeStatus::ALL {
                let n = entry.counts[status.index()];
                if n == 0 {
                    continue;
                }
                edges.push(Edge {
                    ts: key.bucket,
                    from_node_id: key.from,
                    to_node_id: key.to,
                    status,
                    n,
                    metadata: entry.metadata.clone(),
                });
            }
        }

        edges
    }
}
