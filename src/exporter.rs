// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Batch export to the collector.
//!
//! A flush hands the exporter one [`ExportBatch`]. Empty batches are skipped
//! without touching the network. Everything else is submitted once through a
//! [`Transport`], bounded by a timeout, with instrumentation suppressed so the
//! submission never shows up as an edge of its own. A failed batch is logged
//! and dropped: no retry, no local persistence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::context;
use crate::error::{ClientError, ExportError};
use crate::types::{Edge, Node};

/// Body of one submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportBatch {
    pub project_id: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ExportBatch {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Delivery of a batch to the collector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, batch: &ExportBatch) -> Result<(), ExportError>;
}

/// JSON over HTTP POST.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.export_timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: config.submit_url(),
            timeout_ms: config.export_timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, batch: &ExportBatch) -> Result<(), ExportError> {
        let body = serde_json::to_vec(batch)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExportError::Timeout(self.timeout_ms)
                } else {
                    ExportError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status {
                code: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// What happened to a batch.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Nothing was pending; no request was made.
    Skipped,
    Sent { nodes: usize, edges: usize },
    /// The submission failed and the batch was discarded.
    Dropped {
        nodes: usize,
        edges: usize,
        error: ExportError,
    },
}

impl ExportOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }
}

/// Submits batches through a transport with a bounded timeout.
#[derive(Clone)]
pub struct Exporter {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Exporter {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub async fn export(&self, batch: ExportBatch) -> ExportOutcome {
        if batch.is_empty() {
            debug!("nothing pending, skipping export");
            return ExportOutcome::Skipped;
        }

        let nodes = batch.nodes.len();
        let edges = batch.edges.len();

        let submit = context::suppressed(self.transport.submit(&batch));
        let result = match tokio::time::timeout(self.timeout, submit).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::Timeout(self.timeout.as_millis() as u64)),
        };

        match result {
            Ok(()) => {
                info!(
                    project_id = batch.project_id,
                    nodes,
                    edges,
                    "exported service graph batch"
                );
                ExportOutcome::Sent { nodes, edges }
            }
            Err(error) => {
                warn!(
                    project_id = batch.project_id,
                    nodes,
                    edges,
                    retryable = error.is_retryable(),
                    %error,
                    "dropping service graph batch"
                );
                ExportOutcome::Dropped {
                    nodes,
                    edges,
                    error,
                }
            }
        }
    }
}
