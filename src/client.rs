// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The client facade.
//!
//! [`Client`] owns the node registry and the edge aggregator behind a single
//! mutex. Request-path operations take the lock briefly and never do I/O
//! under it. [`Client::flush`] captures and clears the pending state in one
//! critical section, then exports off-lock, so observations made while an
//! export is in flight land in the next batch.
//!
//! There is no global instance: the host builds one client at startup and
//! hands clones (cheap, `Arc` inside) to its interceptors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregator::{Clock, EdgeAggregator, SystemClock};
use crate::codec::{self, DecodedContext};
use crate::config::ClientConfig;
use crate::context::{self, CallContext};
use crate::error::ClientError;
use crate::exporter::{ExportBatch, ExportOutcome, Exporter, HttpTransport, Transport};
use crate::registry::NodeRegistry;
use crate::telemetry::{ClientMetrics, ClientMetricsSnapshot};
use crate::types::{EdgeStatus, NodeId, NodeMetadata, NodeType};

/// Everything awaiting export, guarded by one lock.
#[derive(Debug)]
struct GraphState {
    registry: NodeRegistry,
    edges: EdgeAggregator,
}

struct Inner {
    state: Mutex<GraphState>,
    exporter: Exporter,
    clock: Arc<dyn Clock>,
    project_id: u64,
    flush_interval: Duration,
    metrics: ClientMetrics,
}

/// Identity of the current process and call, with optional node metadata.
#[derive(Debug, Clone, Default)]
pub struct SelfReport {
    pub service_name: String,
    pub transaction_name: Option<String>,
    pub service: NodeMetadata,
    pub transaction: NodeMetadata,
}

impl SelfReport {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    pub fn with_transaction(mut self, name: impl Into<String>) -> Self {
        self.transaction_name = Some(name.into());
        self
    }

    pub fn with_service_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.service = metadata;
        self
    }

    pub fn with_transaction_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.transaction = metadata;
        self
    }
}

/// Service graph client handle.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Build a client exporting over HTTP to the configured collector.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: None,
            clock: None,
        }
    }

    pub fn project_id(&self) -> u64 {
        self.inner.project_id
    }

    pub fn service_namespace(&self) -> Uuid {
        self.lock().registry.service_namespace()
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a node, returning its id.
    pub fn report_node(
        &self,
        kind: NodeType,
        name: &str,
        parent: Option<NodeId>,
        metadata: NodeMetadata,
    ) -> Result<NodeId, ClientError> {
        let mut state = self.lock();
        let before = state.registry.pending_len();
        let id = state.registry.ensure_node(kind, name, parent, metadata)?;
        let added = state.registry.pending_len().saturating_sub(before);
        drop(state);

        self.inner.metrics.record_nodes_registered(added as u64);
        Ok(id)
    }

    /// Register a node whose kind is given as text (`service`,
    /// `transaction` or `external`).
    pub fn report_node_named(
        &self,
        kind: &str,
        name: &str,
        parent: Option<NodeId>,
        metadata: NodeMetadata,
    ) -> Result<NodeId, ClientError> {
        let kind = kind.parse::<NodeType>()?;
        self.report_node(kind, name, parent, metadata)
    }

    /// Declare which service (and transaction) the current call runs in.
    ///
    /// Outside a call scope the nodes are still registered but no context
    /// is stored.
    pub fn report_self(&self, service: &str, transaction: Option<&str>) -> CallContext {
        let mut report = SelfReport::new(service);
        report.transaction_name = transaction.map(str::to_string);
        self.report_self_with(report)
    }

    pub fn report_self_with(&self, report: SelfReport) -> CallContext {
        match self.register_self(report) {
            Ok(ctx) => {
                context::enter(ctx);
                ctx
            }
            Err(error) => {
                warn!(%error, "failed to report self");
                CallContext::default()
            }
        }
    }

    fn register_self(&self, report: SelfReport) -> Result<CallContext, ClientError> {
        let service = self.report_node(
            NodeType::Service,
            &report.service_name,
            None,
            report.service,
        )?;
        let transaction = match &report.transaction_name {
            Some(name) => Some(self.report_node(
                NodeType::Transaction,
                name,
                Some(service),
                report.transaction,
            )?),
            None => None,
        };
        Ok(CallContext::new(service, transaction))
    }

    /// End the current call's context.
    pub fn clear_self(&self) {
        context::clear();
    }

    /// Count `n` calls from `from` to `to` in the current time bucket.
    pub fn report_edge(
        &self,
        from: NodeId,
        to: NodeId,
        status: EdgeStatus,
        n: u32,
        metadata: Option<NodeMetadata>,
    ) {
        let now = self.inner.clock.now();
        self.lock().edges.record(from, to, status, n, metadata, now);
        self.inner.metrics.record_edge(n);
    }

    /// Header value advertising the current call's nodes to a peer.
    pub fn context_header(&self) -> Option<String> {
        codec::encode(&context::current())
    }

    pub fn scopes_from_context(&self, header: &str) -> DecodedContext {
        codec::decode(header)
    }

    /// Capture and clear everything pending.
    fn take_batch(&self) -> ExportBatch {
        let mut state = self.lock();
        ExportBatch {
            project_id: self.inner.project_id,
            nodes: state.registry.take_pending(),
            edges: state.edges.take_edges(),
        }
    }

    /// Export everything observed since the previous flush.
    ///
    /// Never fails: a batch the collector did not accept is dropped and
    /// reported through the outcome and [`metrics`](Self::metrics).
    pub async fn flush(&self) -> ExportOutcome {
        let batch = self.take_batch();
        let outcome = self.inner.exporter.export(batch).await;
        self.inner.metrics.record_export(&outcome);
        outcome
    }

    /// Final flush for hosts that do not run a [`FlushLoop`].
    pub async fn shutdown(&self) -> ExportOutcome {
        debug!("client shutdown, flushing");
        self.flush().await
    }

    /// Flush every `flush_interval` on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_flush_loop(&self) -> FlushLoop {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let client = self.clone();
        let period = self.inner.flush_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        client.flush().await;
                    }
                    // Fires on an explicit stop and when the FlushLoop is dropped.
                    _ = &mut stop_rx => break,
                }
            }
            debug!("flush loop stopped");
        });

        FlushLoop {
            client: self.clone(),
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn metrics(&self) -> ClientMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn pending_nodes(&self) -> usize {
        self.lock().registry.pending_len()
    }

    /// Distinct `(bucket, from, to)` keys awaiting export.
    pub fn pending_edges(&self) -> usize {
        self.lock().edges.len()
    }

    pub fn known_nodes(&self) -> usize {
        self.lock().registry.known_len()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("project_id", &self.inner.project_id)
            .field("flush_interval", &self.inner.flush_interval)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Client`] with replaceable transport and clock.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let config = self.config;
        config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let inner = Inner {
            state: Mutex::new(GraphState {
                registry: NodeRegistry::new(config.service_namespace),
                edges: EdgeAggregator::new(config.bucket_width()),
            }),
            exporter: Exporter::new(transport, config.export_timeout()),
            clock,
            project_id: config.project_id,
            flush_interval: config.flush_interval(),
            metrics: ClientMetrics::new(),
        };

        Ok(Client {
            inner: Arc::new(inner),
        })
    }
}

/// Handle to the background flush task.
///
/// Dropping it stops the task without a final flush; use
/// [`shutdown`](Self::shutdown) to get one.
pub struct FlushLoop {
    client: Client,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl FlushLoop {
    /// Stop the loop, then flush whatever is still pending.
    pub async fn shutdown(mut self) -> ExportOutcome {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(error) = (&mut self.handle).await {
            warn!(%error, "flush loop ended abnormally");
        }
        self.client.shutdown().await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::exporter::MockTransport;

    fn client_with(transport: MockTransport) -> Client {
        Client::builder(ClientConfig::default())
            .transport(Arc::new(transport))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_flush_makes_no_request() {
        let mut transport = MockTransport::new();
        transport.expect_submit().never();

        let client = client_with(transport);
        assert!(client.flush().await.is_skipped());
        assert_eq!(client.metrics().batches_skipped, 1);
    }

    #[tokio::test]
    async fn test_report_self_sets_context_in_scope() {
        let client = client_with(MockTransport::new());

        context::scope(async {
            let ctx = client.report_self("shop", Some("checkout"));
            assert_eq!(context::current(), ctx);
            assert_eq!(client.pending_nodes(), 2);

            let header = client.context_header().unwrap();
            let decoded = client.scopes_from_context(&header);
            assert_eq!(CallContext::from(decoded), ctx);

            client.clear_self();
            assert!(client.context_header().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn test_repeated_reports_register_once() {
        let client = client_with(MockTransport::new());

        context::scope(async {
            for _ in 0..100 {
                client.report_self("shop", Some("checkout"));
            }
        })
        .await;

        assert_eq!(client.pending_nodes(), 2);
        assert_eq!(client.known_nodes(), 2);
        assert_eq!(client.metrics().nodes_registered, 2);
    }

    #[tokio::test]
    async fn test_flush_clears_pending_state() {
        let mut transport = MockTransport::new();
        transport
            .expect_submit()
            .withf(|b: &ExportBatch| b.project_id == 1 && b.nodes.len() == 2 && b.edges.len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        let client = client_with(transport);

        let a = client
            .report_node(NodeType::Service, "a", None, NodeMetadata::default())
            .unwrap();
        let b = client
            .report_node(NodeType::Service, "b", None, NodeMetadata::default())
            .unwrap();
        client.report_edge(a, b, EdgeStatus::Ok, 1, None);

        assert!(client.flush().await.is_sent());
        assert_eq!(client.pending_nodes(), 0);
        assert_eq!(client.pending_edges(), 0);
        assert_eq!(client.known_nodes(), 2);

        // Nothing new since: the next flush is skipped.
        assert!(client.flush().await.is_skipped());
    }

    #[tokio::test]
    async fn test_failed_flush_is_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_| Err(ExportError::Status { code: 503 }));
        let client = client_with(transport);

        client
            .report_node(NodeType::Service, "a", None, NodeMetadata::default())
            .unwrap();
        assert!(client.flush().await.is_dropped());
        assert!(client.flush().await.is_skipped());

        let metrics = client.metrics();
        assert_eq!(metrics.batches_dropped, 1);
        assert!(metrics.last_drop.is_some());
    }

    #[test]
    fn test_report_node_named() {
        let client = client_with(MockTransport::new());
        let shop = client
            .report_node_named("service", "shop", None, NodeMetadata::default())
            .unwrap();
        let tx = client
            .report_node_named("transaction", "checkout", Some(shop), NodeMetadata::default())
            .unwrap();
        assert_eq!(tx, crate::identity::transaction_id(shop, "checkout"));

        let err = client
            .report_node_named("endpoint", "checkout", None, NodeMetadata::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownNodeType(ref kind) if kind == "endpoint"));
        assert_eq!(client.pending_nodes(), 2);
        assert_eq!(client.metrics().nodes_registered, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::default().with_flush_interval(Duration::ZERO);
        let err = Client::builder(config)
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_report_self_outside_scope_registers_only() {
        let client = client_with(MockTransport::new());
        let ctx = client.report_self("shop", None);
        assert!(!ctx.is_empty());
        assert!(context::current().is_empty());
        assert_eq!(client.pending_nodes(), 1);
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let client = client_with(MockTransport::new());
        let poisoner = client.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("host thread panicked");
        })
        .join();

        client
            .report_node(NodeType::Service, "a", None, NodeMetadata::default())
            .unwrap();
        assert_eq!(client.pending_nodes(), 1);
    }
}
