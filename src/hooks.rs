// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interception points for inbound and outbound HTTP traffic.
//!
//! Frameworks and HTTP clients are wired to the client through these traits:
//! a server middleware calls [`InboundInterceptor`] around each request, an
//! HTTP client layer calls [`OutboundInterceptor`] around each call. Both are
//! implemented by [`Client`].
//!
//! ```rust,ignore
//! let (response, header) = instrument_inbound(&client, &request, async {
//!     let call = client.before_call(&OutboundRequest::new(url, host));
//!     let response = http.get(url).send().await?;
//!     if let Some(call) = call {
//!         client.after_call(call, &OutboundResponse::new(status, peer_header));
//!     }
//!     Ok(response)
//! })
//! .await;
//! ```

use std::future::Future;

use tracing::{trace, warn};

use crate::client::{Client, SelfReport};
use crate::context::{self, CallContext};
use crate::identity;
use crate::types::{EdgeStatus, NodeId, NodeMetadata, NodeType};

/// Edge and external-node class for observed HTTP calls.
pub const HTTP_REQUEST_CLASS: &str = "http-request";

/// An inbound request as seen by a server middleware.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Name of the serving application.
    pub service_name: String,
    /// Handler or route name, if the framework resolved one.
    pub transaction_name: Option<String>,
    pub service: NodeMetadata,
    pub transaction: NodeMetadata,
}

impl InboundRequest {
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

impl From<&InboundRequest> for SelfReport {
    fn from(request: &InboundRequest) -> Self {
        SelfReport {
            service_name: request.service_name.clone(),
            transaction_name: request.transaction_name.clone(),
            service: request.service.clone(),
            transaction: request.transaction.clone(),
        }
    }
}

/// An outbound call about to be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Absolute URL of the call.
    pub url: String,
    /// Host the call is addressed to.
    pub host: String,
}

impl OutboundRequest {
    pub fn new(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
        }
    }

    /// Build the absolute URL from connection parts.
    ///
    /// `target` is used as-is when already absolute. Otherwise the scheme is
    /// https when the default port is 443, and the port is spelled out only
    /// when it differs from the default.
    pub fn from_connection(host: &str, port: u16, default_port: u16, target: &str) -> Self {
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            let scheme = if default_port == 443 { "https" } else { "http" };
            if port == default_port {
                format!("{scheme}://{host}{target}")
            } else {
                format!("{scheme}://{host}:{port}{target}")
            }
        };
        Self::new(url, host)
    }
}

/// The peer's answer to an outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    /// Value of the peer's context header, if it sent one.
    pub context_header: Option<String>,
}

impl OutboundResponse {
    pub fn new(status: u16, context_header: Option<String>) -> Self {
        Self {
            status,
            context_header,
        }
    }
}

/// Ticket linking `before_call` to `after_call`.
///
/// Holds the call's origin so the edge is attributed correctly even if the
/// response is handled where the call context is no longer visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub request: OutboundRequest,
    pub origin: CallContext,
}

/// Hooks a server middleware calls around each inbound request.
pub trait InboundInterceptor {
    /// Establish the call context for the request.
    fn on_request_start(&self, request: &InboundRequest) -> CallContext;

    /// Header value to attach to the response. Ends the call context.
    fn on_response_ready(&self) -> Option<String>;
}

/// Hooks an HTTP client layer calls around each outbound call.
pub trait OutboundInterceptor {
    /// `None` when instrumentation is suppressed or no service is active;
    /// the call then goes unobserved.
    fn before_call(&self, request: &OutboundRequest) -> Option<OutboundCall>;

    fn after_call(&self, call: OutboundCall, response: &OutboundResponse);
}

impl InboundInterceptor for Client {
    fn on_request_start(&self, request: &InboundRequest) -> CallContext {
        self.report_self_with(SelfReport::from(request))
    }

    fn on_response_ready(&self) -> Option<String> {
        let header = self.context_header();
        self.clear_self();
        header
    }
}

impl OutboundInterceptor for Client {
    fn before_call(&self, request: &OutboundRequest) -> Option<OutboundCall> {
        if context::is_suppressed() {
            return None;
        }
        let origin = context::current();
        if origin.is_empty() {
            return None;
        }
        trace!(url = %request.url, "observing outbound call");
        Some(OutboundCall {
            request: request.clone(),
            origin,
        })
    }

    fn after_call(&self, call: OutboundCall, response: &OutboundResponse) {
        let status = EdgeStatus::from_http_status(response.status);
        let metadata = NodeMetadata::new(call.request.url.as_str(), HTTP_REQUEST_CLASS);

        let decoded = response
            .context_header
            .as_deref()
            .map(|header| self.scopes_from_context(header))
            .unwrap_or_default();

        let to_nodes: Vec<NodeId> = if decoded.is_empty() {
            match self.report_node(
                NodeType::External,
                &identity::external_node_name(&call.request.host),
                None,
                metadata.clone(),
            ) {
                Ok(id) => vec![id],
                Err(error) => {
                    warn!(%error, host = %call.request.host, "failed to report external node");
                    return;
                }
            }
        } else {
            decoded.nodes().collect()
        };

        for to in to_nodes {
            for from in call.origin.from_nodes() {
                self.report_edge(from, to, status, 1, Some(metadata.clone()));
            }
        }
    }
}

/// Run an inbound request handler with the inbound hooks applied.
///
/// `fut` runs in a fresh call scope; the returned header is what the
/// response should carry in [`CONTEXT_HEADER`](crate::codec::CONTEXT_HEADER).
pub async fn instrument_inbound<F>(
    client: &Client,
    request: &InboundRequest,
    fut: F,
) -> (F::Output, Option<String>)
where
    F: Future,
{
    context::scope(async {
        client.on_request_start(request);
        let output = fut.await;
        let header = client.on_response_ready();
        (output, header)
    })
    .await
}
