// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Context propagation header.
//!
//! Instrumented services attach their own nodes to every response under
//! [`CONTEXT_HEADER`], formatted as space-separated `key=value` tokens:
//!
//! ```text
//! servicegraph-context: service-node=<id> transaction-node=<id>
//! ```
//!
//! The caller decodes the header to learn which node it reached. Decoding is
//! lenient: tokens that do not parse are skipped, never rejected.

use crate::context::CallContext;
use crate::types::NodeId;

/// Response header carrying the responder's nodes.
pub const CONTEXT_HEADER: &str = "servicegraph-context";

pub const SERVICE_NODE_KEY: &str = "service-node";
pub const TRANSACTION_NODE_KEY: &str = "transaction-node";

/// Format `ctx` as a header value, or `None` when no service is active.
pub fn encode(ctx: &CallContext) -> Option<String> {
    let service = ctx.service?;
    let mut header = format!("{SERVICE_NODE_KEY}={service}");
    if let Some(transaction) = ctx.transaction {
        header.push_str(&format!(" {TRANSACTION_NODE_KEY}={transaction}"));
    }
    Some(header)
}

/// Nodes recovered from a peer's context header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodedContext {
    pub service: Option<NodeId>,
    pub transaction: Option<NodeId>,
}

impl DecodedContext {
    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.transaction.is_none()
    }

    pub fn len(&self) -> usize {
        self.service.is_some() as usize + self.transaction.is_some() as usize
    }

    /// Look up a header key (`service-node` or `transaction-node`).
    pub fn get(&self, key: &str) -> Option<NodeId> {
        match key {
            SERVICE_NODE_KEY => self.service,
            TRANSACTION_NODE_KEY => self.transaction,
            _ => None,
        }
    }

    /// Every recognized node, service first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.service.into_iter().chain(self.transaction)
    }
}

impl From<DecodedContext> for CallContext {
    fn from(decoded: DecodedContext) -> Self {
        CallContext {
            service: decoded.service,
            transaction: decoded.transaction,
        }
    }
}

/// Parse a context header. Unknown keys and unparsable ids are ignored.
pub fn decode(header: &str) -> DecodedContext {
    let mut decoded = DecodedContext::default();

    for token in header.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let slot = match key {
            SERVICE_NODE_KEY => &mut decoded.service,
            TRANSACTION_NODE_KEY => &mut decoded.transaction,
            _ => continue,
        };
        if let Some(id) = NodeId::parse(value) {
            *slot = Some(id);
        }
    }

    decoded
}
