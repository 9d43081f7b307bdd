// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-call context.
//!
//! The nodes serving the current inbound call live in a tokio task-local.
//! A scope is opened around each inbound call with [`scope`] (or
//! [`sync_scope`] for blocking handlers); concurrent calls each get their own
//! scope and never observe each other's context. Work spawned on behalf of a
//! call inherits it through [`propagate`].
//!
//! The same mechanism carries the "instrumentation suppressed" flag used
//! around the client's own export traffic.

use std::cell::Cell;
use std::future::Future;

use crate::types::NodeId;

tokio::task_local! {
    static CALL_CONTEXT: Cell<CallContext>;
    static SUPPRESSED: bool;
}

/// The service and transaction currently serving a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CallContext {
    pub service: Option<NodeId>,
    pub transaction: Option<NodeId>,
}

impl CallContext {
    pub fn new(service: NodeId, transaction: Option<NodeId>) -> Self {
        Self {
            service: Some(service),
            transaction,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_none()
    }

    /// Nodes outbound edges originate from: the service, then the transaction.
    ///
    /// A transaction without a service yields nothing.
    pub fn from_nodes(&self) -> impl Iterator<Item = NodeId> {
        let transaction = self.service.and(self.transaction);
        self.service.into_iter().chain(transaction)
    }
}

/// Run `fut` inside a fresh, empty call scope.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    CALL_CONTEXT.scope(Cell::new(CallContext::default()), fut).await
}

/// Run `f` inside a fresh, empty call scope on the current thread.
pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
    CALL_CONTEXT.sync_scope(Cell::new(CallContext::default()), f)
}

/// Run `fut` with a copy of the current context, e.g. for spawned work that
/// still serves the current call.
///
/// The context is captured when this is called, not when `fut` is polled.
pub fn propagate<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    CALL_CONTEXT.scope(Cell::new(current()), fut)
}

/// Replace the active scope's context.
///
/// Returns `false` when no scope is active, in which case nothing is stored.
pub fn enter(ctx: CallContext) -> bool {
    CALL_CONTEXT.try_with(|cell| cell.set(ctx)).is_ok()
}

/// The active context, or an empty one outside any scope.
pub fn current() -> CallContext {
    CALL_CONTEXT.try_with(Cell::get).unwrap_or_default()
}

/// End the current call's context. Idempotent.
pub fn clear() {
    let _ = CALL_CONTEXT.try_with(|cell| cell.set(CallContext::default()));
}

/// Run `fut` with instrumentation suppressed. Nests freely.
pub async fn suppressed<F: Future>(fut: F) -> F::Output {
    SUPPRESSED.scope(true, fut).await
}

pub fn is_suppressed() -> bool {
    SUPPRESSED.try_with(|s| *s).unwrap_or(false)
}
