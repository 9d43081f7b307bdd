// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Node registry.
//!
//! Deduplicates node creation for the lifetime of the process and holds the
//! nodes that have not been exported yet. Known nodes survive flushes; only
//! the pending list is drained.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::ClientError;
use crate::identity;
use crate::types::{Node, NodeId, NodeMetadata, NodeType};

/// Process-lifetime node cache plus the not-yet-exported nodes.
///
/// Not synchronized; the client owns it behind its state lock.
#[derive(Debug)]
pub struct NodeRegistry {
    service_namespace: Uuid,
    known: HashMap<(Uuid, String), NodeId>,
    pending: Vec<Node>,
}

impl NodeRegistry {
    pub fn new(service_namespace: Uuid) -> Self {
        Self {
            service_namespace,
            known: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn service_namespace(&self) -> Uuid {
        self.service_namespace
    }

    /// Return the id for `(kind, name, parent)`, registering it on first sight.
    ///
    /// A transaction must have a parent. Metadata of an already-known node is
    /// left as first reported.
    pub fn ensure_node(
        &mut self,
        kind: NodeType,
        name: &str,
        parent: Option<NodeId>,
        metadata: NodeMetadata,
    ) -> Result<NodeId, ClientError> {
        let namespace = match kind {
            NodeType::Service | NodeType::External => self.service_namespace,
            NodeType::Transaction => match parent {
                Some(parent) => parent.as_uuid(),
                None => {
                    return Err(ClientError::InvalidArgument(format!(
                        "transaction {name:?} has no parent service"
                    )))
                }
            },
        };

        let key = (namespace, name.to_string());
        if let Some(id) = self.known.get(&key) {
            return Ok(*id);
        }

        let id = identity::derive(namespace, name);
        debug!(node = %id, %kind, name, "registered node");
        self.pending.push(Node {
            id,
            name: name.to_string(),
            node_type: kind,
            parent_id: parent,
            metadata,
        });
        self.known.insert(key, id);
        Ok(id)
    }

    pub fn is_known(&self, namespace: Uuid, name: &str) -> bool {
        self.known.contains_key(&(namespace, name.to_string()))
    }

    /// Drain the pending nodes, keeping the known set.
    pub fn take_pending(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Node] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn known_len(&self) -> usize {
        self.known.len()
    }
}
