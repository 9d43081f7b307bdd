// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Deterministic node identity.
//!
//! Node ids are UUIDv5 values: the node name hashed under a namespace UUID.
//! Services hash under the deployment-wide service namespace, transactions
//! under their parent service's id, so equal transaction names in different
//! services never collide.

use uuid::Uuid;

use crate::types::NodeId;

/// Default service namespace shared by every process of a deployment.
pub const DEFAULT_SERVICE_NAMESPACE: Uuid =
    Uuid::from_u128(0x50e1147a_2643_4b97_a0bd_be87f84851c3);

/// Prefix for nodes synthesized for uninstrumented peers.
pub const EXTERNAL_PREFIX: &str = "external:";

/// Derive the id of `name` under `namespace`.
pub fn derive(namespace: Uuid, name: &str) -> NodeId {
    NodeId::from_uuid(Uuid::new_v5(&namespace, name.as_bytes()))
}

pub fn service_id(service_namespace: Uuid, service_name: &str) -> NodeId {
    derive(service_namespace, service_name)
}

pub fn transaction_id(service: NodeId, transaction_name: &str) -> NodeId {
    derive(service.as_uuid(), transaction_name)
}

/// Node name for an uninstrumented host.
pub fn external_node_name(host: &str) -> String {
    format!("{EXTERNAL_PREFIX}{host}")
}

pub fn external_id(service_namespace: Uuid, host: &str) -> NodeId {
    derive(service_namespace, &external_node_name(host))
}
