// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core graph types shared by every component.
//!
//! - [`NodeId`] - the deterministic identifier of a graph vertex
//! - [`Node`] - a service, transaction, or external endpoint
//! - [`Edge`] - an aggregated, status-partitioned count of calls in one bucket
//!
//! `Node` and `Edge` serialize directly into the collector's submission
//! format, so there is no separate wire representation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ClientError;

/// Identifier of a node in the service graph.
///
/// Node ids are name-based UUIDs, so two processes describing the same
/// logical node agree on its id without talking to each other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse either the hyphenated or the simple (32 hex digits) form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get a short representation (first 8 characters).
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<NodeId> for Uuid {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl serde::Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Self)
    }
}

/// Kind of graph node.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Service,
    Transaction,
    /// An uninstrumented peer observed only from the calling side.
    ///
    /// Submitted as a `service`: the collector knows only services and
    /// transactions, and the `external:` name prefix already marks it.
    External,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Service => "service",
            NodeType::Transaction => "transaction",
            NodeType::External => "external",
        }
    }

    /// The `node_type` value sent to the collector.
    pub fn wire_name(self) -> &'static str {
        match self {
            NodeType::Service | NodeType::External => "service",
            NodeType::Transaction => "transaction",
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(NodeType::Service),
            "transaction" => Ok(NodeType::Transaction),
            "external" => Ok(NodeType::External),
            other => Err(ClientError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Outcome of a call between two nodes.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Ok,
    ExpectedError,
    UnexpectedError,
}

impl EdgeStatus {
    /// All statuses in export order.
    pub const ALL: [EdgeStatus; 3] = [
        EdgeStatus::Ok,
        EdgeStatus::ExpectedError,
        EdgeStatus::UnexpectedError,
    ];

    /// Classify an HTTP response status code.
    ///
    /// 4xx is an expected error, 5xx and above unexpected, everything else ok.
    pub fn from_http_status(code: u16) -> Self {
        match code {
            400..=499 => EdgeStatus::ExpectedError,
            500.. => EdgeStatus::UnexpectedError,
            _ => EdgeStatus::Ok,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            EdgeStatus::Ok => 0,
            EdgeStatus::ExpectedError => 1,
            EdgeStatus::UnexpectedError => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeStatus::Ok => "ok",
            EdgeStatus::ExpectedError => "expected_error",
            EdgeStatus::UnexpectedError => "unexpected_error",
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(EdgeStatus::Ok),
            "expected_error" => Ok(EdgeStatus::ExpectedError),
            "unexpected_error" => Ok(EdgeStatus::UnexpectedError),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown edge status: {other}"
            ))),
        }
    }
}

/// Free-form metadata attached to nodes and edge buckets.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl NodeMetadata {
    pub fn new(description: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            class: Some(class.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.class.is_none()
    }
}

/// A vertex of the service graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Node {
    #[serde(rename = "node_id")]
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub parent_id: Option<NodeId>,
    #[serde(flatten)]
    pub metadata: NodeMetadata,
}

/// Calls from one node to another with one outcome, within one time bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Start of the aggregation bucket.
    #[serde(serialize_with = "serialize_millis")]
    pub ts: DateTime<Utc>,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub status: EdgeStatus,
    pub n: u32,
    #[serde(flatten)]
    pub metadata: NodeMetadata,
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T12:34:00.000Z`.
fn serialize_millis<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_node_id_display() {
        let uuid = Uuid::parse_str("50e1147a-2643-4b97-a0bd-be87f84851c3").unwrap();
        let id = NodeId::from_uuid(uuid);
        assert_eq!(id.to_string(), "50e1147a-2643-4b97-a0bd-be87f84851c3");
        assert_eq!(id.short(), "50e1147a");
        assert_eq!(format!("{:?}", id), "NodeId(50e1147a)");
    }

    #[test]
    fn test_node_id_parse_simple_form() {
        let hyphenated = NodeId::parse("c221a8be-f9be-11eb-9a03-0242ac130003").unwrap();
        let simple = NodeId::parse("c221a8bef9be11eb9a030242ac130003").unwrap();
        assert_eq!(hyphenated, simple);
        assert!(NodeId::parse("not-a-valid-id").is_none());
    }

    #[test]
    fn test_node_id_serde() {
        let id = NodeId::from_uuid(Uuid::new_v4());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let parsed: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_node_type_from_str() {
        assert_eq!("service".parse::<NodeType>().unwrap(), NodeType::Service);
        assert_eq!("transaction".parse::<NodeType>().unwrap(), NodeType::Transaction);
        assert_eq!("external".parse::<NodeType>().unwrap(), NodeType::External);

        let err = "endpoint".parse::<NodeType>().unwrap_err();
        assert!(matches!(err, ClientError::UnknownNodeType(ref t) if t == "endpoint"));
    }

    #[test]
    fn test_external_node_submitted_as_service() {
        assert_eq!(serde_json::to_string(&NodeType::External).unwrap(), "\"service\"");
        assert_eq!(serde_json::to_string(&NodeType::Transaction).unwrap(), "\"transaction\"");
        assert_eq!(NodeType::External.to_string(), "external");
    }

    #[test]
    fn test_edge_status_from_http_status() {
        assert_eq!(EdgeStatus::from_http_status(200), EdgeStatus::Ok);
        assert_eq!(EdgeStatus::from_http_status(302), EdgeStatus::Ok);
        assert_eq!(EdgeStatus::from_http_status(400), EdgeStatus::ExpectedError);
        assert_eq!(EdgeStatus::from_http_status(404), EdgeStatus::ExpectedError);
        assert_eq!(EdgeStatus::from_http_status(499), EdgeStatus::ExpectedError);
        assert_eq!(EdgeStatus::from_http_status(500), EdgeStatus::UnexpectedError);
        assert_eq!(EdgeStatus::from_http_status(503), EdgeStatus::UnexpectedError);
        assert_eq!(EdgeStatus::from_http_status(101), EdgeStatus::Ok);
    }

    #[test]
    fn test_edge_serializes_millis_timestamp() {
        let id = NodeId::from_uuid(Uuid::nil());
        let edge = Edge {
            ts: Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 0).unwrap(),
            from_node_id: id,
            to_node_id: id,
            status: EdgeStatus::ExpectedError,
            n: 2,
            metadata: NodeMetadata::default(),
        };

        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["ts"], "2024-05-01T12:34:00.000Z");
        assert_eq!(value["status"], "expected_error");
        assert_eq!(value["n"], 2);
        assert!(value.get("description").is_none());
        assert!(value.get("class").is_none());
    }

    #[test]
    fn test_node_serializes_wire_names() {
        let node = Node {
            id: NodeId::from_uuid(Uuid::nil()),
            name: "checkout".to_string(),
            node_type: NodeType::Service,
            parent_id: None,
            metadata: NodeMetadata::default().with_class("python http"),
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["node_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["node_type"], "service");
        assert!(value["parent_id"].is_null());
        assert_eq!(value["class"], "python http");
        assert!(value.get("description").is_none());
    }
}
