//! The assembled graph document handed to serializers

use super::edge::{Edge, EdgeKind};
use super::metadata::{DataQuality, DisclosureScope};
use super::node::{Node, NodeId, NodeKind};
use crate::import::DiagnosticsReport;
use chrono::NaiveDate;
use serde::Serialize;

/// File-scoped metadata of an assembled document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub snapshot_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_entity: Option<NodeId>,
    /// Scope the document was validated under
    pub disclosure_scope: DisclosureScope,
    /// Defaults that were applied to attestations and edges
    #[serde(skip_serializing_if = "DataQuality::is_empty")]
    pub default_data_quality: DataQuality,
    /// Hex form of the salt used for generated IDs
    pub file_salt: String,
    pub engine_version: String,
}

/// A validated, immutable graph document.
///
/// Only the import pipeline constructs one; consumers get read access.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDocument {
    metadata: DocumentMetadata,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    diagnostics: DiagnosticsReport,
}

impl GraphDocument {
    pub(crate) fn new(
        metadata: DocumentMetadata,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        diagnostics: DiagnosticsReport,
    ) -> Self {
        Self {
            metadata,
            nodes,
            edges,
            diagnostics,
        }
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn diagnostics(&self) -> &DiagnosticsReport {
        &self.diagnostics
    }

    /// Look up a node by ID
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Find the first edge of `kind` running from `source` to `target`
    pub fn find_edge(&self, kind: EdgeKind, source: &str, target: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| {
            e.kind == kind && e.source.as_str() == source && e.target.as_str() == target
        })
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
