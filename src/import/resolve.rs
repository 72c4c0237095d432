//! Reference resolution
//!
//! Builds one arena holding every node across all sheets, indexed by ID,
//! then resolves each reference against it. Edges leave this stage carrying
//! arena handles instead of strings. Anything that does not resolve is
//! reported and left out; nothing here is fatal.

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::ids::{AssignedNode, AssignedRecords};
use super::policy::BoundaryStub;
use super::record::{EndpointRef, NodeRecord};
use crate::graph::{
    DataQuality, EdgeId, EdgeKind, EdgeProperties, EquivalenceAssertion, MergeProvenance,
    NodeAttributes, NodeId, NodeKind, Sensitivity,
};
use crate::sheet::SourceRow;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Stable index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ArenaNode {
    pub id: NodeId,
    pub record: NodeRecord,
    /// Final sensitivity; the kind default until policy runs
    pub sensitivity: Sensitivity,
    /// Rows this node was built from
    pub sources: Vec<SourceRow>,
    /// Set when a merge folded this node into another
    pub absorbed_into: Option<NodeHandle>,
    pub merge: Option<MergeProvenance>,
}

impl ArenaNode {
    fn new(id: NodeId, record: NodeRecord) -> Self {
        Self {
            id,
            sensitivity: record.kind().default_sensitivity(),
            sources: vec![record.origin],
            record,
            absorbed_into: None,
            merge: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.record.kind()
    }

    pub fn is_live(&self) -> bool {
        self.absorbed_into.is_none()
    }
}

/// Every node in sheet-then-row order, with an ID index
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<ArenaNode>,
    index: HashMap<String, NodeHandle>,
}

impl NodeArena {
    fn push(&mut self, node: ArenaNode) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.index.insert(node.id.as_str().to_string(), handle);
        self.nodes.push(node);
        handle
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<NodeHandle> {
        self.index.get(id).copied()
    }

    pub fn get(&self, handle: NodeHandle) -> &ArenaNode {
        &self.nodes[handle.0]
    }

    pub fn get_mut(&mut self, handle: NodeHandle) -> &mut ArenaNode {
        &mut self.nodes[handle.0]
    }

    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> {
        (0..self.nodes.len()).map(NodeHandle)
    }

    /// Nodes not absorbed by a merge
    pub fn live(&self) -> impl Iterator<Item = (NodeHandle, &ArenaNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_live())
            .map(|(i, n)| (NodeHandle(i), n))
    }

    /// Give a node a new ID, keeping its handle.
    pub fn rename(&mut self, handle: NodeHandle, id: NodeId) {
        let node = &mut self.nodes[handle.0];
        self.index.remove(node.id.as_str());
        self.index.insert(id.as_str().to_string(), handle);
        node.id = id;
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

/// An edge whose endpoints resolved and passed the kind check
#[derive(Debug, Clone)]
pub struct ResolvedEdge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: NodeHandle,
    pub target: NodeHandle,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub properties: EdgeProperties,
    pub data_quality: DataQuality,
    pub origin: SourceRow,
}

/// A same-as assertion between two existing nodes of the same kind
#[derive(Debug, Clone)]
pub struct Equivalence {
    pub a: NodeHandle,
    pub b: NodeHandle,
    pub assertion: EquivalenceAssertion,
    pub origin: SourceRow,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub arena: NodeArena,
    pub edges: Vec<ResolvedEdge>,
    pub equivalences: Vec<Equivalence>,
    pub reporting_entity: Option<NodeHandle>,
    /// Nodes the policy stage replaced with boundary references
    pub stubs: Vec<BoundaryStub>,
}

fn dangling(origin: SourceRow, column: &str, id: &NodeId) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::DanglingReference,
        origin,
        format!("{} '{}' does not match any node", column, id),
    )
    .in_column(column)
}

fn mismatch(origin: SourceRow, column: &str, detail: String) -> Diagnostic {
    Diagnostic::new(DiagnosticKind::TypeMismatch, origin, detail).in_column(column)
}

/// Resolve every cross-sheet reference.
pub fn resolve(
    records: AssignedRecords,
    reporting_entity: Option<&(NodeId, SourceRow)>,
) -> (ResolvedGraph, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut graph = ResolvedGraph::default();

    // 1. Arena and index
    let mut attestations: Vec<(NodeHandle, EdgeId)> = Vec::new();
    for AssignedNode {
        id,
        record,
        attestation_edge,
    } in records.nodes
    {
        let handle = graph.arena.push(ArenaNode::new(id, record));
        if let Some(edge_id) = attestation_edge {
            attestations.push((handle, edge_id));
        }
    }
    let kinds: Vec<NodeKind> = graph.arena.nodes.iter().map(ArenaNode::kind).collect();

    // 2. Identifiers sheet
    for record in records.identifiers {
        match graph.arena.lookup(record.node_id.as_str()) {
            Some(handle) => graph
                .arena
                .get_mut(handle)
                .record
                .identifiers
                .push(record.identifier),
            None => diagnostics.push(dangling(
                record.identifier.origin,
                "node_id",
                &record.node_id,
            )),
        }
    }

    // 3. Node-valued attributes
    let index = &graph.arena.index;
    for node in graph.arena.nodes.iter_mut() {
        let origin = node.record.origin;
        for reference in node.record.attributes.references_mut() {
            let Some(target) = reference.target.as_ref() else {
                continue;
            };
            match index.get(target.as_str()) {
                None => {
                    diagnostics.push(dangling(origin, reference.column, target));
                    *reference.target = None;
                }
                Some(h) if kinds[h.0] != reference.expected => {
                    diagnostics.push(mismatch(
                        origin,
                        reference.column,
                        format!(
                            "{} '{}' is a {} node, expected {}",
                            reference.column, target, kinds[h.0], reference.expected
                        ),
                    ));
                    *reference.target = None;
                }
                Some(_) => {}
            }
        }
    }

    // 4. Sheet edges
    for assigned in records.edges {
        let record = assigned.record;
        let endpoint = |end: &EndpointRef, diagnostics: &mut Vec<Diagnostic>| {
            let handle = graph.arena.lookup(end.id.as_str());
            if handle.is_none() {
                diagnostics.push(dangling(record.origin, end.column, &end.id));
            }
            handle
        };
        let source = endpoint(&record.source, &mut diagnostics);
        let target = endpoint(&record.target, &mut diagnostics);
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };
        if !record.kind.permits(kinds[source.0], kinds[target.0]) {
            diagnostics.push(mismatch(
                record.origin,
                "type",
                format!(
                    "{} edge cannot run from {} '{}' to {} '{}'",
                    record.kind,
                    kinds[source.0],
                    record.source.id,
                    kinds[target.0],
                    record.target.id
                ),
            ));
            continue;
        }
        graph.edges.push(ResolvedEdge {
            id: assigned.id,
            kind: record.kind,
            source,
            target,
            valid_from: record.valid_from,
            valid_to: record.valid_to,
            properties: record.properties,
            data_quality: record.data_quality,
            origin: record.origin,
        });
    }

    // 5. attested_by edges from attestation rows
    for (handle, edge_id) in attestations {
        let node = graph.arena.get(handle);
        let origin = node.record.origin;
        let Some(attested) = node.record.attests.clone() else {
            continue;
        };
        let Some(target) = graph.arena.lookup(attested.as_str()) else {
            diagnostics.push(dangling(origin, "attested_entity_id", &attested));
            continue;
        };
        if !EdgeKind::AttestedBy.permits(NodeKind::Attestation, kinds[target.0]) {
            diagnostics.push(mismatch(
                origin,
                "attested_entity_id",
                format!(
                    "attested_entity_id '{}' is a {} node, which cannot be attested",
                    attested, kinds[target.0]
                ),
            ));
            continue;
        }
        let (valid_from, valid_to) = match &node.record.attributes {
            NodeAttributes::Attestation(a) => (a.valid_from, a.valid_to),
            _ => (None, None),
        };
        graph.edges.push(ResolvedEdge {
            id: edge_id,
            kind: EdgeKind::AttestedBy,
            source: handle,
            target,
            valid_from,
            valid_to,
            properties: EdgeProperties::default(),
            data_quality: node.record.data_quality.clone(),
            origin,
        });
    }

    // 6. Same-as assertions
    for record in records.same_as {
        let a = graph.arena.lookup(record.entity_a.as_str());
        let b = graph.arena.lookup(record.entity_b.as_str());
        if a.is_none() {
            diagnostics.push(dangling(record.origin, "entity_a", &record.entity_a));
        }
        if b.is_none() {
            diagnostics.push(dangling(record.origin, "entity_b", &record.entity_b));
        }
        let (Some(a), Some(b)) = (a, b) else {
            continue;
        };
        if kinds[a.0] != kinds[b.0] {
            diagnostics.push(mismatch(
                record.origin,
                "entity_b",
                format!(
                    "cannot merge {} '{}' with {} '{}'",
                    kinds[a.0], record.entity_a, kinds[b.0], record.entity_b
                ),
            ));
            continue;
        }
        if a == b {
            continue;
        }
        graph.equivalences.push(Equivalence {
            a,
            b,
            assertion: EquivalenceAssertion {
                entity_a: record.entity_a,
                entity_b: record.entity_b,
                confidence: record.confidence,
                basis: record.basis,
            },
            origin: record.origin,
        });
    }

    // 7. Metadata reporting_entity
    if let Some((id, origin)) = reporting_entity {
        match graph.arena.lookup(id.as_str()) {
            None => diagnostics.push(dangling(*origin, "reporting_entity", id)),
            Some(h) if kinds[h.0] != NodeKind::Organization => diagnostics.push(mismatch(
                *origin,
                "reporting_entity",
                format!("reporting_entity '{}' is a {} node, expected organization", id, kinds[h.0]),
            )),
            Some(h) => graph.reporting_entity = Some(h),
        }
    }

    tracing::debug!(
        nodes = graph.arena.len(),
        edges = graph.edges.len(),
        equivalences = graph.equivalences.len(),
        "references resolved"
    );
    (graph, diagnostics)
}
