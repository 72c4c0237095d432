//! Final assembly into a [`GraphDocument`]

use super::diagnostic::{Diagnostic, DiagnosticsReport};
use super::resolve::ResolvedGraph;
use crate::graph::{
    DataQuality, DisclosureScope, DocumentMetadata, Edge, GraphDocument, Node, NodeKind,
};
use chrono::NaiveDate;

/// File-level values the assembler stamps on the document
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    pub snapshot_date: NaiveDate,
    pub scope: DisclosureScope,
    pub defaults: DataQuality,
    pub salt_hex: String,
}

/// Turn the policy-checked graph into an immutable document.
///
/// Nodes come out in sheet-then-row order, edges ordered by the row they
/// were read from. Diagnostics are redacted against every boundary stub
/// before they join the document.
pub fn assemble(
    graph: ResolvedGraph,
    context: AssemblyContext,
    mut diagnostics: Vec<Diagnostic>,
) -> GraphDocument {
    for stub in &graph.stubs {
        diagnostics.iter_mut().for_each(|d| stub.redact(d));
    }

    let arena = &graph.arena;
    let nodes: Vec<Node> = arena
        .live()
        .map(|(_, n)| {
            let record = n.record.clone();
            let data_quality = (record.kind() == NodeKind::Attestation
                && !record.data_quality.is_empty())
            .then_some(record.data_quality);
            Node {
                id: n.id.clone(),
                attributes: record.attributes,
                name: record.name,
                sensitivity: n.sensitivity,
                identifiers: record
                    .identifiers
                    .into_iter()
                    .map(|p| p.identifier)
                    .collect(),
                data_quality,
                merge: n.merge.clone(),
                sources: n.sources.clone(),
            }
        })
        .collect();

    let mut edges: Vec<Edge> = graph
        .edges
        .iter()
        .map(|e| Edge {
            id: e.id.clone(),
            kind: e.kind,
            source: arena.get(e.source).id.clone(),
            target: arena.get(e.target).id.clone(),
            valid_from: e.valid_from,
            valid_to: e.valid_to,
            properties: e.properties.clone(),
            data_quality: (!e.data_quality.is_empty()).then(|| e.data_quality.clone()),
            source_row: e.origin,
        })
        .collect();
    edges.sort_by_key(|e| e.source_row);

    let metadata = DocumentMetadata {
        snapshot_date: context.snapshot_date,
        reporting_entity: graph.reporting_entity.map(|h| arena.get(h).id.clone()),
        disclosure_scope: context.scope,
        default_data_quality: context.defaults,
        file_salt: context.salt_hex,
        engine_version: crate::VERSION.to_string(),
    };

    tracing::info!(
        nodes = nodes.len(),
        edges = edges.len(),
        diagnostics = diagnostics.len(),
        "graph document assembled"
    );
    GraphDocument::new(
        metadata,
        nodes,
        edges,
        DiagnosticsReport::from_unsorted(diagnostics),
    )
}
