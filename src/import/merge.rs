//! Same-as merging
//!
//! Equivalent nodes are collapsed into the first member of their group.
//! Fields set on only one member are taken as-is; fields with different
//! values on several members are settled by [`ConflictPolicy`], and each
//! discarded value is reported and kept in the canonical node's provenance.

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::record::NodeRecord;
use super::resolve::{NodeHandle, ResolvedGraph};
use super::union_find::UnionFind;
use crate::graph::{
    AlternateValue, AttestationAttrs, ConsignmentAttrs, DataQuality, EdgeKind, FacilityAttrs,
    GoodAttrs, MergeProvenance, NodeAttributes, NodeId, OrganizationAttrs, PersonAttrs,
};
use crate::sheet::SourceRow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;

/// Which value survives when merged nodes disagree on a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the value from the earliest row in sheet-then-row order
    #[default]
    FirstEncountered,
    /// Keep the value from the latest row
    LastEncountered,
}

/// Settles one field at a time across the members of a merge group.
struct FieldMerger<'a> {
    policy: ConflictPolicy,
    canonical: &'a NodeId,
    members: &'a [(NodeId, SourceRow)],
    alternates: Vec<AlternateValue>,
    diagnostics: Vec<Diagnostic>,
}

impl FieldMerger<'_> {
    /// `values` holds the field's value on each member, in member order.
    fn pick<T: PartialEq + Display>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = Option<T>>,
    ) -> Option<T> {
        let mut present: Vec<(usize, T)> = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
            .collect();
        if present.is_empty() {
            return None;
        }
        let winner = match self.policy {
            ConflictPolicy::FirstEncountered => 0,
            ConflictPolicy::LastEncountered => present.len() - 1,
        };
        let (_, kept) = present.remove(winner);
        for (member, value) in present {
            if value == kept {
                continue;
            }
            let (source, origin) = &self.members[member];
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MergeConflict,
                    *origin,
                    format!(
                        "{} conflicts while merging '{}' into '{}': kept '{}', discarded '{}'",
                        field, source, self.canonical, kept, value
                    ),
                )
                .in_column(field),
            );
            self.alternates.push(AlternateValue {
                field: field.to_string(),
                value: value.to_string(),
                source: source.clone(),
            });
        }
        Some(kept)
    }
}

macro_rules! members_of {
    ($records:expr, $variant:ident) => {
        $records
            .iter()
            .filter_map(|r| match &r.attributes {
                NodeAttributes::$variant(a) => Some(a),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
}

fn merge_attributes(m: &mut FieldMerger<'_>, records: &[NodeRecord]) -> NodeAttributes {
    macro_rules! field {
        ($all:expr, $name:ident) => {
            m.pick(stringify!($name), $all.iter().map(|a| a.$name.clone()))
        };
    }

    match &records[0].attributes {
        NodeAttributes::Organization(_) => {
            let all: Vec<&OrganizationAttrs> = members_of!(records, Organization);
            NodeAttributes::Organization(OrganizationAttrs {
                jurisdiction: field!(all, jurisdiction),
                status: field!(all, status),
                risk_tier: field!(all, risk_tier),
                kraljic_quadrant: field!(all, kraljic_quadrant),
                approval_status: field!(all, approval_status),
            })
        }
        NodeAttributes::Facility(_) => {
            let all: Vec<&FacilityAttrs> = members_of!(records, Facility);
            NodeAttributes::Facility(FacilityAttrs {
                operator: m.pick("operator_id", all.iter().map(|a| a.operator.clone())),
                address: field!(all, address),
                latitude: field!(all, latitude),
                longitude: field!(all, longitude),
            })
        }
        NodeAttributes::Good(_) => {
            let all: Vec<&GoodAttrs> = members_of!(records, Good);
            NodeAttributes::Good(GoodAttrs {
                commodity_code: field!(all, commodity_code),
                unit: field!(all, unit),
            })
        }
        NodeAttributes::Person(_) => {
            let all: Vec<&PersonAttrs> = members_of!(records, Person);
            NodeAttributes::Person(PersonAttrs {
                jurisdiction: field!(all, jurisdiction),
                role: field!(all, role),
                nationality: field!(all, nationality),
            })
        }
        NodeAttributes::Attestation(_) => {
            let all: Vec<&AttestationAttrs> = members_of!(records, Attestation);
            NodeAttributes::Attestation(AttestationAttrs {
                attestation_type: field!(all, attestation_type),
                standard: field!(all, standard),
                issuer: field!(all, issuer),
                valid_from: field!(all, valid_from),
                valid_to: field!(all, valid_to),
                outcome: field!(all, outcome),
                status: field!(all, status),
                reference: field!(all, reference),
                risk_severity: field!(all, risk_severity),
                risk_likelihood: field!(all, risk_likelihood),
                scope: field!(all, scope),
            })
        }
        NodeAttributes::Consignment(_) => {
            let all: Vec<&ConsignmentAttrs> = members_of!(records, Consignment);
            NodeAttributes::Consignment(ConsignmentAttrs {
                lot_id: field!(all, lot_id),
                quantity: field!(all, quantity),
                unit: field!(all, unit),
                production_date: field!(all, production_date),
                origin_country: field!(all, origin_country),
                installation: m.pick("installation_id", all.iter().map(|a| a.installation.clone())),
                direct_emissions_co2e: field!(all, direct_emissions_co2e),
                indirect_emissions_co2e: field!(all, indirect_emissions_co2e),
                emission_factor_source: field!(all, emission_factor_source),
            })
        }
        NodeAttributes::BoundaryRef => NodeAttributes::BoundaryRef,
    }
}

/// Fold member records into one, in member order.
fn merge_records(m: &mut FieldMerger<'_>, records: Vec<NodeRecord>) -> Option<NodeRecord> {
    if records.is_empty() {
        return None;
    }
    let attributes = merge_attributes(m, &records);
    let name = m.pick("name", records.iter().map(|r| r.name.clone()));
    let data_quality = DataQuality {
        confidence: m.pick("confidence", records.iter().map(|r| r.data_quality.confidence)),
        source: m.pick("source", records.iter().map(|r| r.data_quality.source.clone())),
        last_verified: m.pick(
            "last_verified",
            records.iter().map(|r| r.data_quality.last_verified),
        ),
    };
    // Stated sensitivities never conflict; the most restrictive one holds.
    let sensitivity = records.iter().filter_map(|r| r.sensitivity).max();

    let mut records = records.into_iter();
    let mut merged = records.next()?;
    let mut seen: HashMap<(String, String), usize> = merged
        .identifiers
        .iter()
        .enumerate()
        .map(|(i, p)| (key(&p.identifier), i))
        .collect();
    for record in records {
        for pending in record.identifiers {
            match seen.get(&key(&pending.identifier)) {
                // Same (scheme, value): labels follow the conflict policy
                Some(&i) => {
                    if m.policy == ConflictPolicy::LastEncountered {
                        merged.identifiers[i] = pending;
                    }
                }
                None => {
                    seen.insert(key(&pending.identifier), merged.identifiers.len());
                    merged.identifiers.push(pending);
                }
            }
        }
        if merged.attests.is_none() {
            merged.attests = record.attests;
        }
    }
    merged.attributes = attributes;
    merged.name = name;
    merged.data_quality = data_quality;
    merged.sensitivity = sensitivity;
    Some(merged)
}

fn key(identifier: &crate::graph::Identifier) -> (String, String) {
    let (scheme, value) = identifier.dedup_key();
    (scheme.to_string(), value.to_string())
}

/// Collapse every same-as group into its canonical node.
///
/// Edges and references to absorbed members are rewritten to the canonical
/// node. Self-loops that result are kept.
pub fn merge_equivalents(graph: &mut ResolvedGraph, policy: ConflictPolicy) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if graph.equivalences.is_empty() {
        return diagnostics;
    }

    let mut uf = UnionFind::new(graph.arena.len());
    for eq in &graph.equivalences {
        uf.union(eq.a.index(), eq.b.index());
    }
    let groups = uf.groups();
    let handles: Vec<NodeHandle> = graph.arena.handles().collect();
    let mut renamed: HashMap<NodeId, NodeId> = HashMap::new();

    for group in &groups {
        let canonical = handles[group[0]];
        let canonical_id = graph.arena.get(canonical).id.clone();
        let members: Vec<(NodeId, SourceRow)> = group
            .iter()
            .map(|&i| {
                let node = graph.arena.get(handles[i]);
                (node.id.clone(), node.record.origin)
            })
            .collect();
        let records: Vec<NodeRecord> = group
            .iter()
            .map(|&i| graph.arena.get(handles[i]).record.clone())
            .collect();

        let mut merger = FieldMerger {
            policy,
            canonical: &canonical_id,
            members: &members,
            alternates: Vec::new(),
            diagnostics: Vec::new(),
        };
        let Some(merged) = merge_records(&mut merger, records) else {
            continue;
        };
        let FieldMerger {
            alternates,
            diagnostics: conflicts,
            ..
        } = merger;
        diagnostics.extend(conflicts);

        let mut sources: Vec<SourceRow> = Vec::new();
        for &i in &group[1..] {
            let member = graph.arena.get_mut(handles[i]);
            member.absorbed_into = Some(canonical);
            sources.append(&mut member.sources);
            renamed.insert(member.id.clone(), canonical_id.clone());
        }
        let assertions = graph
            .equivalences
            .iter()
            .filter(|eq| uf.find(eq.a.index()) == group[0])
            .map(|eq| eq.assertion.clone())
            .collect();

        let node = graph.arena.get_mut(canonical);
        node.record = merged;
        node.sources.extend(sources);
        node.sources.sort();
        node.merge = Some(MergeProvenance {
            members: members[1..].iter().map(|(id, _)| id.clone()).collect(),
            assertions,
            alternates,
        });
        tracing::debug!(
            canonical = %canonical_id,
            members = group.len(),
            "merged equivalent nodes"
        );
    }

    for edge in &mut graph.edges {
        edge.source = handles[uf.find(edge.source.index())];
        edge.target = handles[uf.find(edge.target.index())];
    }
    // Merged attestations attesting the same entity keep one attested_by edge
    let mut attested = HashSet::new();
    let before = graph.edges.len();
    graph
        .edges
        .retain(|e| e.kind != EdgeKind::AttestedBy || attested.insert((e.source, e.target)));
    if graph.edges.len() < before {
        tracing::debug!(
            dropped = before - graph.edges.len(),
            "collapsed duplicate attested_by edges"
        );
    }
    if let Some(h) = graph.reporting_entity {
        graph.reporting_entity = Some(handles[uf.find(h.index())]);
    }
    rewrite_references(graph, &renamed);

    tracing::info!(
        groups = groups.len(),
        conflicts = diagnostics.len(),
        "same-as merge complete"
    );
    diagnostics
}

/// Point node-valued attributes of live nodes at renamed IDs.
pub(crate) fn rewrite_references(graph: &mut ResolvedGraph, renamed: &HashMap<NodeId, NodeId>) {
    if renamed.is_empty() {
        return;
    }
    let handles: Vec<NodeHandle> = graph.arena.live().map(|(h, _)| h).collect();
    for handle in handles {
        let node = graph.arena.get_mut(handle);
        for reference in node.record.attributes.references_mut() {
            if let Some(new_id) = reference.target.as_ref().and_then(|id| renamed.get(id)) {
                *reference.target = Some(new_id.clone());
            }
        }
    }
}
