//! Disclosure policy
//!
//! Runs over the merged graph: settles every node's sensitivity, applies
//! the scope ceiling and fills data-quality defaults. A person under public
//! scope is the one fatal breach; everything else is handled by withholding
//! or stubbing and reported.

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::error::{FatalError, ImportResult, PolicyViolation};
use super::ids::{disambiguate, FileSalt};
use super::merge::rewrite_references;
use super::record::PendingIdentifier;
use super::resolve::{NodeHandle, ResolvedGraph};
use crate::graph::{
    DataQuality, DisclosureScope, Identifier, IdentifierScheme, NodeAttributes, NodeId, NodeKind,
    Sensitivity,
};
use crate::sheet::SourceRow;
use std::collections::{HashMap, HashSet};

/// Inputs the enforcer needs besides the graph
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// Effective scope (metadata scope tightened by any override)
    pub scope: DisclosureScope,
    pub defaults: &'a DataQuality,
    pub salt: &'a FileSalt,
    /// Every non-empty Persons row, admitted or not
    pub person_rows: &'a [SourceRow],
}

/// A node replaced by a boundary reference, and what it used to expose
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryStub {
    pub id: NodeId,
    /// The node's own ID and the IDs of members merged into it
    pub hidden_ids: Vec<NodeId>,
    /// Every row the node was built from
    pub rows: Vec<SourceRow>,
}

impl BoundaryStub {
    /// Strip anything a diagnostic says about the hidden node.
    ///
    /// Diagnostics on the node's own rows lose their message entirely;
    /// elsewhere, quoted hidden IDs are swapped for the stub's ID.
    pub fn redact(&self, diagnostic: &mut Diagnostic) {
        if diagnostic.kind == DiagnosticKind::BoundaryReplaced {
            return;
        }
        let on_hidden_row = diagnostic
            .row
            .is_some_and(|row| self.rows.contains(&SourceRow::new(diagnostic.sheet, row)));
        if on_hidden_row {
            diagnostic.message =
                format!("details withheld; row belongs to boundary reference '{}'", self.id);
            return;
        }
        let stub = format!("'{}'", self.id);
        for hidden in &self.hidden_ids {
            let quoted = format!("'{}'", hidden);
            if diagnostic.message.contains(&quoted) {
                diagnostic.message = diagnostic.message.replace(&quoted, &stub);
            }
        }
    }
}

/// Apply sensitivity and scope rules.
///
/// Returns [`FatalError::PolicyViolation`] when the scope is public and the
/// workbook has any person rows.
pub fn enforce(graph: &mut ResolvedGraph, ctx: &PolicyContext<'_>) -> ImportResult<Vec<Diagnostic>> {
    // 1. Fatal scope breach
    if ctx.scope == DisclosureScope::Public && !ctx.person_rows.is_empty() {
        return Err(FatalError::PolicyViolation(
            PolicyViolation::PersonUnderPublicScope {
                rows: ctx.person_rows.to_vec(),
            },
        ));
    }

    let mut diagnostics = Vec::new();
    let live: Vec<NodeHandle> = graph.arena.live().map(|(h, _)| h).collect();

    // 2. Sensitivity defaults
    let mut over_ceiling = Vec::new();
    for &handle in &live {
        let node = graph.arena.get_mut(handle);
        dedup_identifiers(&mut node.record.identifiers);

        if node.kind() == NodeKind::Person {
            if let Some(stated) = node.record.sensitivity {
                if stated < Sensitivity::Confidential {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::SensitivityRaised,
                            node.record.origin,
                            format!(
                                "person '{}' is always confidential; stated {} was raised",
                                node.id, stated
                            ),
                        )
                        .in_column("sensitivity"),
                    );
                }
            }
            node.sensitivity = Sensitivity::Confidential;
            for pending in node.record.identifiers.iter_mut() {
                if !pending.explicit_sensitivity {
                    pending.identifier.sensitivity = Identifier::default_sensitivity_for_person();
                }
            }
            continue;
        }

        let stated = node.record.sensitivity.or_else(|| {
            node.record
                .identifiers
                .iter()
                .filter_map(PendingIdentifier::stated_sensitivity)
                .max()
        });
        node.sensitivity = stated.unwrap_or_else(|| node.kind().default_sensitivity());
        if !ctx.scope.permits(node.sensitivity) {
            over_ceiling.push(handle);
        }
    }

    // 3. Boundary stubs for nodes above the ceiling
    let mut taken: HashSet<String> = graph
        .arena
        .live()
        .map(|(_, n)| n.id.as_str().to_string())
        .collect();
    let mut renamed: HashMap<NodeId, NodeId> = HashMap::new();
    for handle in over_ceiling {
        let node = graph.arena.get_mut(handle);
        let old_id = node.id.clone();
        let token = ctx.salt.token(old_id.as_str());
        let new_id = disambiguate(format!("boundary-{}", token), &taken);
        taken.insert(new_id.clone());

        diagnostics.push(Diagnostic::new(
            DiagnosticKind::BoundaryReplaced,
            node.record.origin,
            format!(
                "{} node is {}, above what {} scope allows; replaced by '{}'",
                node.kind(),
                node.sensitivity,
                ctx.scope,
                new_id
            ),
        ));

        let origin = node.record.origin;
        let mut hidden_ids = vec![old_id.clone()];
        if let Some(merge) = node.merge.take() {
            hidden_ids.extend(merge.members);
        }
        graph.stubs.push(BoundaryStub {
            id: NodeId::from(new_id.clone()),
            hidden_ids,
            rows: std::mem::replace(&mut node.sources, vec![origin]),
        });

        node.record.attributes = NodeAttributes::BoundaryRef;
        node.record.name = None;
        node.record.sensitivity = None;
        node.record.data_quality = DataQuality::default();
        node.record.attests = None;
        node.record.identifiers = vec![PendingIdentifier {
            identifier: Identifier::new(IdentifierScheme::Opaque, token)
                .with_sensitivity(Sensitivity::Public),
            explicit_sensitivity: true,
            from_identifiers_sheet: false,
            origin,
        }];
        node.sensitivity = Sensitivity::Public;

        let new_id = NodeId::from(new_id);
        graph.arena.rename(handle, new_id.clone());
        renamed.insert(old_id, new_id);
    }
    rewrite_references(graph, &renamed);

    // 4. Withhold identifiers above the ceiling
    for &handle in &live {
        let node = graph.arena.get_mut(handle);
        let node_id = node.id.clone();
        node.record.identifiers.retain(|pending| {
            let sensitivity = pending.identifier.sensitivity;
            if ctx.scope.permits(sensitivity) {
                return true;
            }
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::IdentifierWithheld,
                pending.origin,
                format!(
                    "{} identifier of '{}' is {}, above what {} scope allows",
                    pending.identifier.scheme, node_id, sensitivity, ctx.scope
                ),
            ));
            false
        });
    }

    // 5. Data-quality defaults
    if !ctx.defaults.is_empty() {
        for &handle in &live {
            let node = graph.arena.get_mut(handle);
            if node.kind() == NodeKind::Attestation {
                node.record.data_quality.fill_from(ctx.defaults);
            }
        }
        for edge in &mut graph.edges {
            edge.data_quality.fill_from(ctx.defaults);
        }
    }

    tracing::info!(
        scope = %ctx.scope,
        boundary_refs = renamed.len(),
        diagnostics = diagnostics.len(),
        "disclosure policy applied"
    );
    Ok(diagnostics)
}

/// Keep the first identifier for each (scheme, value).
fn dedup_identifiers(identifiers: &mut Vec<PendingIdentifier>) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    identifiers.retain(|p| {
        let (scheme, value) = p.identifier.dedup_key();
        seen.insert((scheme.to_string(), value.to_string()))
    });
}
