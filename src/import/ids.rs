//! File salt and ID assignment
//!
//! Rows that declare an ID keep it. Rows with a blank ID get one derived
//! from the file salt and the row's position, so the same workbook imported
//! with the same salt always produces the same IDs. Node and edge IDs are
//! separate namespaces.

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::record::{EdgeRecord, IdentifierRecord, NodeRecord, RecordSet, SameAsRecord};
use crate::graph::{EdgeId, NodeId};
use crate::sheet::SourceRow;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaltError {
    #[error("salt must be 64 hex characters, got {0}")]
    WrongLength(usize),
    #[error("salt contains a non-hex character")]
    NotHex,
    #[error("system random source failed: {0}")]
    Random(String),
}

/// 32 random bytes scoping generated IDs to one import.
#[derive(Clone, PartialEq, Eq)]
pub struct FileSalt([u8; 32]);

impl FileSalt {
    /// Fresh salt from the operating system's random source.
    pub fn generate() -> Result<Self, SaltError> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| SaltError::Random(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(text: &str) -> Result<Self, SaltError> {
        let text = text.trim();
        if text.len() != 64 {
            return Err(SaltError::WrongLength(text.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(text, &mut bytes).map_err(|_| SaltError::NotHex)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short stable token for `input` under this salt.
    pub fn token(&self, input: &str) -> String {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, &self.0);
        let id = Uuid::new_v5(&namespace, input.as_bytes());
        id.simple().to_string()[..12].to_string()
    }
}

impl std::fmt::Debug for FileSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileSalt(..)")
    }
}

/// `base`, or `base-1`, `base-2`, ... whichever is not yet taken.
pub(crate) fn disambiguate(base: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn row_key(origin: SourceRow) -> String {
    format!("{}/{}", origin.sheet, origin.row)
}

/// A node record with its final ID
#[derive(Debug, Clone)]
pub struct AssignedNode {
    pub id: NodeId,
    pub record: NodeRecord,
    /// ID of the attested_by edge an attestation row will produce
    pub attestation_edge: Option<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct AssignedEdge {
    pub id: EdgeId,
    pub record: EdgeRecord,
}

/// All admitted records with IDs, still in sheet-then-row order
#[derive(Debug, Clone, Default)]
pub struct AssignedRecords {
    pub nodes: Vec<AssignedNode>,
    pub edges: Vec<AssignedEdge>,
    pub same_as: Vec<SameAsRecord>,
    pub identifiers: Vec<IdentifierRecord>,
}

/// Assign IDs to every node and edge.
///
/// Declared IDs are registered first, in sheet-then-row order; a repeat is
/// reported as [`DiagnosticKind::DuplicateId`] and its row dropped. Blank
/// IDs are generated afterwards, skipping anything already taken.
pub fn assign_ids(records: RecordSet, salt: &FileSalt) -> (AssignedRecords, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    // 1. Declared node IDs
    let mut node_ids: HashSet<String> = HashSet::new();
    let mut nodes: Vec<(Option<NodeId>, NodeRecord)> = Vec::with_capacity(records.nodes.len());
    for record in records.nodes {
        match &record.declared_id {
            Some(id) if !node_ids.insert(id.as_str().to_string()) => {
                diagnostics.push(duplicate(record.origin, id.as_str()));
            }
            Some(id) => nodes.push((Some(id.clone()), record)),
            None => nodes.push((None, record)),
        }
    }

    // 2. Declared edge IDs
    let mut edge_ids: HashSet<String> = HashSet::new();
    let mut edges: Vec<(Option<EdgeId>, EdgeRecord)> = Vec::with_capacity(records.edges.len());
    for record in records.edges {
        match &record.declared_id {
            Some(id) if !edge_ids.insert(id.as_str().to_string()) => {
                diagnostics.push(duplicate(record.origin, id.as_str()));
            }
            Some(id) => edges.push((Some(id.clone()), record)),
            None => edges.push((None, record)),
        }
    }

    // 3. Generated node IDs
    let nodes = nodes
        .into_iter()
        .map(|(declared, record)| {
            let id = declared.unwrap_or_else(|| {
                let base = format!(
                    "{}-{}",
                    record.kind().id_prefix(),
                    salt.token(&row_key(record.origin))
                );
                let id = disambiguate(base, &node_ids);
                node_ids.insert(id.clone());
                NodeId::from(id)
            });
            (id, record)
        })
        .collect::<Vec<_>>();

    // 4. Generated edge IDs, including the attested_by edge of each attestation
    let edges = edges
        .into_iter()
        .map(|(declared, record)| {
            let id = declared.unwrap_or_else(|| {
                let base = format!("edge-{}", salt.token(&row_key(record.origin)));
                let id = disambiguate(base, &edge_ids);
                edge_ids.insert(id.clone());
                EdgeId::from_string(id)
            });
            AssignedEdge { id, record }
        })
        .collect();

    let nodes = nodes
        .into_iter()
        .map(|(id, record)| {
            let attestation_edge = record.attests.as_ref().map(|_| {
                let key = format!("{}/attested_by", row_key(record.origin));
                let id = disambiguate(format!("edge-{}", salt.token(&key)), &edge_ids);
                edge_ids.insert(id.clone());
                EdgeId::from_string(id)
            });
            AssignedNode {
                id,
                record,
                attestation_edge,
            }
        })
        .collect();

    (
        AssignedRecords {
            nodes,
            edges,
            same_as: records.same_as,
            identifiers: records.identifiers,
        },
        diagnostics,
    )
}

fn duplicate(origin: SourceRow, id: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::DuplicateId,
        origin,
        format!("id '{}' is already used by an earlier row", id),
    )
    .in_column("id")
}
