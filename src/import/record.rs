//! Typed intermediate records produced by the sheet parser
//!
//! Records still carry raw string references; the resolver turns those into
//! arena handles.

use crate::graph::{
    DataQuality, DisclosureScope, EdgeId, EdgeKind, EdgeProperties, Identifier, NodeAttributes,
    NodeId, NodeKind, SameAsConfidence, Sensitivity,
};
use crate::sheet::SourceRow;
use chrono::NaiveDate;

/// An identifier on its way to a node
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIdentifier {
    pub identifier: Identifier,
    /// True when the row stated a sensitivity
    pub explicit_sensitivity: bool,
    /// True when it came from the Identifiers sheet rather than an inline column
    pub from_identifiers_sheet: bool,
    pub origin: SourceRow,
}

impl PendingIdentifier {
    /// Identifier from an inline column on a node sheet
    pub fn inline(identifier: Identifier, origin: SourceRow) -> Self {
        Self {
            identifier,
            explicit_sensitivity: false,
            from_identifiers_sheet: false,
            origin,
        }
    }

    /// Sensitivity stated on an Identifiers-sheet row, if any
    pub fn stated_sensitivity(&self) -> Option<Sensitivity> {
        (self.from_identifiers_sheet && self.explicit_sensitivity)
            .then_some(self.identifier.sensitivity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub origin: SourceRow,
    pub declared_id: Option<NodeId>,
    pub name: Option<String>,
    pub attributes: NodeAttributes,
    /// Sensitivity from the node sheet's own column
    pub sensitivity: Option<Sensitivity>,
    pub identifiers: Vec<PendingIdentifier>,
    /// Explicit data-quality fields; only attestations carry them
    pub data_quality: DataQuality,
    /// Entity an attestation attests (`attested_entity_id`)
    pub attests: Option<NodeId>,
}

impl NodeRecord {
    pub fn new(origin: SourceRow, attributes: NodeAttributes) -> Self {
        Self {
            origin,
            declared_id: None,
            name: None,
            attributes,
            sensitivity: None,
            identifiers: Vec::new(),
            data_quality: DataQuality::default(),
            attests: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.attributes.kind()
    }
}

/// One end of an edge as written in the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRef {
    pub column: &'static str,
    pub id: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub origin: SourceRow,
    pub declared_id: Option<EdgeId>,
    pub kind: EdgeKind,
    pub source: EndpointRef,
    pub target: EndpointRef,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub properties: EdgeProperties,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SameAsRecord {
    pub origin: SourceRow,
    pub entity_a: NodeId,
    pub entity_b: NodeId,
    pub confidence: Option<SameAsConfidence>,
    pub basis: Option<String>,
}

/// An Identifiers-sheet row
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRecord {
    pub node_id: NodeId,
    pub identifier: PendingIdentifier,
}

/// Any record a data row can produce
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(NodeRecord),
    Edge(EdgeRecord),
    SameAs(SameAsRecord),
    Identifier(IdentifierRecord),
}

/// Parsed Metadata sheet
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub snapshot_date: NaiveDate,
    pub reporting_entity: Option<(NodeId, SourceRow)>,
    pub disclosure_scope: Option<DisclosureScope>,
    pub defaults: DataQuality,
}

/// Admitted records from every sheet, in sheet-then-row order
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub same_as: Vec<SameAsRecord>,
    pub identifiers: Vec<IdentifierRecord>,
}

impl RecordSet {
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Node(r) => self.nodes.push(r),
            Record::Edge(r) => self.edges.push(r),
            Record::SameAs(r) => self.same_as.push(r),
            Record::Identifier(r) => self.identifiers.push(r),
        }
    }
}
