//! Typed, temporally scoped relationships between nodes

use super::metadata::DataQuality;
use super::node::NodeKind::{Attestation, Consignment, Facility, Good, Organization, Person};
use super::node::{NodeId, NodeKind};
use crate::sheet::SourceRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create an EdgeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    // Supply chain
    Supplies,
    Subcontracts,
    Tolls,
    Distributes,
    Brokers,
    SellsTo,
    Operates,
    Produces,
    ComposedOf,
    // Corporate structure
    Ownership,
    LegalParentage,
    OperationalControl,
    BeneficialOwnership,
    // Synthesised
    AttestedBy,
    SameAs,
}

impl EdgeKind {
    pub const SUPPLY_LABELS: &'static [&'static str] = &[
        "supplies",
        "subcontracts",
        "tolls",
        "distributes",
        "brokers",
        "sells_to",
        "operates",
        "produces",
        "composed_of",
    ];

    pub const CORPORATE_LABELS: &'static [&'static str] = &[
        "ownership",
        "legal_parentage",
        "operational_control",
        "beneficial_ownership",
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        let kind = match label {
            "supplies" => Self::Supplies,
            "subcontracts" => Self::Subcontracts,
            "tolls" => Self::Tolls,
            "distributes" => Self::Distributes,
            "brokers" => Self::Brokers,
            "sells_to" => Self::SellsTo,
            "operates" => Self::Operates,
            "produces" => Self::Produces,
            "composed_of" => Self::ComposedOf,
            "ownership" => Self::Ownership,
            "legal_parentage" => Self::LegalParentage,
            "operational_control" => Self::OperationalControl,
            "beneficial_ownership" => Self::BeneficialOwnership,
            "attested_by" => Self::AttestedBy,
            "same_as" => Self::SameAs,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplies => "supplies",
            Self::Subcontracts => "subcontracts",
            Self::Tolls => "tolls",
            Self::Distributes => "distributes",
            Self::Brokers => "brokers",
            Self::SellsTo => "sells_to",
            Self::Operates => "operates",
            Self::Produces => "produces",
            Self::ComposedOf => "composed_of",
            Self::Ownership => "ownership",
            Self::LegalParentage => "legal_parentage",
            Self::OperationalControl => "operational_control",
            Self::BeneficialOwnership => "beneficial_ownership",
            Self::AttestedBy => "attested_by",
            Self::SameAs => "same_as",
        }
    }

    /// Node kinds allowed at each end, or `None` when unconstrained.
    pub fn endpoint_kinds(&self) -> Option<(&'static [NodeKind], &'static [NodeKind])> {
        let pair: (&'static [NodeKind], &'static [NodeKind]) = match self {
            Self::Ownership | Self::LegalParentage => (&[Organization], &[Organization]),
            Self::OperationalControl => (&[Organization], &[Organization, Facility]),
            Self::BeneficialOwnership => (&[Person], &[Organization]),
            Self::Supplies
            | Self::Subcontracts
            | Self::Distributes
            | Self::Brokers
            | Self::SellsTo => (&[Organization], &[Organization]),
            Self::Tolls => (&[Organization, Facility], &[Organization]),
            Self::Operates => (&[Organization], &[Facility]),
            Self::Produces => (&[Facility], &[Good, Consignment]),
            Self::ComposedOf => (&[Good, Consignment], &[Good, Consignment]),
            Self::AttestedBy => (
                &[Attestation],
                &[Organization, Facility, Good, Consignment],
            ),
            Self::SameAs => return None,
        };
        Some(pair)
    }

    /// Whether an edge of this kind may run from `source` to `target`.
    ///
    /// Boundary references stand in for anything and are always accepted.
    pub fn permits(&self, source: NodeKind, target: NodeKind) -> bool {
        let Some((sources, targets)) = self.endpoint_kinds() else {
            return true;
        };
        let ok = |kind: NodeKind, allowed: &[NodeKind]| {
            kind == NodeKind::BoundaryRef || allowed.contains(&kind)
        };
        ok(source, sources) && ok(target, targets)
    }

    pub fn is_corporate(&self) -> bool {
        matches!(
            self,
            Self::Ownership
                | Self::LegalParentage
                | Self::OperationalControl
                | Self::BeneficialOwnership
        )
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional edge properties. Which ones apply depends on the edge kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidation_basis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_of_buyer_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

/// A directed edge in the assembled graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    #[serde(default)]
    pub properties: EdgeProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
    /// Row the edge was read from (for attested_by, the attestation row)
    pub source_row: SourceRow,
}
