//! Node representation in the disclosure graph

use super::identifier::{Identifier, Sensitivity};
use super::metadata::DataQuality;
use crate::sheet::SourceRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
///
/// Serializes as a plain string (user-supplied like "org-acme", or generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Organization,
    Facility,
    Good,
    Person,
    Attestation,
    Consignment,
    /// Synthetic stand-in for an entity withheld by disclosure scope
    BoundaryRef,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Facility => "facility",
            Self::Good => "good",
            Self::Person => "person",
            Self::Attestation => "attestation",
            Self::Consignment => "consignment",
            Self::BoundaryRef => "boundary_ref",
        }
    }

    /// Prefix for generated IDs.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Organization => "org",
            Self::Facility => "fac",
            Self::Good => "good",
            Self::Person => "person",
            Self::Attestation => "att",
            Self::Consignment => "con",
            Self::BoundaryRef => "boundary",
        }
    }

    /// Sensitivity a node takes when nothing states otherwise.
    pub fn default_sensitivity(&self) -> Sensitivity {
        match self {
            Self::Person => Sensitivity::Confidential,
            _ => Sensitivity::Public,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kraljic_quadrant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityAttrs {
    /// Organization operating the facility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttestationAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_likelihood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    /// Facility where the consignment was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_emissions_co2e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indirect_emissions_co2e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission_factor_source: Option<String>,
}

/// Kind-specific attributes, one variant per [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeAttributes {
    Organization(OrganizationAttrs),
    Facility(FacilityAttrs),
    Good(GoodAttrs),
    Person(PersonAttrs),
    Attestation(AttestationAttrs),
    Consignment(ConsignmentAttrs),
    BoundaryRef,
}

/// A node-valued attribute together with the column it came from and the
/// kind it must point at.
pub struct NodeReference<'a> {
    pub column: &'static str,
    pub expected: NodeKind,
    pub target: &'a mut Option<NodeId>,
}

impl NodeAttributes {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Organization(_) => NodeKind::Organization,
            Self::Facility(_) => NodeKind::Facility,
            Self::Good(_) => NodeKind::Good,
            Self::Person(_) => NodeKind::Person,
            Self::Attestation(_) => NodeKind::Attestation,
            Self::Consignment(_) => NodeKind::Consignment,
            Self::BoundaryRef => NodeKind::BoundaryRef,
        }
    }

    /// Mutable access to every attribute that refers to another node.
    pub fn references_mut(&mut self) -> Vec<NodeReference<'_>> {
        match self {
            Self::Facility(attrs) => vec![NodeReference {
                column: "operator_id",
                expected: NodeKind::Organization,
                target: &mut attrs.operator,
            }],
            Self::Consignment(attrs) => vec![NodeReference {
                column: "installation_id",
                expected: NodeKind::Facility,
                target: &mut attrs.installation,
            }],
            _ => Vec::new(),
        }
    }
}

/// Equivalence confidence stated on a same-as assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameAsConfidence {
    Definite,
    Probable,
    Possible,
}

impl SameAsConfidence {
    pub const LABELS: &'static [&'static str] = &["definite", "probable", "possible"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "definite" => Some(Self::Definite),
            "probable" => Some(Self::Probable),
            "possible" => Some(Self::Possible),
            _ => None,
        }
    }
}

/// A same-as assertion that contributed to a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceAssertion {
    pub entity_a: NodeId,
    pub entity_b: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<SameAsConfidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

/// A value discarded while merging, kept so the loss is visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateValue {
    pub field: String,
    pub value: String,
    /// Member node the value came from
    pub source: NodeId,
}

/// How a canonical node came to be.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeProvenance {
    /// IDs of the nodes absorbed into this one
    pub members: Vec<NodeId>,
    pub assertions: Vec<EquivalenceAssertion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<AlternateValue>,
}

/// A node in the assembled graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub attributes: NodeAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sensitivity: Sensitivity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeProvenance>,
    /// Rows this node was built from, in sheet-then-row order
    #[serde(default)]
    pub sources: Vec<SourceRow>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.attributes.kind()
    }

    /// First identifier with the given scheme.
    pub fn identifier(&self, scheme: &str) -> Option<&Identifier> {
        self.identifiers.iter().find(|i| i.scheme.as_str() == scheme)
    }
}
