//! Recognised sheets and their column layouts

use crate::graph::{
    Confidence, DisclosureScope, EdgeKind, NodeKind, SameAsConfidence, Sensitivity,
    VerificationStatus,
};
use crate::validate::{CheckScheme, ColumnSpec, ColumnType, TextPattern};
use serde::{Deserialize, Serialize};

/// A sheet the importer understands.
///
/// Declaration order is the canonical processing order; "sheet-then-row
/// order" everywhere in the importer means this order, then row number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SheetKind {
    Metadata,
    Organizations,
    Facilities,
    Goods,
    Persons,
    Attestations,
    Consignments,
    #[serde(rename = "Supplier List")]
    SupplierList,
    #[serde(rename = "Supply Relationships")]
    SupplyRelationships,
    #[serde(rename = "Corporate Structure")]
    CorporateStructure,
    #[serde(rename = "Same As")]
    SameAs,
    Identifiers,
}

impl SheetKind {
    pub const ALL: [SheetKind; 12] = [
        Self::Metadata,
        Self::Organizations,
        Self::Facilities,
        Self::Goods,
        Self::Persons,
        Self::Attestations,
        Self::Consignments,
        Self::SupplierList,
        Self::SupplyRelationships,
        Self::CorporateStructure,
        Self::SameAs,
        Self::Identifiers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Metadata => "Metadata",
            Self::Organizations => "Organizations",
            Self::Facilities => "Facilities",
            Self::Goods => "Goods",
            Self::Persons => "Persons",
            Self::Attestations => "Attestations",
            Self::Consignments => "Consignments",
            Self::SupplierList => "Supplier List",
            Self::SupplyRelationships => "Supply Relationships",
            Self::CorporateStructure => "Corporate Structure",
            Self::SameAs => "Same As",
            Self::Identifiers => "Identifiers",
        }
    }

    /// Match a sheet name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Node kind produced by each row, for node sheets
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            Self::Organizations => Some(NodeKind::Organization),
            Self::Facilities => Some(NodeKind::Facility),
            Self::Goods => Some(NodeKind::Good),
            Self::Persons => Some(NodeKind::Person),
            Self::Attestations => Some(NodeKind::Attestation),
            Self::Consignments => Some(NodeKind::Consignment),
            _ => None,
        }
    }

    pub fn is_edge_sheet(&self) -> bool {
        matches!(self, Self::SupplyRelationships | Self::CorporateStructure)
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Self::Metadata => METADATA,
            Self::Organizations => ORGANIZATIONS,
            Self::Facilities => FACILITIES,
            Self::Goods => GOODS,
            Self::Persons => PERSONS,
            Self::Attestations => ATTESTATIONS,
            Self::Consignments => CONSIGNMENTS,
            Self::SupplierList => SUPPLIER_LIST,
            Self::SupplyRelationships => SUPPLY_RELATIONSHIPS,
            Self::CorporateStructure => CORPORATE_STRUCTURE,
            Self::SameAs => SAME_AS,
            Self::Identifiers => IDENTIFIERS,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Label/value fields above the header row
    pub fn preamble(&self) -> &'static [ColumnSpec] {
        match self {
            Self::SupplierList => SUPPLIER_LIST_PREAMBLE,
            _ => &[],
        }
    }
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const ORG_STATUS: &[&str] = &["active", "dissolved", "merged", "suspended"];
const RISK_TIER: &[&str] = &["critical", "high", "medium", "low"];
const KRALJIC: &[&str] = &["strategic", "leverage", "bottleneck", "non-critical"];
const APPROVAL: &[&str] = &["approved", "conditional", "pending", "blocked", "phase-out"];
const ATTESTATION_TYPE: &[&str] = &[
    "certification",
    "audit",
    "due_diligence_statement",
    "self_declaration",
    "other",
];
const OUTCOME: &[&str] = &["pass", "conditional_pass", "fail", "pending", "not_applicable"];
const ATTESTATION_STATUS: &[&str] = &["active", "suspended", "revoked", "expired", "withdrawn"];
const RISK_SEVERITY: &[&str] = &["critical", "high", "medium", "low"];
const RISK_LIKELIHOOD: &[&str] = &["very_likely", "likely", "possible", "unlikely"];
const EMISSION_SOURCE: &[&str] = &["actual", "default_eu", "default_country"];
const SERVICE_TYPE: &[&str] = &["warehousing", "transport", "fulfillment", "other"];
const CONTROL_TYPE: &[&str] = &[
    "franchise",
    "management",
    "tolling",
    "licensed_manufacturing",
    "other",
    "voting_rights",
    "capital",
    "other_means",
    "senior_management",
];
const CONSOLIDATION: &[&str] = &["ifrs10", "us_gaap_asc810", "other", "unknown"];

const TEXT: ColumnType = ColumnType::Text;
const DATE: ColumnType = ColumnType::Date;
const COUNTRY: ColumnType = ColumnType::Pattern(TextPattern::CountryCode);
const SENSITIVITY: ColumnType = ColumnType::Enum(Sensitivity::LABELS);
const CONFIDENCE: ColumnType = ColumnType::Enum(Confidence::LABELS);
const NON_NEGATIVE: ColumnType = ColumnType::Number {
    min: Some(0.0),
    max: None,
};
const PERCENT: ColumnType = ColumnType::Number {
    min: Some(0.0),
    max: Some(100.0),
};

/// Key/value sheet; these are the recognised keys.
const METADATA: &[ColumnSpec] = &[
    ColumnSpec::required("snapshot_date", DATE),
    ColumnSpec::optional("reporting_entity", TEXT),
    ColumnSpec::optional("disclosure_scope", ColumnType::Enum(DisclosureScope::LABELS)),
    ColumnSpec::optional("default_confidence", CONFIDENCE),
    ColumnSpec::optional("default_source", TEXT),
    ColumnSpec::optional("default_last_verified", DATE),
];

const ORGANIZATIONS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::optional("jurisdiction", COUNTRY),
    ColumnSpec::optional("status", ColumnType::Enum(ORG_STATUS)),
    ColumnSpec::optional("lei", ColumnType::Identifier(CheckScheme::Lei)),
    ColumnSpec::optional("duns", ColumnType::Identifier(CheckScheme::Duns)),
    ColumnSpec::optional("nat_reg_value", TEXT),
    ColumnSpec::optional("nat_reg_authority", TEXT),
    ColumnSpec::optional("vat_value", TEXT),
    ColumnSpec::optional("vat_country", COUNTRY),
    ColumnSpec::optional("internal_id", TEXT),
    ColumnSpec::optional("internal_system", TEXT),
    ColumnSpec::optional("risk_tier", ColumnType::Enum(RISK_TIER)),
    ColumnSpec::optional("kraljic_quadrant", ColumnType::Enum(KRALJIC)),
    ColumnSpec::optional("approval_status", ColumnType::Enum(APPROVAL)),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const FACILITIES: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::optional("operator_id", TEXT),
    ColumnSpec::optional("address", TEXT),
    ColumnSpec::optional(
        "latitude",
        ColumnType::Number {
            min: Some(-90.0),
            max: Some(90.0),
        },
    ),
    ColumnSpec::optional(
        "longitude",
        ColumnType::Number {
            min: Some(-180.0),
            max: Some(180.0),
        },
    ),
    ColumnSpec::optional("gln", ColumnType::Identifier(CheckScheme::Gln)),
    ColumnSpec::optional("internal_id", TEXT),
    ColumnSpec::optional("internal_system", TEXT),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const GOODS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::optional("commodity_code", TEXT),
    ColumnSpec::optional("unit", TEXT),
    ColumnSpec::optional("gtin", ColumnType::Identifier(CheckScheme::Gtin)),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const PERSONS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::optional("jurisdiction", COUNTRY),
    ColumnSpec::optional("role", TEXT),
    ColumnSpec::optional("nationality", COUNTRY),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const ATTESTATIONS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::required("attestation_type", ColumnType::Enum(ATTESTATION_TYPE)),
    ColumnSpec::optional("standard", TEXT),
    ColumnSpec::optional("issuer", TEXT),
    ColumnSpec::required("valid_from", DATE),
    ColumnSpec::optional("valid_to", DATE),
    ColumnSpec::optional("outcome", ColumnType::Enum(OUTCOME)),
    ColumnSpec::optional("status", ColumnType::Enum(ATTESTATION_STATUS)),
    ColumnSpec::optional("reference", TEXT),
    ColumnSpec::optional("risk_severity", ColumnType::Enum(RISK_SEVERITY)),
    ColumnSpec::optional("risk_likelihood", ColumnType::Enum(RISK_LIKELIHOOD)),
    ColumnSpec::optional("attested_entity_id", TEXT),
    ColumnSpec::optional("scope", TEXT),
    ColumnSpec::optional("confidence", CONFIDENCE),
    ColumnSpec::optional("source", TEXT),
    ColumnSpec::optional("last_verified", DATE),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const CONSIGNMENTS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::required("name", TEXT),
    ColumnSpec::optional("lot_id", TEXT),
    ColumnSpec::optional("quantity", NON_NEGATIVE),
    ColumnSpec::optional("unit", TEXT),
    ColumnSpec::optional("production_date", DATE),
    ColumnSpec::optional("origin_country", COUNTRY),
    ColumnSpec::optional("installation_id", TEXT),
    ColumnSpec::optional("direct_emissions_co2e", NON_NEGATIVE),
    ColumnSpec::optional("indirect_emissions_co2e", NON_NEGATIVE),
    ColumnSpec::optional("emission_factor_source", ColumnType::Enum(EMISSION_SOURCE)),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
];

const SUPPLY_RELATIONSHIPS: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::optional("type", ColumnType::Enum(EdgeKind::SUPPLY_LABELS)),
    ColumnSpec::required("supplier_id", TEXT),
    ColumnSpec::required("buyer_id", TEXT),
    ColumnSpec::required("valid_from", DATE),
    ColumnSpec::optional("valid_to", DATE),
    ColumnSpec::optional("commodity", TEXT),
    ColumnSpec::optional("tier", ColumnType::Integer { min: Some(1) }),
    ColumnSpec::optional("volume", NON_NEGATIVE),
    ColumnSpec::optional("volume_unit", TEXT),
    ColumnSpec::optional("annual_value", NON_NEGATIVE),
    ColumnSpec::optional("value_currency", ColumnType::Pattern(TextPattern::CurrencyCode)),
    ColumnSpec::optional("contract_ref", TEXT),
    ColumnSpec::optional("share_of_buyer_demand", PERCENT),
    ColumnSpec::optional("service_type", ColumnType::Enum(SERVICE_TYPE)),
    ColumnSpec::optional("confidence", CONFIDENCE),
    ColumnSpec::optional("source", TEXT),
    ColumnSpec::optional("last_verified", DATE),
];

const CORPORATE_STRUCTURE: &[ColumnSpec] = &[
    ColumnSpec::optional("id", TEXT),
    ColumnSpec::optional("type", ColumnType::Enum(EdgeKind::CORPORATE_LABELS)),
    ColumnSpec::required("subsidiary_id", TEXT),
    ColumnSpec::required("parent_id", TEXT),
    ColumnSpec::required("valid_from", DATE),
    ColumnSpec::optional("valid_to", DATE),
    ColumnSpec::optional("percentage", PERCENT),
    ColumnSpec::optional("direct", ColumnType::Boolean),
    ColumnSpec::optional("control_type", ColumnType::Enum(CONTROL_TYPE)),
    ColumnSpec::optional("consolidation_basis", ColumnType::Enum(CONSOLIDATION)),
    ColumnSpec::optional("confidence", CONFIDENCE),
    ColumnSpec::optional("source", TEXT),
    ColumnSpec::optional("last_verified", DATE),
];

/// Rows 1 and 2 of a Supplier List. A blank scope means partner.
const SUPPLIER_LIST_PREAMBLE: &[ColumnSpec] = &[
    ColumnSpec::required("reporting_entity", TEXT),
    ColumnSpec::required("snapshot_date", DATE),
    ColumnSpec::optional("disclosure_scope", ColumnType::Enum(DisclosureScope::LABELS)),
];

const SUPPLIER_LIST: &[ColumnSpec] = &[
    ColumnSpec::required("supplier_name", TEXT),
    ColumnSpec::optional("supplier_id", TEXT),
    ColumnSpec::optional("jurisdiction", COUNTRY),
    ColumnSpec::optional("tier", ColumnType::Integer { min: Some(1) }),
    ColumnSpec::optional("parent_supplier", TEXT),
    ColumnSpec::optional("commodity", TEXT),
    ColumnSpec::optional("valid_from", DATE),
    ColumnSpec::optional("annual_value", NON_NEGATIVE),
    ColumnSpec::optional("value_currency", ColumnType::Pattern(TextPattern::CurrencyCode)),
    ColumnSpec::optional("contract_ref", TEXT),
    ColumnSpec::optional("lei", ColumnType::Identifier(CheckScheme::Lei)),
    ColumnSpec::optional("duns", ColumnType::Identifier(CheckScheme::Duns)),
    ColumnSpec::optional("vat", TEXT),
    ColumnSpec::optional("vat_country", COUNTRY),
    ColumnSpec::optional("risk_tier", ColumnType::Enum(RISK_TIER)),
    ColumnSpec::optional("kraljic_quadrant", ColumnType::Enum(KRALJIC)),
    ColumnSpec::optional("approval_status", ColumnType::Enum(APPROVAL)),
];

const SAME_AS: &[ColumnSpec] = &[
    ColumnSpec::required("entity_a", TEXT),
    ColumnSpec::required("entity_b", TEXT),
    ColumnSpec::optional("confidence", ColumnType::Enum(SameAsConfidence::LABELS)),
    ColumnSpec::optional("basis", TEXT),
];

const IDENTIFIERS: &[ColumnSpec] = &[
    ColumnSpec::required("node_id", TEXT),
    ColumnSpec::required("scheme", ColumnType::Pattern(TextPattern::SchemeName)),
    ColumnSpec::required("value", TEXT),
    ColumnSpec::optional("authority", TEXT),
    ColumnSpec::optional("sensitivity", SENSITIVITY),
    ColumnSpec::optional("valid_from", DATE),
    ColumnSpec::optional("valid_to", DATE),
    ColumnSpec::optional(
        "verification_status",
        ColumnType::Enum(VerificationStatus::LABELS),
    ),
];
