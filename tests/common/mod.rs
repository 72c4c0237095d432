//! Shared fixtures for the import integration tests
//!
//! The reference workbook: Acme Manufacturing owns 51% of Bolt Supplies,
//! Bolt operates the Sheffield plant, the plant produces M10 steel hex bolts
//! and holds an SA8000 certification.

#![allow(dead_code)]

use omts_import::{FileSalt, GraphDocument, ImportOptions, Row, Sheet};
use std::collections::HashSet;

pub const SALT: [u8; 32] = [0x5a; 32];

pub fn fixed_options() -> ImportOptions {
    ImportOptions::new().with_salt(FileSalt::from_bytes(SALT))
}

pub fn metadata(scope: &str) -> Sheet {
    Sheet::new("Metadata")
        .with_headers(["field", "value"])
        .with_values(["snapshot_date", "2026-02-17"])
        .with_values(["reporting_entity", "org-acme"])
        .with_values(["disclosure_scope", scope])
        .with_values(["default_confidence", "reported"])
}

pub fn organizations() -> Sheet {
    Sheet::new("Organizations")
        .with_headers([
            "id",
            "name",
            "jurisdiction",
            "lei",
            "duns",
            "nat_reg_value",
            "nat_reg_authority",
            "vat_value",
            "vat_country",
            "internal_id",
            "internal_system",
        ])
        .with_values([
            "org-acme",
            "Acme Manufacturing GmbH",
            "DE",
            "5493006MHB84DD0ZWV18",
            "081466849",
            "HRB86891",
            "RA000548",
            "DE123456789",
            "DE",
            "V-100234",
            "sap-mm-prod",
        ])
        .with_values([
            "org-bolt",
            "Bolt Supplies Ltd",
            "GB",
            "",
            "234567890",
            "07228507",
            "RA000585",
            "",
            "",
            "",
            "",
        ])
}

pub fn facilities() -> Sheet {
    Sheet::new("Facilities")
        .with_headers(["id", "name", "operator_id", "latitude", "longitude", "gln"])
        .with_row(
            Row::new()
                .with_cell("id", "fac-sheffield")
                .with_cell("name", "Bolt Sheffield Plant")
                .with_cell("operator_id", "org-bolt")
                .with_cell("latitude", 53.3811)
                .with_cell("longitude", -1.4701)
                .with_cell("gln", "5060012340001"),
        )
}

pub fn goods() -> Sheet {
    Sheet::new("Goods")
        .with_headers(["id", "name", "commodity_code", "gtin"])
        .with_values(["good-bolts", "M10 Steel Hex Bolts", "7318.15", "05060012340018"])
}

pub fn attestations() -> Sheet {
    Sheet::new("Attestations")
        .with_headers([
            "id",
            "name",
            "attestation_type",
            "standard",
            "valid_from",
            "valid_to",
            "attested_entity_id",
        ])
        .with_values([
            "att-sa8000",
            "SA8000 Certification",
            "certification",
            "SA8000:2014",
            "2025-06-01",
            "2028-05-31",
            "fac-sheffield",
        ])
}

pub fn supply_relationships() -> Sheet {
    Sheet::new("Supply Relationships")
        .with_headers(["id", "type", "supplier_id", "buyer_id", "valid_from", "commodity"])
        // 44941 is the spreadsheet serial for 2023-01-15
        .with_row(
            Row::new()
                .with_cell("id", "edge-001")
                .with_cell("type", "supplies")
                .with_cell("supplier_id", "org-bolt")
                .with_cell("buyer_id", "org-acme")
                .with_cell("valid_from", 44941.0)
                .with_cell("commodity", "7318.15"),
        )
        .with_values(["edge-002", "operates", "org-bolt", "fac-sheffield", "2018-06-01", ""])
        .with_values(["edge-003", "produces", "fac-sheffield", "good-bolts", "2020-03-01", ""])
}

pub fn corporate_structure() -> Sheet {
    Sheet::new("Corporate Structure")
        .with_headers(["id", "type", "subsidiary_id", "parent_id", "valid_from", "percentage"])
        .with_row(
            Row::new()
                .with_cell("id", "edge-004")
                .with_cell("type", "ownership")
                .with_cell("subsidiary_id", "org-acme")
                .with_cell("parent_id", "org-bolt")
                .with_cell("valid_from", "2019-04-01")
                .with_cell("percentage", 51.0),
        )
}

pub fn identifiers() -> Sheet {
    Sheet::new("Identifiers")
        .with_headers(["node_id", "scheme", "value", "authority", "sensitivity"])
        .with_values(["fac-sheffield", "internal", "SITE-SHF-01", "bolt-erp", "restricted"])
}

/// The full reference workbook under the given disclosure scope
pub fn acme_bolt_workbook(scope: &str) -> Vec<Sheet> {
    vec![
        metadata(scope),
        organizations(),
        facilities(),
        goods(),
        attestations(),
        supply_relationships(),
        corporate_structure(),
        identifiers(),
    ]
}

/// A three-tier supplier list for Acme. Row 9 has no parent, row 10 names
/// a parent that is not on the list.
pub fn tiered_supplier_list(scope: &str) -> Sheet {
    Sheet::new("Supplier List")
        .with_preamble("Reporting Entity", "Acme Manufacturing")
        .with_preamble("Snapshot Date", "2026-02-17")
        .with_preamble("Disclosure Scope", scope)
        .with_headers([
            "supplier_name",
            "supplier_id",
            "tier",
            "parent_supplier",
            "commodity",
            "valid_from",
            "duns",
        ])
        .with_values(["Bolt Supplies Ltd", "S-001", "1", "", "fasteners", "2023-01-15", "234567890"])
        .with_values(["Sheffield Steel", "S-002", "2", "S-001", "steel wire", "", ""])
        .with_values(["Bolt Supplies Ltd", "S-001", "1", "", "washers", "", ""])
        .with_values(["Ore Mine", "", "3", "Sheffield Steel", "iron ore", "", ""])
        .with_values(["Rolling Mill", "S-004", "2", "", "", "", ""])
        .with_values(["Wire Works", "S-006", "2", "S-999", "", "", ""])
}

/// Panics unless every edge endpoint names a node and node IDs are unique
pub fn assert_referentially_sound(doc: &GraphDocument) {
    let mut ids = HashSet::new();
    for node in doc.nodes() {
        assert!(ids.insert(node.id.as_str()), "duplicate node id {}", node.id);
    }
    for edge in doc.edges() {
        assert!(ids.contains(edge.source.as_str()), "dangling source on {}", edge.id);
        assert!(ids.contains(edge.target.as_str()), "dangling target on {}", edge.id);
    }
    let mut edge_ids = HashSet::new();
    for edge in doc.edges() {
        assert!(edge_ids.insert(edge.id.as_str()), "duplicate edge id {}", edge.id);
        assert!(!ids.contains(edge.id.as_str()), "edge id {} shadows a node", edge.id);
    }
}
