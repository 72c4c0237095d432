//! Imports of the flat Supplier List layout

mod common;

use common::{
    assert_referentially_sound, fixed_options, metadata, organizations, tiered_supplier_list,
};
use omts_import::{
    import, DiagnosticKind, DisclosureScope, EdgeKind, IdentifierScheme, NodeKind, Sheet,
    SheetKind,
};

#[tokio::test]
async fn tiered_list_builds_the_supply_chain() {
    let doc = import(vec![tiered_supplier_list("")], fixed_options())
        .await
        .unwrap();
    assert_referentially_sound(&doc);

    let meta = doc.metadata();
    assert_eq!(meta.disclosure_scope, DisclosureScope::Partner);
    assert_eq!(meta.snapshot_date.to_string(), "2026-02-17");
    assert_eq!(
        meta.reporting_entity.as_ref().map(|id| id.as_str()),
        Some("org-acme-manufacturing")
    );
    assert_eq!(doc.nodes_of_kind(NodeKind::Organization).count(), 6);

    let supplies: Vec<_> = doc.edges_of_kind(EdgeKind::Supplies).collect();
    assert_eq!(supplies.len(), 4);
    let to_acme = supplies
        .iter()
        .filter(|e| e.source.as_str() == "org-bolt-supplies-ltd")
        .count();
    assert_eq!(to_acme, 2, "one edge per row, even for a repeated supplier");

    let wire = doc
        .find_edge(EdgeKind::Supplies, "org-sheffield-steel", "org-bolt-supplies-ltd")
        .expect("tier 2 edge");
    assert_eq!(wire.properties.tier, Some(2));
    assert_eq!(wire.properties.commodity.as_deref(), Some("steel wire"));
    let ore = doc
        .find_edge(EdgeKind::Supplies, "org-ore-mine", "org-sheffield-steel")
        .expect("tier 3 edge, parent found by name");
    assert_eq!(ore.properties.tier, Some(3));
    assert_eq!(ore.source_row.sheet, SheetKind::SupplierList);
    assert_eq!(ore.source_row.row, 8);
}

#[tokio::test]
async fn bad_parents_are_row_diagnostics() {
    let doc = import(vec![tiered_supplier_list("")], fixed_options())
        .await
        .unwrap();

    let missing: Vec<_> = doc
        .diagnostics()
        .for_row(SheetKind::SupplierList, 9)
        .filter(|d| d.kind == DiagnosticKind::InvalidFormat)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].column.as_deref(), Some("parent_supplier"));

    let dangling: Vec<_> = doc
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::DanglingReference)
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].row, Some(10));
    assert!(dangling[0].message.contains("S-999"));

    // Both suppliers survive without an edge
    assert!(doc.node("org-rolling-mill").is_some());
    assert!(doc.node("org-wire-works").is_some());
}

#[tokio::test]
async fn supplier_ids_follow_the_disclosure_scope() {
    let partner = import(vec![tiered_supplier_list("partner")], fixed_options())
        .await
        .unwrap();
    let bolt = partner.node("org-bolt-supplies-ltd").unwrap();
    assert_eq!(bolt.identifiers.len(), 1);
    assert_eq!(bolt.identifiers[0].scheme, IdentifierScheme::Duns);
    assert!(partner
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::IdentifierWithheld)
        .any(|d| d.sheet == SheetKind::SupplierList));

    let internal = import(vec![tiered_supplier_list("internal")], fixed_options())
        .await
        .unwrap();
    let bolt = internal.node("org-bolt-supplies-ltd").unwrap();
    let supplier_id = bolt
        .identifiers
        .iter()
        .find(|id| id.scheme == IdentifierScheme::Internal)
        .expect("supplier_id kept under internal scope");
    assert_eq!(supplier_id.value, "S-001");
    assert_eq!(supplier_id.authority.as_deref(), Some("supplier-list"));
}

#[tokio::test]
async fn list_merges_with_organization_sheet() {
    let sheets = vec![
        metadata("internal"),
        organizations(),
        tiered_supplier_list(""),
        Sheet::new("Same As")
            .with_headers(["entity_a", "entity_b", "confidence"])
            .with_values(["org-acme", "org-acme-manufacturing", "definite"])
            .with_values(["org-bolt", "org-bolt-supplies-ltd", "definite"]),
    ];
    let doc = import(sheets, fixed_options()).await.unwrap();
    assert_referentially_sound(&doc);

    // The Metadata sheet wins over the preamble
    assert_eq!(doc.metadata().disclosure_scope, DisclosureScope::Internal);
    assert_eq!(
        doc.metadata().reporting_entity.as_ref().map(|id| id.as_str()),
        Some("org-acme")
    );

    assert!(doc.node("org-bolt-supplies-ltd").is_none());
    assert!(doc.node("org-acme-manufacturing").is_none());
    let bolt = doc.node("org-bolt").unwrap();
    let duns = bolt
        .identifiers
        .iter()
        .filter(|id| id.scheme == IdentifierScheme::Duns)
        .count();
    assert_eq!(duns, 1);

    assert!(doc.find_edge(EdgeKind::Supplies, "org-bolt", "org-acme").is_some());
    assert!(doc
        .find_edge(EdgeKind::Supplies, "org-sheffield-steel", "org-bolt")
        .is_some());
}

#[tokio::test]
async fn list_without_snapshot_date_is_fatal() {
    let sheet = Sheet::new("Supplier List")
        .with_preamble("Reporting Entity", "Acme Manufacturing")
        .with_headers(["supplier_name", "tier"])
        .with_values(["Bolt Supplies Ltd", "1"]);
    let err = import(vec![sheet], fixed_options()).await.unwrap_err();
    assert!(err.to_string().contains("snapshot_date"));
}
