//! Row-level recovery, same-as merging and fatal conditions

mod common;

use common::{
    acme_bolt_workbook, assert_referentially_sound, corporate_structure, fixed_options, goods,
    metadata, organizations,
};
use omts_import::{
    import, ConflictPolicy, DiagnosticKind, EdgeKind, FatalError, ImportPipeline, NodeKind, Row,
    Sheet, SheetKind, WorkbookFile,
};

fn bolt_duplicate_workbook() -> Vec<Sheet> {
    vec![
        metadata("partner"),
        organizations().with_values([
            "org-bolt-uk",
            "Bolt Supplies Limited",
            "GB",
            "",
            "234567890",
            "",
            "",
            "",
            "",
            "BS-7731",
            "bolt-ledger",
        ]),
        Sheet::new("Supply Relationships")
            .with_headers(["id", "type", "supplier_id", "buyer_id", "valid_from"])
            .with_values(["edge-001", "supplies", "org-bolt", "org-acme", "2023-01-15"])
            .with_values(["edge-005", "sells_to", "org-bolt-uk", "org-acme", "2024-02-01"]),
        Sheet::new("Same As")
            .with_headers(["entity_a", "entity_b", "confidence", "basis"])
            .with_values(["org-bolt", "org-bolt-uk", "definite", "same DUNS"]),
    ]
}

#[tokio::test]
async fn same_as_rows_collapse_into_one_node() {
    let doc = import(bolt_duplicate_workbook(), fixed_options()).await.unwrap();

    assert_eq!(doc.nodes_of_kind(NodeKind::Organization).count(), 2);
    assert!(doc.node("org-bolt-uk").is_none());

    let bolt = doc.node("org-bolt").unwrap();
    let merge = bolt.merge.as_ref().expect("merge provenance");
    assert_eq!(merge.members.len(), 1);
    assert_eq!(merge.members[0].as_str(), "org-bolt-uk");
    assert_eq!(merge.assertions.len(), 1);
    assert_eq!(bolt.sources.len(), 2);

    // Identifiers are unioned and de-duplicated on (scheme, value)
    let duns: Vec<_> = bolt
        .identifiers
        .iter()
        .filter(|i| i.scheme.as_str() == "duns")
        .collect();
    assert_eq!(duns.len(), 1);
    assert!(bolt.identifier("internal").is_some());

    // Both edges now reference the canonical node
    assert!(doc.find_edge(EdgeKind::Supplies, "org-bolt", "org-acme").is_some());
    assert!(doc.find_edge(EdgeKind::SellsTo, "org-bolt", "org-acme").is_some());
    assert_referentially_sound(&doc);
}

#[tokio::test]
async fn merge_conflicts_keep_first_value_and_record_alternate() {
    let doc = import(bolt_duplicate_workbook(), fixed_options()).await.unwrap();

    let bolt = doc.node("org-bolt").unwrap();
    assert_eq!(bolt.name.as_deref(), Some("Bolt Supplies Ltd"));
    let merge = bolt.merge.as_ref().unwrap();
    assert_eq!(merge.alternates.len(), 1);
    assert_eq!(merge.alternates[0].field, "name");
    assert_eq!(merge.alternates[0].value, "Bolt Supplies Limited");

    let conflicts: Vec<_> = doc
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::MergeConflict)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].sheet, SheetKind::Organizations);
    assert_eq!(conflicts[0].row, Some(4));
    assert_eq!(doc.diagnostics().error_count(), 0);
}

#[tokio::test]
async fn last_encountered_policy_prefers_later_rows() {
    let options = fixed_options().with_conflict_policy(ConflictPolicy::LastEncountered);
    let doc = import(bolt_duplicate_workbook(), options).await.unwrap();

    let bolt = doc.node("org-bolt").unwrap();
    assert_eq!(bolt.name.as_deref(), Some("Bolt Supplies Limited"));
    let merge = bolt.merge.as_ref().unwrap();
    assert_eq!(merge.alternates[0].value, "Bolt Supplies Ltd");
}

#[tokio::test]
async fn out_of_range_percentage_drops_only_that_edge() {
    let mut sheets = acme_bolt_workbook("partner");
    sheets[6] = corporate_structure().with_row(
        Row::new()
            .with_cell("id", "edge-006")
            .with_cell("type", "ownership")
            .with_cell("subsidiary_id", "org-bolt")
            .with_cell("parent_id", "org-acme")
            .with_cell("valid_from", "2021-01-01")
            .with_cell("percentage", 151.0),
    );

    let doc = import(sheets, fixed_options()).await.unwrap();

    let invalid: Vec<_> = doc
        .diagnostics()
        .for_row(SheetKind::CorporateStructure, 3)
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].kind, DiagnosticKind::InvalidFormat);
    assert_eq!(invalid[0].column.as_deref(), Some("percentage"));

    assert!(doc.edges().iter().all(|e| e.id.as_str() != "edge-006"));
    assert_eq!(doc.edges_of_kind(EdgeKind::Ownership).count(), 1);
    assert_eq!(doc.nodes().len(), 5);
    assert_eq!(doc.edges().len(), 5);
}

#[tokio::test]
async fn bad_rows_are_reported_and_the_rest_survives() {
    let sheets = vec![
        metadata("internal"),
        organizations(),
        goods().with_values(["good-nuts", "M10 Nuts", "7318.16", "05060012340019"]),
        Sheet::new("Supply Relationships")
            .with_headers(["id", "type", "supplier_id", "buyer_id", "valid_from"])
            .with_values(["edge-001", "supplies", "org-bolt", "org-acme", "2023-01-15"])
            .with_values(["edge-002", "supplies", "org-ghost", "org-acme", "2023-01-15"])
            .with_values(["edge-003", "supplies", "good-bolts", "org-acme", "2023-01-15"]),
    ];

    let doc = import(sheets, fixed_options()).await.unwrap();
    let report = doc.diagnostics();

    // Bad GTIN check digit: the good survives without the identifier
    let gtin: Vec<_> = report.for_row(SheetKind::Goods, 3).collect();
    assert!(matches!(
        gtin[0].kind,
        DiagnosticKind::InvalidIdentifierFormat { .. }
    ));
    assert!(doc.node("good-nuts").unwrap().identifiers.is_empty());

    let dangling: Vec<_> = report
        .matching(|k| *k == DiagnosticKind::DanglingReference)
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].row, Some(3));

    let mismatched: Vec<_> = report
        .matching(|k| *k == DiagnosticKind::TypeMismatch)
        .collect();
    assert_eq!(mismatched.len(), 1);
    assert_eq!(mismatched[0].row, Some(4));

    assert_eq!(doc.edges().len(), 1);
    assert_referentially_sound(&doc);
}

#[tokio::test]
async fn duplicate_ids_keep_the_first_row() {
    let sheets = vec![
        metadata("internal"),
        organizations(),
        goods().with_values(["org-acme", "Clashing Good", "", ""]),
    ];
    let doc = import(sheets, fixed_options()).await.unwrap();

    let duplicates: Vec<_> = doc
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::DuplicateId)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].sheet, SheetKind::Goods);
    assert_eq!(doc.node("org-acme").unwrap().kind(), NodeKind::Organization);
    assert_referentially_sound(&doc);
}

#[tokio::test]
async fn person_rows_under_public_scope_are_fatal() {
    let mut sheets = acme_bolt_workbook("public");
    sheets.push(
        Sheet::new("Persons")
            .with_headers(["id", "name", "role"])
            .with_values(["person-jane", "Jane Doe", "director"]),
    );
    let err = import(sheets, fixed_options()).await.unwrap_err();
    assert!(matches!(err, FatalError::PolicyViolation(_)));
}

#[tokio::test]
async fn persons_are_confidential_under_internal_scope() {
    let mut sheets = acme_bolt_workbook("internal");
    sheets.push(
        Sheet::new("Persons")
            .with_headers(["id", "name", "role", "sensitivity"])
            .with_values(["person-jane", "Jane Doe", "director", "public"]),
    );
    let doc = import(sheets, fixed_options()).await.unwrap();

    let jane = doc.node("person-jane").unwrap();
    assert_eq!(jane.sensitivity, omts_import::Sensitivity::Confidential);
    let raised: Vec<_> = doc
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::SensitivityRaised)
        .collect();
    assert_eq!(raised.len(), 1);
}

#[tokio::test]
async fn blank_snapshot_date_is_fatal() {
    let sheets = vec![Sheet::new("Metadata")
        .with_headers(["field", "value"])
        .with_values(["snapshot_date", ""])];
    let err = import(sheets, fixed_options()).await.unwrap_err();
    match err {
        FatalError::MissingRequiredMetadata { field, .. } => assert_eq!(field, "snapshot_date"),
        other => panic!("expected missing metadata, got {}", other),
    }
}

#[tokio::test]
async fn non_finite_percentages_are_rejected() {
    for percentage in [f64::NAN, f64::INFINITY] {
        let mut sheets = acme_bolt_workbook("partner");
        sheets[6] = corporate_structure().with_row(
            Row::new()
                .with_cell("id", "edge-006")
                .with_cell("type", "ownership")
                .with_cell("subsidiary_id", "org-bolt")
                .with_cell("parent_id", "org-acme")
                .with_cell("valid_from", "2021-01-01")
                .with_cell("percentage", percentage),
        );

        let doc = import(sheets, fixed_options()).await.unwrap();
        let invalid: Vec<_> = doc
            .diagnostics()
            .for_row(SheetKind::CorporateStructure, 3)
            .collect();
        assert_eq!(invalid.len(), 1, "percentage {}", percentage);
        assert_eq!(invalid[0].kind, DiagnosticKind::InvalidFormat);
        assert!(doc.edges().iter().all(|e| e.id.as_str() != "edge-006"));
    }
}

#[tokio::test]
async fn nan_cells_from_yaml_workbooks_are_rejected() {
    let yaml = "sheets:\n\
        \x20 - name: Metadata\n\
        \x20   headers: [field, value]\n\
        \x20   rows:\n\
        \x20     - {field: snapshot_date, value: '2026-02-17'}\n\
        \x20 - name: Organizations\n\
        \x20   headers: [id, name]\n\
        \x20   rows:\n\
        \x20     - {id: org-acme, name: Acme}\n\
        \x20     - {id: org-bolt, name: Bolt}\n\
        \x20 - name: Corporate Structure\n\
        \x20   headers: [type, subsidiary_id, parent_id, valid_from, percentage]\n\
        \x20   rows:\n\
        \x20     - {type: ownership, subsidiary_id: org-bolt, parent_id: org-acme, valid_from: '2021-01-01', percentage: .nan}\n";
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    std::io::Write::write_all(&mut file, yaml.as_bytes()).unwrap();

    let source = WorkbookFile::open(file.path());
    let doc = ImportPipeline::new(fixed_options()).run(&source).await.unwrap();
    assert!(doc.edges().is_empty());
    let invalid: Vec<_> = doc
        .diagnostics()
        .matching(|k| *k == DiagnosticKind::InvalidFormat)
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].column.as_deref(), Some("percentage"));
}

fn secret_holdings_workbook() -> Vec<Sheet> {
    vec![
        metadata("partner"),
        organizations()
            .with_row(
                Row::new()
                    .with_cell("id", "org-secret")
                    .with_cell("name", "Secret Holdings AG")
                    .with_cell("sensitivity", "confidential"),
            )
            .with_row(
                Row::new()
                    .with_cell("id", "org-secret-2")
                    .with_cell("name", "Secret Holdings (Zug) AG")
                    .with_cell("internal_id", "SH-9")
                    .with_cell("internal_system", "acme-erp"),
            ),
        Sheet::new("Supply Relationships")
            .with_headers(["id", "type", "supplier_id", "buyer_id", "valid_from"])
            .with_values(["edge-001", "supplies", "org-secret-2", "org-acme", "2024-03-01"]),
        Sheet::new("Same As")
            .with_headers(["entity_a", "entity_b", "confidence", "basis"])
            .with_values(["org-secret", "org-secret-2", "definite", "same register entry"]),
    ]
}

#[tokio::test]
async fn boundary_stubs_hide_merged_members() {
    let doc = import(secret_holdings_workbook(), fixed_options()).await.unwrap();

    let stub = doc.nodes_of_kind(NodeKind::BoundaryRef).next().unwrap();
    assert!(stub.merge.is_none());
    assert_eq!(stub.sources.len(), 1);
    assert!(doc.find_edge(EdgeKind::Supplies, stub.id.as_str(), "org-acme").is_some());

    // The conflict on the member row is still reported, without its values
    let conflict: Vec<_> = doc
        .diagnostics()
        .for_row(SheetKind::Organizations, 5)
        .collect();
    assert_eq!(conflict.len(), 1);
    assert_eq!(conflict[0].kind, DiagnosticKind::MergeConflict);
    assert!(conflict[0].message.contains(stub.id.as_str()));

    let json = doc.to_json_pretty().unwrap();
    assert!(!json.contains("org-secret"), "{}", json);
    assert!(!json.contains("Secret Holdings"), "{}", json);
    assert!(!json.contains("SH-9"), "{}", json);
    assert_referentially_sound(&doc);
}

#[tokio::test]
async fn persons_under_partner_scope_keep_node_and_lose_identifiers() {
    let mut sheets = acme_bolt_workbook("partner");
    sheets.push(
        Sheet::new("Persons")
            .with_headers(["id", "name", "role"])
            .with_values(["person-jane", "Jane Doe", "director"]),
    );
    sheets[7] = common::identifiers().with_values(["person-jane", "internal", "EMP-0042", "acme-hr", ""]);

    let doc = import(sheets, fixed_options()).await.unwrap();

    let jane = doc.node("person-jane").unwrap();
    assert_eq!(jane.kind(), NodeKind::Person);
    assert_eq!(jane.sensitivity, omts_import::Sensitivity::Confidential);
    assert_eq!(jane.name.as_deref(), Some("Jane Doe"));
    assert!(jane.identifiers.is_empty());

    let withheld: Vec<_> = doc
        .diagnostics()
        .for_row(SheetKind::Identifiers, 3)
        .collect();
    assert_eq!(withheld.len(), 1);
    assert_eq!(withheld[0].kind, DiagnosticKind::IdentifierWithheld);
    assert_eq!(
        doc.diagnostics()
            .matching(|k| *k == DiagnosticKind::BoundaryReplaced)
            .count(),
        0
    );
    assert_eq!(doc.nodes_of_kind(NodeKind::BoundaryRef).count(), 0);
}
