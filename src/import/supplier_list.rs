//! The single-sheet Supplier List layout
//!
//! A two-row preamble names the reporting entity, snapshot date and
//! disclosure scope; every row under the header names one supplier
//! relationship. Rows are lowered to ordinary organization and `supplies`
//! records, so ID assignment, resolution, merging and policy treat them the
//! same as the multi-sheet layout.
//!
//! Suppliers are keyed by `supplier_id`, or by name when that is blank, and
//! get slug IDs (`org-bolt-supplies-ltd`). Tier 1 rows supply the reporting
//! entity; deeper tiers supply the row's `parent_supplier`, looked up by
//! supplier ID first and then by name.

use super::diagnostic::Diagnostic;
use super::error::{FatalError, ImportResult};
use super::ids::disambiguate;
use super::parser::{inline_identifier, Admission, ParsedRow, ParsedSheet, RowReader};
use super::record::{EdgeRecord, EndpointRef, MetadataRecord, NodeRecord, Record};
use crate::graph::{
    DataQuality, DisclosureScope, EdgeKind, EdgeProperties, IdentifierScheme, NodeAttributes,
    NodeId, OrganizationAttrs,
};
use crate::sheet::{Sheet, SheetKind, SourceRow};
use crate::validate::{validate_cell, TypedValue};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Authority on the internal identifier made from `supplier_id`
pub const SUPPLIER_LIST_AUTHORITY: &str = "supplier-list";

/// Deepest tier the layout distinguishes; deeper tiers are recorded as 3.
const MAX_TIER: i64 = 3;

const MAX_SLUG_LEN: usize = 48;

/// Slug node ID for an organization: `org-` and the name lowercased, with
/// each run of other characters collapsed to one hyphen.
pub(crate) fn org_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "org".to_string()
    } else {
        format!("org-{}", slug)
    }
}

fn preamble_origin(key: &str) -> SourceRow {
    let row = if key == "disclosure_scope" { 2 } else { 1 };
    SourceRow::new(SheetKind::SupplierList, row)
}

struct Preamble {
    reporting_entity: Option<String>,
    snapshot_date: Option<NaiveDate>,
    disclosure_scope: Option<DisclosureScope>,
    diagnostics: Vec<Diagnostic>,
}

fn read_preamble(sheet: &Sheet) -> Preamble {
    let mut diagnostics = Vec::new();
    let mut field = |key: &str| -> Option<TypedValue> {
        let spec = SheetKind::SupplierList
            .preamble()
            .iter()
            .find(|spec| spec.name == key)?;
        match validate_cell(spec, sheet.preamble_value(key)) {
            Ok(value) => value,
            Err(failure) => {
                diagnostics.push(Diagnostic::from_validation(preamble_origin(key), &failure));
                None
            }
        }
    };

    let reporting_entity = field("reporting_entity").and_then(TypedValue::into_text);
    let snapshot_date = field("snapshot_date").and_then(|v| v.as_date());
    let disclosure_scope = field("disclosure_scope")
        .and_then(TypedValue::into_text)
        .and_then(|s| DisclosureScope::from_label(&s));

    Preamble {
        reporting_entity,
        snapshot_date,
        disclosure_scope,
        diagnostics,
    }
}

/// Import metadata from a Supplier List preamble, for workbooks without a
/// Metadata sheet.
///
/// A blank or malformed snapshot date or reporting entity is fatal. A blank
/// disclosure scope means partner.
pub fn parse_supplier_list_metadata(
    sheet: &Sheet,
) -> ImportResult<(MetadataRecord, Vec<Diagnostic>)> {
    let preamble = read_preamble(sheet);
    let reason = |key: &str| {
        preamble
            .diagnostics
            .iter()
            .find(|d| d.column.as_deref() == Some(key))
            .map(|d| d.message.clone())
            .unwrap_or_else(|| "value is blank".to_string())
    };

    let Some(snapshot_date) = preamble.snapshot_date else {
        return Err(FatalError::missing_metadata("snapshot_date", reason("snapshot_date")));
    };
    let Some(reporting_entity) = preamble.reporting_entity.as_deref() else {
        return Err(FatalError::missing_metadata(
            "reporting_entity",
            reason("reporting_entity"),
        ));
    };

    Ok((
        MetadataRecord {
            snapshot_date,
            reporting_entity: Some((
                NodeId::from(org_slug(reporting_entity)),
                preamble_origin("reporting_entity"),
            )),
            disclosure_scope: Some(preamble.disclosure_scope.unwrap_or(DisclosureScope::Partner)),
            defaults: DataQuality::default(),
        },
        preamble.diagnostics,
    ))
}

/// Supplier organizations gathered so far, with their lookup keys
struct Suppliers {
    reporting_entity: Option<NodeId>,
    records: Vec<NodeRecord>,
    ids: Vec<NodeId>,
    by_supplier_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl Suppliers {
    fn new(reporting_entity: Option<NodeId>) -> Self {
        let taken = reporting_entity
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        Self {
            reporting_entity,
            records: Vec::new(),
            ids: Vec::new(),
            by_supplier_id: HashMap::new(),
            by_name: HashMap::new(),
            taken,
        }
    }

    /// Index of the supplier a row names, creating it on first sight.
    fn find_or_insert(
        &mut self,
        name: &str,
        supplier_id: Option<&str>,
        origin: SourceRow,
    ) -> usize {
        let existing = match supplier_id {
            Some(sid) => self.by_supplier_id.get(sid).copied(),
            None => self.by_name.get(name).copied(),
        };
        let index = match existing {
            Some(index) => index,
            None => {
                let mut base = org_slug(name);
                if self.reporting_entity.as_ref().map(NodeId::as_str) == Some(base.as_str()) {
                    base.push_str("-supplier");
                }
                let id = disambiguate(base, &self.taken);
                self.taken.insert(id.clone());

                let mut record = NodeRecord::new(
                    origin,
                    NodeAttributes::Organization(OrganizationAttrs::default()),
                );
                record.declared_id = Some(NodeId::from(id.clone()));
                record.name = Some(name.to_string());
                self.records.push(record);
                self.ids.push(NodeId::from(id));
                self.records.len() - 1
            }
        };

        self.by_name.entry(name.to_string()).or_insert(index);
        if let Some(sid) = supplier_id {
            self.by_supplier_id.entry(sid.to_string()).or_insert(index);
        }
        index
    }

    /// Node a `parent_supplier` cell points at. Unknown parents pass through
    /// as raw IDs so the resolver reports them.
    fn parent(&self, reference: &str) -> NodeId {
        self.by_supplier_id
            .get(reference)
            .or_else(|| self.by_name.get(reference))
            .map(|&index| self.ids[index].clone())
            .unwrap_or_else(|| NodeId::from(reference.to_string()))
    }
}

/// Fold one row's organization columns into its supplier. The first
/// non-blank value of each attribute wins; identifiers are de-duplicated.
fn absorb(r: &mut RowReader<'_>, record: &mut NodeRecord, supplier_id: Option<&str>) {
    let jurisdiction = r.text("jurisdiction");
    let risk_tier = r.text("risk_tier");
    let kraljic_quadrant = r.text("kraljic_quadrant");
    let approval_status = r.text("approval_status");
    if let NodeAttributes::Organization(attrs) = &mut record.attributes {
        attrs.jurisdiction = attrs.jurisdiction.take().or(jurisdiction);
        attrs.risk_tier = attrs.risk_tier.take().or(risk_tier);
        attrs.kraljic_quadrant = attrs.kraljic_quadrant.take().or(kraljic_quadrant);
        attrs.approval_status = attrs.approval_status.take().or(approval_status);
    }

    let mut identifiers = Vec::new();
    if let Some(lei) = r.text("lei") {
        identifiers.push(inline_identifier(r, IdentifierScheme::Lei, lei));
    }
    if let Some(duns) = r.text("duns") {
        identifiers.push(inline_identifier(r, IdentifierScheme::Duns, duns));
    }
    if let Some((vat, country)) = r.paired("vat", "vat_country") {
        let mut id = inline_identifier(r, IdentifierScheme::Vat, vat);
        id.identifier.authority = Some(country);
        identifiers.push(id);
    }
    if let Some(sid) = supplier_id {
        let mut id = inline_identifier(r, IdentifierScheme::Internal, sid.to_string());
        id.identifier.authority = Some(SUPPLIER_LIST_AUTHORITY.to_string());
        identifiers.push(id);
    }

    for id in identifiers {
        let known = record
            .identifiers
            .iter()
            .any(|k| k.identifier.dedup_key() == id.identifier.dedup_key());
        if !known {
            record.identifiers.push(id);
        }
    }
}

/// The `supplies` edge a row describes, or `None` when its tier or target
/// is unusable.
fn supply_edge(r: &mut RowReader<'_>, source: NodeId, suppliers: &Suppliers) -> Option<Record> {
    let tier_cell_blank = r.is_blank("tier");
    let tier = r.integer("tier");
    let parent = r.text("parent_supplier");
    let valid_from = r.date("valid_from");
    let properties = EdgeProperties {
        commodity: r.text("commodity"),
        annual_value: r.number("annual_value"),
        value_currency: r.text("value_currency"),
        contract_ref: r.text("contract_ref"),
        ..EdgeProperties::default()
    };

    let tier = match tier {
        Some(tier) => tier.min(MAX_TIER),
        None if tier_cell_blank => 1,
        None => return None,
    };

    let target = if tier == 1 {
        let Some(id) = suppliers.reporting_entity.clone() else {
            r.reject(
                "reporting_entity",
                "a reporting entity in the preamble for tier 1 suppliers",
                "",
                true,
            );
            return None;
        };
        EndpointRef {
            column: "reporting_entity",
            id,
        }
    } else {
        let Some(parent) = parent else {
            r.reject(
                "parent_supplier",
                &format!("a value for tier {} suppliers", tier),
                "",
                true,
            );
            return None;
        };
        EndpointRef {
            column: "parent_supplier",
            id: suppliers.parent(&parent),
        }
    };

    Some(Record::Edge(EdgeRecord {
        origin: r.origin,
        declared_id: None,
        kind: EdgeKind::Supplies,
        source: EndpointRef {
            column: "supplier_name",
            id: source,
        },
        target,
        valid_from,
        valid_to: None,
        properties: EdgeProperties {
            tier: Some(tier),
            ..properties
        },
        data_quality: DataQuality::default(),
    }))
}

/// Lower a Supplier List to organization and `supplies` records.
///
/// The reporting entity comes first (preamble row 1), then each supplier at
/// the row that first names it, then one edge per data row.
pub fn parse_supplier_list(sheet: &Sheet) -> ParsedSheet {
    let kind = SheetKind::SupplierList;
    let entity_name = sheet.preamble_value("reporting_entity").render();
    let mut suppliers = Suppliers::new(entity_name.as_deref().map(|n| NodeId::from(org_slug(n))));

    // 1. Suppliers, so parents can be referenced before the row naming them
    let mut pending = Vec::new();
    for (row_number, row) in sheet.data_rows() {
        let mut r = RowReader::new(kind, row_number, row);
        let supplier = r.text("supplier_name").map(|name| {
            let supplier_id = r.text("supplier_id");
            let index = suppliers.find_or_insert(&name, supplier_id.as_deref(), r.origin);
            absorb(&mut r, &mut suppliers.records[index], supplier_id.as_deref());
            index
        });
        pending.push((r, supplier));
    }

    // 2. One edge per row
    let mut edges = Vec::with_capacity(pending.len());
    for (mut r, supplier) in pending {
        let record = supplier
            .and_then(|index| supply_edge(&mut r, suppliers.ids[index].clone(), &suppliers));
        edges.push(r.finish(record, Admission::Partial));
    }

    let mut rows = Vec::with_capacity(suppliers.records.len() + edges.len() + 1);
    if let (Some(name), Some(id)) = (entity_name, suppliers.reporting_entity.clone()) {
        let origin = preamble_origin("reporting_entity");
        let mut record = NodeRecord::new(
            origin,
            NodeAttributes::Organization(OrganizationAttrs::default()),
        );
        record.declared_id = Some(id);
        record.name = Some(name);
        rows.push(node_row(record));
    }
    rows.extend(suppliers.records.into_iter().map(node_row));
    rows.extend(edges);

    tracing::debug!(rows = rows.len(), "supplier list lowered");
    ParsedSheet { kind, rows }
}

fn node_row(record: NodeRecord) -> ParsedRow {
    ParsedRow {
        origin: record.origin,
        record: Some(Record::Node(record)),
        failures: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::diagnostic::DiagnosticKind;

    /// Acme buys fasteners from Bolt (tier 1). Bolt buys wire from Sheffield
    /// Steel (tier 2), which buys ore from Ore Mine (tier 3).
    fn tiered_list() -> Sheet {
        Sheet::new("Supplier List")
            .with_preamble("Reporting Entity", "Acme Manufacturing")
            .with_preamble("Snapshot Date", "2026-02-17")
            .with_preamble("Disclosure Scope", "")
            .with_headers([
                "supplier_name",
                "supplier_id",
                "tier",
                "parent_supplier",
                "commodity",
                "duns",
                "risk_tier",
            ])
            .with_values(["Bolt Supplies Ltd", "S-001", "1", "", "fasteners", "234567890", "high"])
            .with_values(["Sheffield Steel", "S-002", "2", "S-001", "steel wire", "", ""])
            .with_values(["Bolt Supplies Ltd", "S-001", "1", "", "washers", "234567890", "low"])
            .with_values(["Ore Mine", "", "3", "Sheffield Steel", "iron ore", "", ""])
            .with_values(["Rolling Mill", "S-004", "2", "", "", "", ""])
            .with_values(["Acme Manufacturing", "S-005", "1", "", "", "", ""])
    }

    fn nodes(parsed: &ParsedSheet) -> Vec<&NodeRecord> {
        parsed
            .rows
            .iter()
            .filter_map(|r| match &r.record {
                Some(Record::Node(n)) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn edges(parsed: &ParsedSheet) -> Vec<&EdgeRecord> {
        parsed
            .rows
            .iter()
            .filter_map(|r| match &r.record {
                Some(Record::Edge(e)) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn slugs() {
        assert_eq!(org_slug("Bolt Supplies Ltd"), "org-bolt-supplies-ltd");
        assert_eq!(org_slug("  A&B  Co. "), "org-a-b-co");
        assert_eq!(org_slug("株式会社"), "org");
        assert_eq!(org_slug(&"x".repeat(60)).len(), "org-".len() + 48);
    }

    #[test]
    fn suppliers_are_keyed_by_supplier_id_then_name() {
        let parsed = parse_supplier_list(&tiered_list());
        let ids: Vec<&str> = nodes(&parsed)
            .iter()
            .filter_map(|n| n.declared_id.as_ref().map(NodeId::as_str))
            .collect();
        assert_eq!(
            ids,
            vec![
                "org-acme-manufacturing",
                "org-bolt-supplies-ltd",
                "org-sheffield-steel",
                "org-ore-mine",
                "org-rolling-mill",
                "org-acme-manufacturing-supplier",
            ]
        );

        let bolt = nodes(&parsed)[1];
        assert_eq!(bolt.origin.row, 5);
        assert_eq!(bolt.identifiers.len(), 2, "duns and supplier_id, once each");
        assert!(bolt.identifiers.iter().any(|id| {
            id.identifier.scheme == IdentifierScheme::Internal
                && id.identifier.authority.as_deref() == Some(SUPPLIER_LIST_AUTHORITY)
        }));
        let NodeAttributes::Organization(attrs) = &bolt.attributes else {
            panic!("supplier should be an organization");
        };
        assert_eq!(attrs.risk_tier.as_deref(), Some("high"));
    }

    #[test]
    fn tiers_pick_their_buyer() {
        let parsed = parse_supplier_list(&tiered_list());
        let pairs: Vec<(&str, &str, Option<i64>)> = edges(&parsed)
            .iter()
            .map(|e| (e.source.id.as_str(), e.target.id.as_str(), e.properties.tier))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("org-bolt-supplies-ltd", "org-acme-manufacturing", Some(1)),
                ("org-sheffield-steel", "org-bolt-supplies-ltd", Some(2)),
                ("org-bolt-supplies-ltd", "org-acme-manufacturing", Some(1)),
                ("org-ore-mine", "org-sheffield-steel", Some(3)),
                ("org-acme-manufacturing-supplier", "org-acme-manufacturing", Some(1)),
            ]
        );
        assert!(edges(&parsed).iter().all(|e| e.kind == EdgeKind::Supplies));
    }

    #[test]
    fn deeper_tier_without_parent_keeps_the_supplier_only() {
        let parsed = parse_supplier_list(&tiered_list());
        let row = parsed
            .rows
            .iter()
            .find(|r| r.origin.row == 9 && !matches!(r.record, Some(Record::Node(_))))
            .expect("edge row for Rolling Mill");
        assert!(row.record.is_none());
        assert_eq!(row.failures.len(), 1);
        assert_eq!(row.failures[0].column.as_deref(), Some("parent_supplier"));
        assert!(nodes(&parsed)
            .iter()
            .any(|n| n.name.as_deref() == Some("Rolling Mill")));
    }

    #[test]
    fn tiers_above_three_are_clamped_and_bad_tiers_drop_the_edge() {
        let sheet = Sheet::new("Supplier List")
            .with_preamble("Reporting Entity", "Acme")
            .with_headers(["supplier_name", "tier", "parent_supplier"])
            .with_values(["Bolt", "1", ""])
            .with_values(["Deep", "7", "Bolt"])
            .with_values(["Odd", "first", ""]);
        let parsed = parse_supplier_list(&sheet);

        let tiers: Vec<Option<i64>> = edges(&parsed).iter().map(|e| e.properties.tier).collect();
        assert_eq!(tiers, vec![Some(1), Some(3)]);
        let odd = parsed.rows.last().expect("edge row for Odd");
        assert!(odd.record.is_none());
        assert_eq!(odd.failures[0].kind, DiagnosticKind::InvalidFormat);
        assert_eq!(odd.failures[0].column.as_deref(), Some("tier"));
    }

    #[test]
    fn metadata_from_preamble() {
        let (metadata, diagnostics) = parse_supplier_list_metadata(&tiered_list()).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(metadata.snapshot_date.to_string(), "2026-02-17");
        assert_eq!(metadata.disclosure_scope, Some(DisclosureScope::Partner));
        let (entity, origin) = metadata.reporting_entity.expect("reporting entity");
        assert_eq!(entity.as_str(), "org-acme-manufacturing");
        assert_eq!(origin, SourceRow::new(SheetKind::SupplierList, 1));
    }

    #[test]
    fn preamble_without_date_or_entity_is_fatal() {
        let no_date = Sheet::new("Supplier List").with_preamble("Reporting Entity", "Acme");
        assert!(matches!(
            parse_supplier_list_metadata(&no_date),
            Err(FatalError::MissingRequiredMetadata { field, .. }) if field == "snapshot_date"
        ));

        let no_entity = Sheet::new("Supplier List").with_preamble("Snapshot Date", "2026-02-17");
        assert!(matches!(
            parse_supplier_list_metadata(&no_entity),
            Err(FatalError::MissingRequiredMetadata { field, .. }) if field == "reporting_entity"
        ));
    }

    #[test]
    fn unknown_scope_is_reported_and_falls_back_to_partner() {
        let sheet = tiered_list().with_preamble("Disclosure Scope", "secret");
        let (metadata, diagnostics) = parse_supplier_list_metadata(&sheet).unwrap();
        assert_eq!(metadata.disclosure_scope, Some(DisclosureScope::Partner));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].row, Some(2));
    }
}
