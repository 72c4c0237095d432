//! Sheet parser: raw rows to typed records
//!
//! Each sheet parses independently. A bad cell never aborts the sheet: it
//! becomes a diagnostic on that row and the row either yields a partial
//! record or none at all. Only the Metadata sheet (or, without one, a
//! Supplier List preamble) can fail the import.

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::error::{FatalError, ImportResult};
use super::record::{
    EdgeRecord, EndpointRef, IdentifierRecord, MetadataRecord, NodeRecord, PendingIdentifier,
    Record, SameAsRecord,
};
use super::supplier_list::parse_supplier_list;
use crate::graph::{
    AttestationAttrs, Confidence, ConsignmentAttrs, DataQuality, DisclosureScope, EdgeId,
    EdgeKind, EdgeProperties, FacilityAttrs, GoodAttrs, Identifier, IdentifierScheme,
    NodeAttributes, NodeId, OrganizationAttrs, PersonAttrs, SameAsConfidence, Sensitivity,
    VerificationStatus,
};
use crate::sheet::{CellValue, Row, Sheet, SheetKind, SourceRow};
use crate::validate::{validate_cell, CheckScheme, TypedValue};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Parse outcome for one non-empty data row
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub origin: SourceRow,
    /// `None` when the row was rejected
    pub record: Option<Record>,
    pub failures: Vec<Diagnostic>,
}

/// Parse outcome for one sheet
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub kind: SheetKind,
    pub rows: Vec<ParsedRow>,
}

impl ParsedSheet {
    pub fn admitted(&self) -> usize {
        self.rows.iter().filter(|r| r.record.is_some()).count()
    }
}

/// Parse every non-empty data row of a data sheet.
pub fn parse_sheet(kind: SheetKind, sheet: &Sheet) -> ParsedSheet {
    if kind == SheetKind::SupplierList {
        return parse_supplier_list(sheet);
    }
    let rows = sheet
        .data_rows()
        .map(|(row_number, row)| {
            let reader = RowReader::new(kind, row_number, row);
            match kind {
                SheetKind::Organizations => parse_organization(reader),
                SheetKind::Facilities => parse_facility(reader),
                SheetKind::Goods => parse_good(reader),
                SheetKind::Persons => parse_person(reader),
                SheetKind::Attestations => parse_attestation(reader),
                SheetKind::Consignments => parse_consignment(reader),
                SheetKind::SupplyRelationships => parse_supply_edge(reader),
                SheetKind::CorporateStructure => parse_corporate_edge(reader),
                SheetKind::SameAs => parse_same_as(reader),
                SheetKind::Identifiers => parse_identifier(reader),
                SheetKind::Metadata | SheetKind::SupplierList => {
                    reader.finish(None, Admission::Strict)
                }
            }
        })
        .collect();
    ParsedSheet { kind, rows }
}

/// Whether a row with failures still yields its record
#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum Admission {
    /// Admit unless a required column failed; bad optional fields are dropped
    Partial,
    /// Admit only failure-free rows
    Strict,
}

/// Pulls validated values out of one row, accumulating failures.
pub(super) struct RowReader<'a> {
    sheet: SheetKind,
    row: &'a Row,
    pub(super) origin: SourceRow,
    failures: Vec<Diagnostic>,
    required_failed: bool,
}

impl<'a> RowReader<'a> {
    pub(super) fn new(sheet: SheetKind, row_number: usize, row: &'a Row) -> Self {
        Self {
            sheet,
            row,
            origin: SourceRow::new(sheet, row_number),
            failures: Vec::new(),
            required_failed: false,
        }
    }

    fn take(&mut self, column: &str) -> Option<TypedValue> {
        let spec = self.sheet.column(column)?;
        match validate_cell(spec, self.row.get(column)) {
            Ok(value) => value,
            Err(failure) => {
                if spec.required {
                    self.required_failed = true;
                }
                self.failures
                    .push(Diagnostic::from_validation(self.origin, &failure));
                None
            }
        }
    }

    pub(super) fn is_blank(&self, column: &str) -> bool {
        self.row.get(column).is_blank()
    }

    pub(super) fn text(&mut self, column: &str) -> Option<String> {
        self.take(column).and_then(TypedValue::into_text)
    }

    fn node_id(&mut self, column: &str) -> Option<NodeId> {
        self.text(column).map(NodeId::from)
    }

    pub(super) fn date(&mut self, column: &str) -> Option<NaiveDate> {
        self.take(column).and_then(|v| v.as_date())
    }

    pub(super) fn number(&mut self, column: &str) -> Option<f64> {
        self.take(column).and_then(|v| v.as_number())
    }

    pub(super) fn integer(&mut self, column: &str) -> Option<i64> {
        self.take(column).and_then(|v| v.as_integer())
    }

    fn boolean(&mut self, column: &str) -> Option<bool> {
        self.take(column).and_then(|v| v.as_bool())
    }

    fn sensitivity(&mut self) -> Option<Sensitivity> {
        self.text("sensitivity")
            .and_then(|s| Sensitivity::from_label(&s))
    }

    fn data_quality(&mut self) -> DataQuality {
        DataQuality {
            confidence: self
                .text("confidence")
                .and_then(|c| Confidence::from_label(&c)),
            source: self.text("source"),
            last_verified: self.date("last_verified"),
        }
    }

    /// Record a failed row rule (one that spans columns).
    pub(super) fn reject(&mut self, column: &str, expected: &str, actual: &str, required: bool) {
        if required {
            self.required_failed = true;
        }
        self.failures.push(
            Diagnostic::new(
                DiagnosticKind::InvalidFormat,
                self.origin,
                format!("{}: expected {}, got '{}'", column, expected, actual),
            )
            .in_column(column),
        );
    }

    /// Read `valid_from`/`valid_to`, dropping `valid_to` if it precedes
    /// `valid_from`.
    fn validity_window(&mut self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let from = self.date("valid_from");
        let to = self.date("valid_to");
        match (from, to) {
            (Some(f), Some(t)) if f > t => {
                self.reject(
                    "valid_to",
                    &format!("a date on or after valid_from ({})", f),
                    &t.to_string(),
                    false,
                );
                (from, None)
            }
            _ => (from, to),
        }
    }

    /// Value column that needs a companion column (e.g. an authority).
    pub(super) fn paired(
        &mut self,
        value_column: &str,
        companion: &str,
    ) -> Option<(String, String)> {
        let value = self.text(value_column);
        let other = self.text(companion);
        match (value, other) {
            (Some(v), Some(o)) => Some((v, o)),
            (Some(_), None) => {
                self.reject(
                    companion,
                    &format!("a value when {} is set", value_column),
                    "",
                    false,
                );
                None
            }
            _ => None,
        }
    }

    pub(super) fn finish(self, record: Option<Record>, admission: Admission) -> ParsedRow {
        let admitted = !self.required_failed
            && (admission == Admission::Partial || self.failures.is_empty());
        ParsedRow {
            origin: self.origin,
            record: record.filter(|_| admitted),
            failures: self.failures,
        }
    }
}

fn node_row(
    mut r: RowReader<'_>,
    attributes: NodeAttributes,
    identifiers: Vec<PendingIdentifier>,
) -> ParsedRow {
    let mut record = NodeRecord::new(r.origin, attributes);
    record.declared_id = r.node_id("id");
    record.name = r.text("name");
    record.sensitivity = r.sensitivity();
    record.identifiers = identifiers;
    r.finish(Some(Record::Node(record)), Admission::Partial)
}

pub(super) fn inline_identifier(
    r: &RowReader<'_>,
    scheme: IdentifierScheme,
    value: String,
) -> PendingIdentifier {
    PendingIdentifier::inline(Identifier::new(scheme, value), r.origin)
}

fn parse_organization(mut r: RowReader<'_>) -> ParsedRow {
    let attributes = NodeAttributes::Organization(OrganizationAttrs {
        jurisdiction: r.text("jurisdiction"),
        status: r.text("status"),
        risk_tier: r.text("risk_tier"),
        kraljic_quadrant: r.text("kraljic_quadrant"),
        approval_status: r.text("approval_status"),
    });

    let mut identifiers = Vec::new();
    if let Some(lei) = r.text("lei") {
        identifiers.push(inline_identifier(&r, IdentifierScheme::Lei, lei));
    }
    if let Some(duns) = r.text("duns") {
        identifiers.push(inline_identifier(&r, IdentifierScheme::Duns, duns));
    }
    let registries = [
        (IdentifierScheme::NatReg, "nat_reg_value", "nat_reg_authority"),
        (IdentifierScheme::Vat, "vat_value", "vat_country"),
        (IdentifierScheme::Internal, "internal_id", "internal_system"),
    ];
    for (scheme, value_column, authority_column) in registries {
        if let Some((value, authority)) = r.paired(value_column, authority_column) {
            let mut id = inline_identifier(&r, scheme, value);
            id.identifier.authority = Some(authority);
            identifiers.push(id);
        }
    }
    node_row(r, attributes, identifiers)
}

fn parse_facility(mut r: RowReader<'_>) -> ParsedRow {
    let attributes = NodeAttributes::Facility(FacilityAttrs {
        operator: r.node_id("operator_id"),
        address: r.text("address"),
        latitude: r.number("latitude"),
        longitude: r.number("longitude"),
    });

    let mut identifiers = Vec::new();
    if let Some(gln) = r.text("gln") {
        identifiers.push(inline_identifier(&r, IdentifierScheme::Gln, gln));
    }
    if let Some((value, system)) = r.paired("internal_id", "internal_system") {
        let mut id = inline_identifier(&r, IdentifierScheme::Internal, value);
        id.identifier.authority = Some(system);
        identifiers.push(id);
    }
    node_row(r, attributes, identifiers)
}

fn parse_good(mut r: RowReader<'_>) -> ParsedRow {
    let attributes = NodeAttributes::Good(GoodAttrs {
        commodity_code: r.text("commodity_code"),
        unit: r.text("unit"),
    });
    let mut identifiers = Vec::new();
    if let Some(gtin) = r.text("gtin") {
        let scheme = IdentifierScheme::from_label(IdentifierScheme::GTIN);
        identifiers.push(inline_identifier(&r, scheme, gtin));
    }
    node_row(r, attributes, identifiers)
}

fn parse_person(mut r: RowReader<'_>) -> ParsedRow {
    let attributes = NodeAttributes::Person(PersonAttrs {
        jurisdiction: r.text("jurisdiction"),
        role: r.text("role"),
        nationality: r.text("nationality"),
    });
    node_row(r, attributes, Vec::new())
}

fn parse_attestation(mut r: RowReader<'_>) -> ParsedRow {
    let (valid_from, valid_to) = r.validity_window();
    let attributes = NodeAttributes::Attestation(AttestationAttrs {
        attestation_type: r.text("attestation_type"),
        standard: r.text("standard"),
        issuer: r.text("issuer"),
        valid_from,
        valid_to,
        outcome: r.text("outcome"),
        status: r.text("status"),
        reference: r.text("reference"),
        risk_severity: r.text("risk_severity"),
        risk_likelihood: r.text("risk_likelihood"),
        scope: r.text("scope"),
    });
    let attests = r.node_id("attested_entity_id");
    let data_quality = r.data_quality();

    let mut row = node_row(r, attributes, Vec::new());
    if let Some(Record::Node(record)) = row.record.as_mut() {
        record.attests = attests;
        record.data_quality = data_quality;
    }
    row
}

fn parse_consignment(mut r: RowReader<'_>) -> ParsedRow {
    let attributes = NodeAttributes::Consignment(ConsignmentAttrs {
        lot_id: r.text("lot_id"),
        quantity: r.number("quantity"),
        unit: r.text("unit"),
        production_date: r.date("production_date"),
        origin_country: r.text("origin_country"),
        installation: r.node_id("installation_id"),
        direct_emissions_co2e: r.number("direct_emissions_co2e"),
        indirect_emissions_co2e: r.number("indirect_emissions_co2e"),
        emission_factor_source: r.text("emission_factor_source"),
    });
    node_row(r, attributes, Vec::new())
}

fn edge_row(
    mut r: RowReader<'_>,
    kind: EdgeKind,
    (source_column, target_column): (&'static str, &'static str),
    properties: EdgeProperties,
) -> ParsedRow {
    let declared_id = r.text("id").map(EdgeId::from_string);
    let source = r.node_id(source_column);
    let target = r.node_id(target_column);
    let (valid_from, valid_to) = r.validity_window();
    let data_quality = r.data_quality();

    let record = match (source, target) {
        (Some(source), Some(target)) => Some(Record::Edge(EdgeRecord {
            origin: r.origin,
            declared_id,
            kind,
            source: EndpointRef {
                column: source_column,
                id: source,
            },
            target: EndpointRef {
                column: target_column,
                id: target,
            },
            valid_from,
            valid_to,
            properties,
            data_quality,
        })),
        _ => None,
    };
    r.finish(record, Admission::Strict)
}

fn edge_kind(r: &mut RowReader<'_>, default: EdgeKind) -> EdgeKind {
    r.text("type")
        .and_then(|t| EdgeKind::from_label(&t))
        .unwrap_or(default)
}

fn parse_supply_edge(mut r: RowReader<'_>) -> ParsedRow {
    let kind = edge_kind(&mut r, EdgeKind::Supplies);
    let properties = EdgeProperties {
        commodity: r.text("commodity"),
        tier: r.integer("tier"),
        volume: r.number("volume"),
        volume_unit: r.text("volume_unit"),
        annual_value: r.number("annual_value"),
        value_currency: r.text("value_currency"),
        contract_ref: r.text("contract_ref"),
        share_of_buyer_demand: r.number("share_of_buyer_demand"),
        service_type: r.text("service_type"),
        ..EdgeProperties::default()
    };
    edge_row(r, kind, ("supplier_id", "buyer_id"), properties)
}

fn parse_corporate_edge(mut r: RowReader<'_>) -> ParsedRow {
    let kind = edge_kind(&mut r, EdgeKind::Ownership);
    let properties = EdgeProperties {
        percentage: r.number("percentage"),
        direct: r.boolean("direct"),
        control_type: r.text("control_type"),
        consolidation_basis: r.text("consolidation_basis"),
        ..EdgeProperties::default()
    };

    if properties.control_type.is_none()
        && matches!(kind, EdgeKind::OperationalControl | EdgeKind::BeneficialOwnership)
    {
        r.reject("control_type", &format!("a value for {} edges", kind), "", false);
    }
    if properties.consolidation_basis.is_none() && kind == EdgeKind::LegalParentage {
        r.reject("consolidation_basis", "a value for legal_parentage edges", "", false);
    }
    edge_row(r, kind, ("subsidiary_id", "parent_id"), properties)
}

fn parse_same_as(mut r: RowReader<'_>) -> ParsedRow {
    let entity_a = r.node_id("entity_a");
    let entity_b = r.node_id("entity_b");
    let confidence = r
        .text("confidence")
        .and_then(|c| SameAsConfidence::from_label(&c));
    let basis = r.text("basis");

    let record = match (entity_a, entity_b) {
        (Some(entity_a), Some(entity_b)) => Some(Record::SameAs(SameAsRecord {
            origin: r.origin,
            entity_a,
            entity_b,
            confidence,
            basis,
        })),
        _ => None,
    };
    r.finish(record, Admission::Strict)
}

fn parse_identifier(mut r: RowReader<'_>) -> ParsedRow {
    let node_id = r.node_id("node_id");
    let scheme = r.text("scheme").map(|s| IdentifierScheme::from_label(&s));
    let value = r.text("value");
    let authority = r.text("authority");
    let sensitivity = r.sensitivity();
    let (valid_from, valid_to) = r.validity_window();
    let verification_status = r
        .text("verification_status")
        .and_then(|v| VerificationStatus::from_label(&v))
        .unwrap_or_default();

    if let (Some(scheme), Some(value)) = (&scheme, &value) {
        if let Some(check) = CheckScheme::for_scheme(scheme.as_str()) {
            if !check.is_valid(value) {
                r.failures.push(
                    Diagnostic::new(
                        DiagnosticKind::InvalidIdentifierFormat {
                            scheme: scheme.to_string(),
                        },
                        r.origin,
                        format!("value: '{}' is not a valid {} identifier", value, scheme),
                    )
                    .in_column("value"),
                );
            }
        }
        if scheme.requires_authority() && authority.is_none() {
            r.reject("authority", &format!("a value for {} identifiers", scheme), "", false);
        }
    }

    let record = match (node_id, scheme, value) {
        (Some(node_id), Some(scheme), Some(value)) => {
            let mut identifier = Identifier::new(scheme, value);
            identifier.authority = authority;
            identifier.valid_from = valid_from;
            identifier.valid_to = valid_to;
            identifier.verification_status = verification_status;
            if let Some(s) = sensitivity {
                identifier.sensitivity = s;
            }
            Some(Record::Identifier(IdentifierRecord {
                node_id,
                identifier: PendingIdentifier {
                    identifier,
                    explicit_sensitivity: sensitivity.is_some(),
                    from_identifiers_sheet: true,
                    origin: r.origin,
                },
            }))
        }
        _ => None,
    };
    r.finish(record, Admission::Strict)
}

/// Parse the key/value Metadata sheet.
///
/// A missing sheet or a blank or malformed `snapshot_date` is fatal. Other
/// bad values are reported and treated as absent.
pub fn parse_metadata(sheet: Option<&Sheet>) -> ImportResult<(MetadataRecord, Vec<Diagnostic>)> {
    let sheet = sheet.ok_or_else(|| {
        FatalError::missing_metadata(
            "snapshot_date",
            "workbook has neither a Metadata sheet nor a Supplier List",
        )
    })?;
    let (key_column, value_column) = sheet.key_value_columns();

    let mut entries: HashMap<String, (usize, &CellValue)> = HashMap::new();
    for (row_number, row) in sheet.data_rows() {
        let Some(key) = row.get(key_column).render() else {
            continue;
        };
        let key = key.to_ascii_lowercase();
        if key == key_column.to_ascii_lowercase() {
            continue;
        }
        entries
            .entry(key)
            .or_insert((row_number, row.get(value_column)));
    }

    let blank = CellValue::Blank;
    let mut diagnostics = Vec::new();
    let mut field = |key: &str| -> Option<(TypedValue, SourceRow)> {
        let spec = SheetKind::Metadata.column(key)?;
        let (row, cell) = entries.get(key).copied().unwrap_or((0, &blank));
        let origin = SourceRow::new(SheetKind::Metadata, row);
        match validate_cell(spec, cell) {
            Ok(value) => value.map(|v| (v, origin)),
            Err(failure) => {
                diagnostics.push(Diagnostic::from_validation(origin, &failure));
                None
            }
        }
    };

    let snapshot_date = field("snapshot_date").and_then(|(v, _)| v.as_date());
    let reporting_entity = field("reporting_entity")
        .and_then(|(v, origin)| v.into_text().map(|id| (NodeId::from(id), origin)));
    let disclosure_scope = field("disclosure_scope")
        .and_then(|(v, _)| v.into_text())
        .and_then(|s| DisclosureScope::from_label(&s));
    let defaults = DataQuality {
        confidence: field("default_confidence")
            .and_then(|(v, _)| v.into_text())
            .and_then(|c| Confidence::from_label(&c)),
        source: field("default_source").and_then(|(v, _)| v.into_text()),
        last_verified: field("default_last_verified").and_then(|(v, _)| v.as_date()),
    };

    let Some(snapshot_date) = snapshot_date else {
        let reason = diagnostics
            .iter()
            .find(|d| d.column.as_deref() == Some("snapshot_date"))
            .map(|d| d.message.clone())
            .unwrap_or_else(|| "value is blank".to_string());
        return Err(FatalError::missing_metadata("snapshot_date", reason));
    };

    Ok((
        MetadataRecord {
            snapshot_date,
            reporting_entity,
            disclosure_scope,
            defaults,
        },
        diagnostics,
    ))
}
