//! The import pipeline
//!
//! parse (parallel, per sheet) → assign IDs → resolve → merge → policy →
//! assemble. Parsing is the only concurrent stage; resolution waits for
//! every sheet. The cancellation token is checked between stages.

use super::assemble::{assemble, AssemblyContext};
use super::error::{FatalError, ImportResult};
use super::ids::assign_ids;
use super::merge::merge_equivalents;
use super::options::ImportOptions;
use super::parser::{parse_metadata, parse_sheet, ParsedSheet};
use super::policy::{enforce, PolicyContext};
use super::record::RecordSet;
use super::resolve::resolve;
use super::supplier_list::parse_supplier_list_metadata;
use crate::graph::GraphDocument;
use crate::sheet::{Sheet, SheetKind, SourceError, WorkbookSource};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Import a workbook's sheets into a validated graph document.
///
/// Row-level problems end up in the document's diagnostics report. An
/// `Err` means no document could be produced.
pub async fn import(sheets: Vec<Sheet>, options: ImportOptions) -> ImportResult<GraphDocument> {
    let cancel = &options.cancellation;
    let salt = options.salt.resolve()?;

    // Step 1: Sort sheets into metadata and data sheets
    let mut metadata_sheet: Option<Sheet> = None;
    let mut data_sheets: Vec<(usize, SheetKind, Sheet)> = Vec::new();
    for (index, sheet) in sheets.into_iter().enumerate() {
        match sheet.kind() {
            None => tracing::debug!(sheet = %sheet.name, "skipping unrecognised sheet"),
            Some(SheetKind::Metadata) if metadata_sheet.is_some() => {
                tracing::warn!(sheet = %sheet.name, "ignoring repeated Metadata sheet")
            }
            Some(SheetKind::Metadata) => metadata_sheet = Some(sheet),
            Some(kind) => data_sheets.push((index, kind, sheet)),
        }
    }

    // Step 2: Metadata; failures here are fatal. Without a Metadata sheet a
    // Supplier List preamble stands in.
    let supplier_list = data_sheets
        .iter()
        .find(|(_, kind, _)| *kind == SheetKind::SupplierList)
        .map(|(_, _, sheet)| sheet);
    let (metadata, mut diagnostics) = match (&metadata_sheet, supplier_list) {
        (None, Some(sheet)) => parse_supplier_list_metadata(sheet)?,
        (Some(_), Some(sheet)) => {
            tracing::debug!(
                sheet = %sheet.name,
                "Metadata sheet takes precedence over the supplier list preamble"
            );
            parse_metadata(metadata_sheet.as_ref())?
        }
        _ => parse_metadata(metadata_sheet.as_ref())?,
    };
    let scope = metadata
        .disclosure_scope
        .unwrap_or_default()
        .stricter(options.scope_override);
    tracing::info!(
        snapshot_date = %metadata.snapshot_date,
        scope = %scope,
        sheets = data_sheets.len(),
        "starting import"
    );
    cancel.checkpoint("metadata")?;

    // Step 3: Parse data sheets concurrently
    let parsed = parse_sheets(data_sheets, options.max_parallel_sheets).await?;
    cancel.checkpoint("parse")?;

    let mut records = RecordSet::default();
    let mut person_rows = Vec::new();
    for sheet in parsed {
        for row in sheet.rows {
            if sheet.kind == SheetKind::Persons {
                person_rows.push(row.origin);
            }
            diagnostics.extend(row.failures);
            if let Some(record) = row.record {
                records.push(record);
            }
        }
    }

    // Step 4: IDs
    let (assigned, id_diagnostics) = assign_ids(records, &salt);
    diagnostics.extend(id_diagnostics);
    cancel.checkpoint("assign ids")?;

    // Step 5: References
    let (mut graph, resolve_diagnostics) = resolve(assigned, metadata.reporting_entity.as_ref());
    diagnostics.extend(resolve_diagnostics);
    cancel.checkpoint("resolve")?;

    // Step 6: Same-as merge
    diagnostics.extend(merge_equivalents(&mut graph, options.conflict_policy));
    cancel.checkpoint("merge")?;

    // Step 7: Disclosure policy
    let policy = PolicyContext {
        scope,
        defaults: &metadata.defaults,
        salt: &salt,
        person_rows: &person_rows,
    };
    diagnostics.extend(enforce(&mut graph, &policy)?);
    cancel.checkpoint("policy")?;

    // Step 8: Assemble
    for d in &diagnostics {
        tracing::debug!(diagnostic = %d, "diagnostic");
    }
    let context = AssemblyContext {
        snapshot_date: metadata.snapshot_date,
        scope,
        defaults: metadata.defaults,
        salt_hex: salt.to_hex(),
    };
    Ok(assemble(graph, context, diagnostics))
}

/// Parse each sheet on the blocking pool, at most `limit` at a time.
///
/// Results come back in canonical sheet order; sheets of the same kind keep
/// their workbook order.
async fn parse_sheets(
    sheets: Vec<(usize, SheetKind, Sheet)>,
    limit: usize,
) -> ImportResult<Vec<ParsedSheet>> {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut join_set: JoinSet<ImportResult<(SheetKind, usize, ParsedSheet)>> = JoinSet::new();

    for (index, kind, sheet) in sheets {
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| FatalError::Internal(format!("Semaphore error: {}", e)))?;
            let parsed = tokio::task::spawn_blocking(move || parse_sheet(kind, &sheet))
                .await
                .map_err(|e| FatalError::Internal(format!("parser for {} failed: {}", kind, e)))?;
            tracing::debug!(
                sheet = %kind,
                rows = parsed.rows.len(),
                admitted = parsed.admitted(),
                "sheet parsed"
            );
            Ok((kind, index, parsed))
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let result = joined.map_err(|e| FatalError::Internal(format!("parser task failed: {}", e)))?;
        results.push(result?);
    }
    results.sort_by_key(|(kind, index, _)| (*kind, *index));
    Ok(results.into_iter().map(|(_, _, parsed)| parsed).collect())
}

/// Errors from [`ImportPipeline::run`]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not read workbook: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Import(#[from] FatalError),
}

/// Loads a workbook from a source and imports it with fixed options.
#[derive(Debug, Clone, Default)]
pub struct ImportPipeline {
    options: ImportOptions,
}

impl ImportPipeline {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub async fn run(&self, source: &dyn WorkbookSource) -> Result<GraphDocument, PipelineError> {
        tracing::info!(source = %source.describe(), "loading workbook");
        let sheets = source.load_sheets().await?;
        Ok(import(sheets, self.options.clone()).await?)
    }
}
