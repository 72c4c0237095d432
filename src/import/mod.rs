//! Import pipeline: sheets in, validated graph document out
//!
//! Stages, in order:
//! - **parser**: rows to typed records, collecting row-level failures; a
//!   Supplier List is lowered to the same records
//! - **ids**: keep declared IDs, generate the rest from the file salt
//! - **resolve**: one node arena for all sheets; references become handles
//! - **merge**: collapse same-as groups into canonical nodes
//! - **policy**: sensitivity defaults, scope ceiling, data-quality defaults
//! - **assemble**: build the immutable [`GraphDocument`](crate::graph::GraphDocument)

mod assemble;
mod cancel;
mod diagnostic;
mod error;
mod ids;
mod merge;
mod options;
mod parser;
mod pipeline;
mod policy;
mod record;
mod resolve;
mod supplier_list;
mod union_find;

pub use cancel::CancellationToken;
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticsReport, Severity};
pub use error::{FatalError, ImportResult, PolicyViolation};
pub use ids::{FileSalt, SaltError};
pub use merge::ConflictPolicy;
pub use options::{ImportOptions, SaltSource};
pub use parser::{parse_metadata, parse_sheet, ParsedRow, ParsedSheet};
pub use pipeline::{import, ImportPipeline, PipelineError};
pub use record::{
    EdgeRecord, EndpointRef, IdentifierRecord, MetadataRecord, NodeRecord, PendingIdentifier,
    Record, SameAsRecord,
};
pub use supplier_list::{parse_supplier_list_metadata, SUPPLIER_LIST_AUTHORITY};
