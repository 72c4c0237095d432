//! Graph document model: nodes, edges, identifiers and file metadata

mod document;
mod edge;
mod identifier;
mod metadata;
mod node;


pub use document::{DocumentMetadata, GraphDocument};
pub use edge::{Edge, EdgeId, EdgeKind, EdgeProperties};
pub use identifier::{Identifier, IdentifierScheme, Sensitivity, VerificationStatus};
pub use metadata::{Confidence, DataQuality, DisclosureScope};
pub use node::{
    AlternateValue, AttestationAttrs, ConsignmentAttrs, EquivalenceAssertion, FacilityAttrs,
    GoodAttrs, MergeProvenance, Node, NodeAttributes, NodeId, NodeKind, NodeReference,
    OrganizationAttrs, PersonAttrs, SameAsConfidence,
};
