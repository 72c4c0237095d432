//! External identifiers attached to nodes, and the sensitivity labels that
//! govern whether they may be disclosed

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Confidentiality label on a node or identifier.
///
/// Variants are declared from least to most restrictive so `Ord` compares
/// restriction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Public,
    Restricted,
    Confidential,
}

impl Sensitivity {
    pub const LABELS: &'static [&'static str] = &["public", "restricted", "confidential"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "public" => Some(Self::Public),
            "restricted" => Some(Self::Restricted),
            "confidential" => Some(Self::Confidential),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
            Self::Confidential => "confidential",
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier scheme.
///
/// The six core schemes are closed; anything else must be a reverse-domain
/// extension scheme such as `org.gs1.gtin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum IdentifierScheme {
    Lei,
    Duns,
    Gln,
    NatReg,
    Vat,
    Internal,
    /// Salted token standing in for a withheld entity
    Opaque,
    Extension(String),
}

impl IdentifierScheme {
    pub const GTIN: &'static str = "org.gs1.gtin";

    pub fn from_label(label: &str) -> Self {
        match label {
            "lei" => Self::Lei,
            "duns" => Self::Duns,
            "gln" => Self::Gln,
            "nat-reg" => Self::NatReg,
            "vat" => Self::Vat,
            "internal" => Self::Internal,
            "opaque" => Self::Opaque,
            other => Self::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Lei => "lei",
            Self::Duns => "duns",
            Self::Gln => "gln",
            Self::NatReg => "nat-reg",
            Self::Vat => "vat",
            Self::Internal => "internal",
            Self::Opaque => "opaque",
            Self::Extension(s) => s,
        }
    }

    /// Whether an issuing authority must accompany the value.
    pub fn requires_authority(&self) -> bool {
        matches!(self, Self::NatReg | Self::Vat | Self::Internal)
    }

    /// Sensitivity applied when the row does not state one.
    ///
    /// Identifiers on person nodes are handled separately; see
    /// [`Identifier::default_sensitivity_for_person`].
    pub fn default_sensitivity(&self) -> Sensitivity {
        match self {
            Self::NatReg | Self::Vat | Self::Internal => Sensitivity::Restricted,
            _ => Sensitivity::Public,
        }
    }
}

impl std::fmt::Display for IdentifierScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IdentifierScheme> for String {
    fn from(scheme: IdentifierScheme) -> Self {
        scheme.as_str().to_string()
    }
}

impl From<String> for IdentifierScheme {
    fn from(s: String) -> Self {
        Self::from_label(&s)
    }
}

/// How far an identifier has been checked against its issuing registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    #[default]
    Reported,
    Inferred,
    Unverified,
}

impl VerificationStatus {
    pub const LABELS: &'static [&'static str] = &["verified", "reported", "inferred", "unverified"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "verified" => Some(Self::Verified),
            "reported" => Some(Self::Reported),
            "inferred" => Some(Self::Inferred),
            "unverified" => Some(Self::Unverified),
            _ => None,
        }
    }
}

/// An external identifier for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub scheme: IdentifierScheme,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    pub sensitivity: Sensitivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
}

impl Identifier {
    /// Create an identifier carrying its scheme's default sensitivity.
    pub fn new(scheme: IdentifierScheme, value: impl Into<String>) -> Self {
        let sensitivity = scheme.default_sensitivity();
        Self {
            scheme,
            value: value.into(),
            authority: None,
            sensitivity,
            valid_from: None,
            valid_to: None,
            verification_status: VerificationStatus::default(),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// All identifiers on a person are confidential unless stated otherwise.
    pub fn default_sensitivity_for_person() -> Sensitivity {
        Sensitivity::Confidential
    }

    /// Key used to de-duplicate identifiers on one node.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.scheme.as_str(), self.value.as_str())
    }
}
