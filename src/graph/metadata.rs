//! File-scoped disclosure scope and data-quality fields

use super::identifier::Sensitivity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Intended audience of a document.
///
/// Declared from widest to narrowest audience, so a greater value is a
/// stricter scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureScope {
    #[default]
    Internal,
    Partner,
    Public,
}

impl DisclosureScope {
    pub const LABELS: &'static [&'static str] = &["internal", "partner", "public"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "internal" => Some(Self::Internal),
            "partner" => Some(Self::Partner),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Partner => "partner",
            Self::Public => "public",
        }
    }

    /// Most restrictive sensitivity that may appear under this scope.
    pub fn ceiling(&self) -> Sensitivity {
        match self {
            Self::Internal => Sensitivity::Confidential,
            Self::Partner => Sensitivity::Restricted,
            Self::Public => Sensitivity::Public,
        }
    }

    pub fn permits(&self, sensitivity: Sensitivity) -> bool {
        sensitivity <= self.ceiling()
    }

    /// The stricter of two scopes.
    pub fn stricter(self, other: Option<DisclosureScope>) -> Self {
        match other {
            Some(o) if o > self => o,
            _ => self,
        }
    }
}

impl std::fmt::Display for DisclosureScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisclosureScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown disclosure scope '{}'", s))
    }
}

/// Confidence in a record's accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Verified,
    Reported,
    Inferred,
    Estimated,
}

impl Confidence {
    pub const LABELS: &'static [&'static str] = &["verified", "reported", "inferred", "estimated"];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "verified" => Some(Self::Verified),
            "reported" => Some(Self::Reported),
            "inferred" => Some(Self::Inferred),
            "estimated" => Some(Self::Estimated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Reported => "reported",
            Self::Inferred => "inferred",
            Self::Estimated => "estimated",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-quality annotation on an attestation or edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<NaiveDate>,
}

impl DataQuality {
    pub fn is_empty(&self) -> bool {
        self.confidence.is_none() && self.source.is_none() && self.last_verified.is_none()
    }

    /// Fill every unset field from `defaults`, leaving explicit values alone.
    pub fn fill_from(&mut self, defaults: &DataQuality) {
        if self.confidence.is_none() {
            self.confidence = defaults.confidence;
        }
        if self.source.is_none() {
            self.source = defaults.source.clone();
        }
        if self.last_verified.is_none() {
            self.last_verified = defaults.last_verified;
        }
    }
}
