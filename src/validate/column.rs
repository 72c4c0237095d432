//! Column specifications and the per-cell validator
//!
//! `validate_cell` is a pure function: one raw cell and its column spec in,
//! a typed value or a failure naming the column, the expected constraint
//! and the actual value out.

use super::check_digits;
use crate::sheet::CellValue;
use chrono::{Days, NaiveDate};
use regex_lite::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Identifier rules with a published format or check digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckScheme {
    Lei,
    Duns,
    Gln,
    Gtin,
}

impl CheckScheme {
    /// Scheme label as it appears on identifier records
    pub fn scheme_label(&self) -> &'static str {
        match self {
            Self::Lei => "lei",
            Self::Duns => "duns",
            Self::Gln => "gln",
            Self::Gtin => "org.gs1.gtin",
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            Self::Lei => check_digits::lei_is_valid(value),
            Self::Duns => check_digits::duns_is_valid(value),
            Self::Gln => check_digits::gln_is_valid(value),
            Self::Gtin => check_digits::gtin_is_valid(value),
        }
    }

    /// Resolve the checker for an identifier scheme label, if it has one.
    pub fn for_scheme(label: &str) -> Option<Self> {
        match label {
            "lei" => Some(Self::Lei),
            "duns" => Some(Self::Duns),
            "gln" => Some(Self::Gln),
            "org.gs1.gtin" => Some(Self::Gtin),
            _ => None,
        }
    }
}

/// Free-text shapes checked with a regular expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPattern {
    /// ISO 3166-1 alpha-2
    CountryCode,
    /// ISO 4217 alpha-3
    CurrencyCode,
    /// A core scheme label or a reverse-domain extension like `org.gs1.gtin`
    SchemeName,
}

impl TextPattern {
    fn regex(&self) -> &'static Regex {
        static COUNTRY: OnceLock<Regex> = OnceLock::new();
        static CURRENCY: OnceLock<Regex> = OnceLock::new();
        static SCHEME: OnceLock<Regex> = OnceLock::new();
        let (cell, pattern) = match self {
            Self::CountryCode => (&COUNTRY, r"^[A-Z]{2}$"),
            Self::CurrencyCode => (&CURRENCY, r"^[A-Z]{3}$"),
            Self::SchemeName => (
                &SCHEME,
                r"^(lei|duns|gln|nat-reg|vat|internal|[a-z][a-z0-9-]*(\.[a-z0-9-]+)+)$",
            ),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("pattern is valid"))
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::CountryCode => "ISO 3166-1 alpha-2 country code",
            Self::CurrencyCode => "ISO 4217 currency code",
            Self::SchemeName => "identifier scheme (lei, duns, gln, nat-reg, vat, internal or reverse-domain extension)",
        }
    }
}

/// What a column holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    Text,
    /// One of a fixed set of lowercase labels; matched case-insensitively
    Enum(&'static [&'static str]),
    Date,
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64> },
    Boolean,
    Identifier(CheckScheme),
    Pattern(TextPattern),
}

/// A column of a sheet: name, type and whether a value is mandatory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn optional(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }

    pub const fn required(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }
}

/// A validated cell
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Date(NaiveDate),
    Number(f64),
    Integer(i64),
    Bool(bool),
}

impl TypedValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Why a cell was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("{column}: required value is missing")]
    Missing { column: String },
    #[error("{column}: expected {expected}, got '{actual}'")]
    InvalidFormat {
        column: String,
        expected: String,
        actual: String,
    },
    #[error("{column}: '{actual}' is not a valid {scheme} identifier")]
    InvalidIdentifierFormat {
        column: String,
        scheme: String,
        actual: String,
    },
}

impl ValidationFailure {
    pub fn column(&self) -> &str {
        match self {
            Self::Missing { column }
            | Self::InvalidFormat { column, .. }
            | Self::InvalidIdentifierFormat { column, .. } => column,
        }
    }
}

/// Validate one cell against its column spec.
///
/// Blank cells give `Ok(None)` for optional columns and
/// [`ValidationFailure::Missing`] for required ones.
pub fn validate_cell(
    spec: &ColumnSpec,
    cell: &CellValue,
) -> Result<Option<TypedValue>, ValidationFailure> {
    let Some(text) = cell.render() else {
        if spec.required {
            return Err(ValidationFailure::Missing {
                column: spec.name.to_string(),
            });
        }
        return Ok(None);
    };

    let invalid = |expected: String| ValidationFailure::InvalidFormat {
        column: spec.name.to_string(),
        expected,
        actual: text.clone(),
    };

    let value = match spec.ty {
        ColumnType::Text => TypedValue::Text(text.clone()),
        ColumnType::Enum(allowed) => {
            let lowered = text.to_ascii_lowercase();
            match allowed.iter().find(|label| **label == lowered) {
                Some(label) => TypedValue::Text(label.to_string()),
                None => return Err(invalid(format!("one of {}", allowed.join(", ")))),
            }
        }
        ColumnType::Date => match parse_date(cell, &text) {
            Some(date) => TypedValue::Date(date),
            None => return Err(invalid("date in YYYY-MM-DD form".to_string())),
        },
        ColumnType::Number { min, max } => {
            let n = parse_number(cell, &text).ok_or_else(|| invalid("a number".to_string()))?;
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Err(invalid(describe_range(min, max)));
            }
            TypedValue::Number(n)
        }
        ColumnType::Integer { min } => {
            let n = parse_number(cell, &text)
                .filter(|n| n.fract() == 0.0)
                .map(|n| n as i64)
                .ok_or_else(|| invalid("a whole number".to_string()))?;
            if let Some(m) = min.filter(|m| n < *m) {
                return Err(invalid(format!("a whole number >= {}", m)));
            }
            TypedValue::Integer(n)
        }
        ColumnType::Boolean => match parse_bool(cell, &text) {
            Some(b) => TypedValue::Bool(b),
            None => return Err(invalid("TRUE or FALSE".to_string())),
        },
        ColumnType::Identifier(scheme) => {
            if !scheme.is_valid(&text) {
                return Err(ValidationFailure::InvalidIdentifierFormat {
                    column: spec.name.to_string(),
                    scheme: scheme.scheme_label().to_string(),
                    actual: text.clone(),
                });
            }
            TypedValue::Text(text.clone())
        }
        ColumnType::Pattern(pattern) => {
            if !pattern.regex().is_match(&text) {
                return Err(invalid(pattern.describe().to_string()));
            }
            TypedValue::Text(text.clone())
        }
    };
    Ok(Some(value))
}

fn parse_number(cell: &CellValue, text: &str) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        _ => text
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
    }
}

/// Dates arrive as ISO text or as spreadsheet serial day numbers.
fn parse_date(cell: &CellValue, text: &str) -> Option<NaiveDate> {
    if let CellValue::Number(serial) = cell {
        if !serial.is_finite() || *serial < 1.0 {
            return None;
        }
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        return epoch.checked_add_days(Days::new(serial.floor() as u64));
    }
    let date_part = text.split(['T', ' ']).next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_bool(cell: &CellValue, text: &str) -> Option<bool> {
    match cell {
        CellValue::Bool(b) => Some(*b),
        _ => match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("a number in [{}, {}]", lo, hi),
        (Some(lo), None) => format!("a number >= {}", lo),
        (None, Some(hi)) => format!("a number <= {}", hi),
        (None, None) => "a number".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERCENTAGE: ColumnSpec = ColumnSpec::optional(
        "percentage",
        ColumnType::Number {
            min: Some(0.0),
            max: Some(100.0),
        },
    );

    #[test]
    fn blank_optional_is_none() {
        assert_eq!(validate_cell(&PERCENTAGE, &CellValue::Blank), Ok(None));
    }

    #[test]
    fn blank_required_is_missing() {
        let spec = ColumnSpec::required("name", ColumnType::Text);
        let err = validate_cell(&spec, &CellValue::from(" ")).unwrap_err();
        assert_eq!(
            err,
            ValidationFailure::Missing {
                column: "name".into()
            }
        );
    }

    #[test]
    fn percentage_out_of_range_names_constraint() {
        let err = validate_cell(&PERCENTAGE, &CellValue::Number(151.0)).unwrap_err();
        match err {
            ValidationFailure::InvalidFormat {
                column,
                expected,
                actual,
            } => {
                assert_eq!(column, "percentage");
                assert_eq!(expected, "a number in [0, 100]");
                assert_eq!(actual, "151");
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(validate_cell(&PERCENTAGE, &CellValue::Number(n)).is_err());
        }
        let quantity = ColumnSpec::optional("quantity", ColumnType::Number { min: Some(0.0), max: None });
        assert!(validate_cell(&quantity, &CellValue::Number(f64::INFINITY)).is_err());

        let date = ColumnSpec::optional("valid_from", ColumnType::Date);
        assert!(validate_cell(&date, &CellValue::Number(f64::NAN)).is_err());
        assert!(validate_cell(&date, &CellValue::Number(f64::INFINITY)).is_err());
    }

    #[test]
    fn percent_sign_is_stripped() {
        let value = validate_cell(&PERCENTAGE, &CellValue::from("51%")).unwrap();
        assert_eq!(value, Some(TypedValue::Number(51.0)));
    }

    #[test]
    fn enum_matches_case_insensitively() {
        let spec = ColumnSpec::optional("status", ColumnType::Enum(&["active", "dissolved"]));
        let value = validate_cell(&spec, &CellValue::from("Active")).unwrap();
        assert_eq!(value, Some(TypedValue::Text("active".into())));
        assert!(validate_cell(&spec, &CellValue::from("gone")).is_err());
    }

    #[test]
    fn dates_from_text_and_serials() {
        let spec = ColumnSpec::required("valid_from", ColumnType::Date);
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15);
        assert_eq!(
            validate_cell(&spec, &CellValue::from("2023-01-15")).unwrap(),
            expected.map(TypedValue::Date)
        );
        assert_eq!(
            validate_cell(&spec, &CellValue::Number(44941.0)).unwrap(),
            expected.map(TypedValue::Date)
        );
        assert!(validate_cell(&spec, &CellValue::from("15/01/2023")).is_err());
    }

    #[test]
    fn identifier_failure_names_scheme() {
        let spec = ColumnSpec::optional("lei", ColumnType::Identifier(CheckScheme::Lei));
        let err = validate_cell(&spec, &CellValue::from("5493006MHB84DD0ZWV19")).unwrap_err();
        assert!(matches!(
            err,
            ValidationFailure::InvalidIdentifierFormat { ref scheme, .. } if scheme == "lei"
        ));
    }

    #[test]
    fn integer_rejects_fractions() {
        let spec = ColumnSpec::optional("tier", ColumnType::Integer { min: Some(1) });
        assert_eq!(
            validate_cell(&spec, &CellValue::Number(2.0)).unwrap(),
            Some(TypedValue::Integer(2))
        );
        assert!(validate_cell(&spec, &CellValue::Number(1.5)).is_err());
        assert!(validate_cell(&spec, &CellValue::Number(0.0)).is_err());
    }

    #[test]
    fn booleans_accept_spreadsheet_forms() {
        let spec = ColumnSpec::optional("direct", ColumnType::Boolean);
        assert_eq!(
            validate_cell(&spec, &CellValue::from("TRUE")).unwrap(),
            Some(TypedValue::Bool(true))
        );
        assert_eq!(
            validate_cell(&spec, &CellValue::Bool(false)).unwrap(),
            Some(TypedValue::Bool(false))
        );
    }

    #[test]
    fn patterns() {
        let country = ColumnSpec::optional("jurisdiction", ColumnType::Pattern(TextPattern::CountryCode));
        assert!(validate_cell(&country, &CellValue::from("DE")).is_ok());
        assert!(validate_cell(&country, &CellValue::from("Germany")).is_err());

        let scheme = ColumnSpec::required("scheme", ColumnType::Pattern(TextPattern::SchemeName));
        assert!(validate_cell(&scheme, &CellValue::from("nat-reg")).is_ok());
        assert!(validate_cell(&scheme, &CellValue::from("org.gs1.gtin")).is_ok());
        assert!(validate_cell(&scheme, &CellValue::from("passport")).is_err());
    }
}
