//! YAML configuration for the importer
//!
//! ```yaml
//! salt: 3f1c...            # 64 hex chars; omit for a fresh random salt
//! disclosure_scope: partner
//! conflict_policy: first_encountered
//! max_parallel_sheets: 4
//! ```

use crate::graph::DisclosureScope;
use crate::import::{ConflictPolicy, FileSalt, ImportOptions, SaltError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid salt: {0}")]
    Salt(#[from] SaltError),
}

/// On-disk import settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Fixed salt in hex, for reproducible IDs
    pub salt: Option<String>,
    /// Scope override; can only tighten the workbook's own scope
    pub disclosure_scope: Option<DisclosureScope>,
    pub conflict_policy: ConflictPolicy,
    pub max_parallel_sheets: Option<usize>,
}

impl ImportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn into_options(self) -> Result<ImportOptions, ConfigError> {
        let mut options = ImportOptions::new().with_conflict_policy(self.conflict_policy);
        if let Some(hex) = self.salt {
            options = options.with_salt(FileSalt::from_hex(&hex)?);
        }
        if let Some(scope) = self.disclosure_scope {
            options = options.with_scope_override(scope);
        }
        if let Some(limit) = self.max_parallel_sheets {
            options = options.with_max_parallel_sheets(limit);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SaltSource;
    use std::io::Write;

    #[test]
    fn empty_config_gives_defaults() {
        let config = ImportConfig::from_yaml("").unwrap();
        assert_eq!(config, ImportConfig::default());
        let options = config.into_options().unwrap();
        assert!(matches!(options.salt, SaltSource::Random));
        assert_eq!(options.max_parallel_sheets, 4);
    }

    #[test]
    fn loads_from_file() {
        let salt = "ab".repeat(32);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "salt: {}\ndisclosure_scope: public\nconflict_policy: last_encountered\nmax_parallel_sheets: 2",
            salt
        )
        .unwrap();

        let config = ImportConfig::load(file.path()).unwrap();
        assert_eq!(config.disclosure_scope, Some(DisclosureScope::Public));
        assert_eq!(config.conflict_policy, ConflictPolicy::LastEncountered);

        let options = config.into_options().unwrap();
        assert_eq!(options.scope_override, Some(DisclosureScope::Public));
        assert_eq!(options.max_parallel_sheets, 2);
        match options.salt {
            SaltSource::Fixed(s) => assert_eq!(s.to_hex(), salt),
            SaltSource::Random => panic!("expected fixed salt"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ImportConfig::from_yaml("colour: blue").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn bad_salt_is_reported() {
        let config = ImportConfig::from_yaml("salt: nope").unwrap();
        assert!(matches!(config.into_options(), Err(ConfigError::Salt(_))));
    }
}
