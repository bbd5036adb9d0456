//! Configuration file loading
//!
//! The file is JSON and every key is optional:
//!
//! ```json
//! {
//!   "fields": [{"label": "Login", "field": "username"}],
//!   "default_fields": ["title", "password"],
//!   "prefix_len": 12,
//!   "log_level": "info"
//! }
//! ```
//!
//! Located via `--config`, then `$CREDTREE_CONFIG`, else built-in defaults.

use std::path::{Path, PathBuf};

use credtree_core::normalize::{FieldName, FieldSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "CREDTREE_CONFIG";

/// Default number of hex characters shown per hash
pub const DEFAULT_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recognized fields and the header labels they match
    pub fields: Vec<FieldSpec>,
    /// Fields hashed when `--fields` is not given; all bound fields if unset
    pub default_fields: Option<Vec<FieldName>>,
    /// Hex characters shown per hash in text output
    pub prefix_len: usize,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fields: FieldSpec::defaults(),
            default_fields: None,
            prefix_len: DEFAULT_PREFIX_LEN,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load from an explicit path, else `$CREDTREE_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map(Path::to_path_buf).or_else(|| {
            std::env::var(CONFIG_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });

        match path {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), fields = config.fields.len(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(
            r#"{"prefix_len": 16, "default_fields": ["title", "last_modified"]}"#,
        )
        .unwrap();
        assert_eq!(config.prefix_len, 16);
        assert_eq!(
            config.default_fields,
            Some(vec![FieldName::Title, FieldName::LastModified])
        );
        assert_eq!(config.fields, FieldSpec::defaults());
    }

    #[test]
    fn custom_labels() {
        let config =
            Config::from_json(r#"{"fields": [{"label": "Login", "field": "username"}]}"#).unwrap();
        assert_eq!(config.fields, vec![FieldSpec::new("Login", FieldName::Username)]);
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(Config::from_json(r#"{"default_fields": ["url"]}"#).is_err());
    }
}
