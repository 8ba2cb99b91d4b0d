//! Engine configuration loading and validation

use crate::error::{AuthzError, Result};
use crate::pattern::WILDCARD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default reserved root subject
pub const DEFAULT_ROOT_SUBJECT: &str = ".root";

/// Authorization engine configuration
///
/// ```toml
/// root_subject = ".root"
/// log_path = "/var/lib/simplesync/events.jsonl"
/// max_future_skew_secs = 86400
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthzConfig {
    /// Subject for which every check succeeds; fixed for the process lifetime
    #[serde(default = "default_root_subject")]
    pub root_subject: String,

    /// Durable log location; `None` keeps the log in memory
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Reject drafts timestamped further than this many seconds past the
    /// wall clock. Disabled when unset.
    #[serde(default)]
    pub max_future_skew_secs: Option<u64>,
}

fn default_root_subject() -> String {
    DEFAULT_ROOT_SUBJECT.to_string()
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            root_subject: default_root_subject(),
            log_path: None,
            max_future_skew_secs: None,
        }
    }
}

impl AuthzConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AuthzConfig = toml::from_str(contents)
            .map_err(|e| AuthzError::Config(format!("failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Override the root subject
    pub fn with_root_subject(mut self, root_subject: impl Into<String>) -> Self {
        self.root_subject = root_subject.into();
        self
    }

    /// Override the log location
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Enable the future-timestamp guard
    pub fn with_max_future_skew(mut self, secs: u64) -> Self {
        self.max_future_skew_secs = Some(secs);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.root_subject.trim().is_empty() {
            return Err(AuthzError::Config("root_subject must not be empty".to_string()));
        }

        if self.root_subject.chars().any(|c| (c as u32) < 32 || c as u32 == 127) {
            return Err(AuthzError::Config(
                "root_subject must not contain control characters".to_string(),
            ));
        }

        if self.root_subject.contains(WILDCARD) {
            return Err(AuthzError::Config("root_subject must not contain '*'".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthzConfig::default();
        assert_eq!(config.root_subject, ".root");
        assert!(config.log_path.is_none());
        assert!(config.max_future_skew_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = AuthzConfig::from_toml(
            r#"
            root_subject = "admin-root"
            log_path = "data/events.jsonl"
            max_future_skew_secs = 86400
            "#,
        )
        .unwrap();

        assert_eq!(config.root_subject, "admin-root");
        assert_eq!(config.log_path, Some(PathBuf::from("data/events.jsonl")));
        assert_eq!(config.max_future_skew_secs, Some(86400));

        let empty = AuthzConfig::from_toml("").unwrap();
        assert_eq!(empty, AuthzConfig::default());
    }

    #[test]
    fn test_invalid_root_subject() {
        assert!(AuthzConfig::default().with_root_subject("").validate().is_err());
        assert!(AuthzConfig::default().with_root_subject("ro*").validate().is_err());
        assert!(AuthzConfig::default().with_root_subject("a\tb").validate().is_err());
        assert!(AuthzConfig::from_toml(r#"root_subject = " ""#).is_err());
    }
}
