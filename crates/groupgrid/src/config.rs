//! Grid configuration documents.
//!
//! A [`GroupGridConfig`] can be built in code or loaded from TOML or JSON.
//! Every field is optional in the document and falls back to its default.
//!
//! ```ignore
//! let config = GroupGridConfig::from_toml_str(r#"
//! page_size = 100
//! aggregatable = true
//! aggregation_position = "top"
//! group_by = ["dept", "team"]
//! "#)?;
//! let grid = GroupDataGrid::with_config(metadata, config);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationPosition;
use crate::hierarchy::{CommunicatorSettings, DEFAULT_PAGE_SIZE, EAGER_FETCH_VIEWPORT_SIZE_ESTIMATE};

/// Errors raised while loading or saving a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unable to write TOML configuration: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

/// Settings of a [`GroupDataGrid`](crate::grid::GroupDataGrid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupGridConfig {
    /// Rows served per range request.
    pub page_size: usize,
    /// Pre-fetch children of expanded rows near the viewport.
    pub eager_fetch: bool,
    /// Look-ahead budget of the eager fetch, in rows.
    pub eager_fetch_viewport_estimate: usize,
    pub aggregatable: bool,
    pub aggregation_position: AggregationPosition,
    /// Column keys to group by whenever items are bound.
    pub group_by: Vec<String>,
}

impl Default for GroupGridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            eager_fetch: true,
            eager_fetch_viewport_estimate: EAGER_FETCH_VIEWPORT_SIZE_ESTIMATE,
            aggregatable: false,
            aggregation_position: AggregationPosition::Bottom,
            group_by: Vec::new(),
        }
    }
}

impl GroupGridConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML or JSON file, chosen by extension (TOML when unknown).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The paging settings for a data communicator.
    pub fn communicator_settings(&self) -> CommunicatorSettings {
        CommunicatorSettings {
            page_size: self.page_size,
            eager_fetch: self.eager_fetch,
            eager_fetch_viewport_estimate: self.eager_fetch_viewport_estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GroupGridConfig::from_toml_str("").unwrap();
        assert_eq!(config, GroupGridConfig::default());
        assert_eq!(config.page_size, 50);
        assert_eq!(config.eager_fetch_viewport_estimate, 40);
        assert_eq!(config.aggregation_position, AggregationPosition::Bottom);
    }

    #[test]
    fn test_toml() {
        let config = GroupGridConfig::from_toml_str(
            r#"
            page_size = 100
            aggregatable = true
            aggregation_position = "top"
            group_by = ["dept", "team"]
            "#,
        )
        .unwrap();

        assert_eq!(config.page_size, 100);
        assert!(config.aggregatable);
        assert!(config.eager_fetch);
        assert_eq!(config.aggregation_position, AggregationPosition::Top);
        assert_eq!(config.group_by, vec!["dept", "team"]);
        assert_eq!(config.communicator_settings().page_size, 100);
    }

    #[test]
    fn test_json() {
        let config = GroupGridConfig::from_json_str(r#"{"eager_fetch": false, "group_by": ["dept"]}"#).unwrap();
        assert!(!config.eager_fetch);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.group_by, vec!["dept"]);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            GroupGridConfig::from_toml_str("page_size = 0"),
            Err(ConfigError::Invalid { field: "page_size", .. })
        ));
        assert!(matches!(
            GroupGridConfig::from_toml_str("page_size = \"many\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            GroupGridConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GroupGridConfig {
            aggregatable: true,
            group_by: vec!["dept".into()],
            ..GroupGridConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(GroupGridConfig::from_toml_str(&text).unwrap(), config);
    }
}
