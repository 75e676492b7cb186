//! Engine configuration, read from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [filters]
//! classes = "class ~unknown ~unresolved"
//!
//! [graph]
//! owner_kinds = "class, interface"
//!
//! [export]
//! delimiter = ";"
//!
//! [lexer]
//! whitespace = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::graph::KindFilter;
use crate::lexer::LexerOptions;

/// Default scope filters for reports and CLI listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub classes: String,
    /// Scope of both `calls` and `calledby`. Unresolved callees stay in
    /// scope so each call edge shows up in both reports.
    pub methods: String,
    pub files: String,
    pub variables: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            classes: "class ~unknown ~unresolved".to_string(),
            methods: "method".to_string(),
            files: "file ~unknown ~unresolved".to_string(),
            variables: "variable".to_string(),
        }
    }
}

/// Kinds the traversal primitives rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Owner kinds for `owner_class` (targets of `definein`).
    pub owner_kinds: String,
    /// Relations that make an entity a member of another. Empty disables
    /// member expansion in dependency aggregation.
    pub containment: String,
    /// Relations never counted as dependencies. Empty excludes nothing.
    pub dependency_exclude: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            owner_kinds: "class".to_string(),
            containment: "define".to_string(),
            dependency_exclude: "define".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub delimiter: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

/// Limits for human-readable listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Reference details shown per dependency before eliding the rest.
    pub detail_limit: usize,
    /// Meaningful tokens printed by the lexer command.
    pub token_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            detail_limit: 3,
            token_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filters: FilterConfig,
    pub graph: GraphConfig,
    pub export: ExportConfig,
    pub lexer: LexerOptions,
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file is missing or unusable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                return Self::default();
            }
        };
        match Self::parse(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Parse and validate TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| GraphError::invalid(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every filter expression parses and the delimiter is usable.
    pub fn validate(&self) -> Result<()> {
        for expr in [
            &self.filters.classes,
            &self.filters.methods,
            &self.filters.files,
            &self.filters.variables,
            &self.graph.owner_kinds,
            &self.graph.containment,
            &self.graph.dependency_exclude,
        ] {
            KindFilter::parse(expr)?;
        }
        if matches!(self.export.delimiter, '"' | '\r' | '\n') {
            return Err(GraphError::invalid(format!(
                "unusable delimiter {:?}",
                self.export.delimiter
            )));
        }
        Ok(())
    }
}
