//! Engine configuration
//!
//! Carried inside the `Engine` as an explicit context object; constructed
//! per session, never ambient global state.

use std::time::Duration;

use serde::Deserialize;

/// How far the local executable resolver walks when looking for a
/// project-local tool installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalSearch {
    /// Walk upward through ancestor directories of the document.
    Ancestors,
    /// Look only in the document's own directory.
    DocumentDirOnly,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timeout applied to process generators that do not carry their own.
    pub default_timeout: Duration,
    /// Directories probed (relative to each candidate directory) for a
    /// project-local executable, e.g. `node_modules/.bin`.
    pub local_bin_dirs: Vec<String>,
    pub local_search: LocalSearch,
    /// Disables the result cache entirely when false; descriptors keep
    /// their cache policy but every dispatch recomputes.
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(5),
            local_bin_dirs: vec!["node_modules/.bin".to_string()],
            local_search: LocalSearch::Ancestors,
            cache_enabled: true,
        }
    }
}

/// Serde-facing shape of the `[engine]` table in `sidecar.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineTable {
    pub default_timeout_ms: Option<u64>,
    pub local_bin_dirs: Option<Vec<String>>,
    pub local_search: Option<LocalSearch>,
    pub cache_enabled: Option<bool>,
}

impl From<EngineTable> for EngineConfig {
    fn from(table: EngineTable) -> Self {
        let defaults = EngineConfig::default();
        Self {
            default_timeout: table
                .default_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_timeout),
            local_bin_dirs: table.local_bin_dirs.unwrap_or(defaults.local_bin_dirs),
            local_search: table.local_search.unwrap_or(defaults.local_search),
            cache_enabled: table.cache_enabled.unwrap_or(defaults.cache_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert_eq!(config.local_search, LocalSearch::Ancestors);
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_table_overrides() {
        let table: EngineTable = toml::from_str(
            r#"
            default_timeout_ms = 250
            local_bin_dirs = ["bin", ".venv/bin"]
            local_search = "document-dir-only"
            "#,
        )
        .unwrap();
        let config = EngineConfig::from(table);

        assert_eq!(config.default_timeout, Duration::from_millis(250));
        assert_eq!(config.local_bin_dirs, vec!["bin", ".venv/bin"]);
        assert_eq!(config.local_search, LocalSearch::DocumentDirOnly);
        assert!(config.cache_enabled);
    }
}
