//! Diagnostic model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::text::{Position, Range};

/// One finding reported by a diagnostics generator.
///
/// `file_path` may name a file other than the requested document; a single
/// dispatch can populate diagnostic sets for several files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file_path: PathBuf,
    pub range: Range,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Name of the generator that produced this finding. Stamped by the
    /// dispatcher during merge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(
        file_path: impl Into<PathBuf>,
        range: Range,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            range,
            severity,
            message: message.into(),
            code: None,
            source: None,
        }
    }

    pub fn at(
        file_path: impl Into<PathBuf>,
        line: u32,
        column: u32,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            file_path,
            Range::point(Position::new(line, column)),
            severity,
            message,
        )
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render the message through a generator's format template.
    ///
    /// Supported tokens: `{message}`, `{source}`, `{code}`, `{severity}`.
    pub fn formatted_message(&self, template: &str) -> String {
        template
            .replace("{message}", &self.message)
            .replace("{source}", self.source.as_deref().unwrap_or(""))
            .replace("{code}", self.code.as_deref().unwrap_or(""))
            .replace("{severity}", &self.severity.to_string())
    }

    pub fn display_line(&self) -> u32 {
        self.range.start.line + 1
    }

    pub fn display_column(&self) -> u32 {
        self.range.start.character + 1
    }
}

/// Severity levels (matches LSP numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    /// Parse from LSP numeric value
    pub fn from_lsp(value: i64) -> Self {
        match value {
            1 => Self::Error,
            2 => Self::Warning,
            3 => Self::Information,
            _ => Self::Hint,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Information => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" | "fatal" => Ok(Self::Error),
            "warning" | "warn" | "w" => Ok(Self::Warning),
            "info" | "information" | "note" | "i" => Ok(Self::Information),
            "hint" | "h" => Ok(Self::Hint),
            _ => Err(format!(
                "Unknown severity: '{}'. Valid: error, warning, info, hint",
                s
            )),
        }
    }
}
