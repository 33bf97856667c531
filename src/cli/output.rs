//! Output formatting for CLI commands
//!
//! Single source of truth for command output: JSON for machine consumers
//! (the default), plain text for humans.

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(format!("Unknown format: '{}'. Valid: json, text", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputContext {
    root: PathBuf,
    format: OutputFormat,
}

impl OutputContext {
    pub fn new(root: PathBuf, format: OutputFormat) -> Self {
        Self { root, format }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Convert an absolute path to relative (if within the workspace root).
    pub fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    /// Print a successful response with flat structure (data fields at top
    /// level). In text mode the caller renders lines itself.
    pub fn print_success_flat<T: Serialize>(&self, data: T) {
        let mut response = serde_json::to_value(data).unwrap_or(serde_json::json!({}));
        if let Some(obj) = response.as_object_mut() {
            obj.insert("success".to_string(), serde_json::json!(true));
        }
        print_json(&response);
    }

    pub fn print_error(&self, message: &str) {
        if self.is_text() {
            eprintln!("error: {message}");
            return;
        }
        let response = serde_json::json!({
            "success": false,
            "error": message
        });
        print_json(&response);
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
