//! Editor capabilities served by generators

use serde::{Deserialize, Serialize};

/// What an editor asks a generator for.
///
/// The capability determines the dispatch strategy: diagnostics, code
/// actions and hover run all eligible generators concurrently, while the
/// formatting capabilities chain generators sequentially because each
/// formatter consumes the previous one's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Diagnostics,
    Formatting,
    RangeFormatting,
    CodeAction,
    Hover,
}

impl Capability {
    /// Formatting capabilities run sources one at a time, in registration
    /// order; everything else fans out concurrently.
    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Formatting | Self::RangeFormatting)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diagnostics => write!(f, "diagnostics"),
            Self::Formatting => write!(f, "formatting"),
            Self::RangeFormatting => write!(f, "range-formatting"),
            Self::CodeAction => write!(f, "code-action"),
            Self::Hover => write!(f, "hover"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "diagnostics" => Ok(Self::Diagnostics),
            "formatting" => Ok(Self::Formatting),
            "range-formatting" => Ok(Self::RangeFormatting),
            "code-action" => Ok(Self::CodeAction),
            "hover" => Ok(Self::Hover),
            _ => Err(format!(
                "Unknown capability: '{}'. Valid: diagnostics, formatting, range-formatting, code-action, hover",
                s
            )),
        }
    }
}
