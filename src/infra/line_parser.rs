//! Line-oriented diagnostics parsing
//!
//! Parses linter output one line at a time through a regex with named
//! capture groups. This is how generators configured from `sidecar.toml`
//! turn raw tool output into diagnostics; generators registered through the
//! API are free to supply any parser they like.
//!
//! Recognized groups: `line`, `col`, `end_line`, `end_col`, `severity`,
//! `message`, `code`, `file`. Coordinates in tool output are 1-indexed and
//! converted to the 0-indexed internal form.

use std::path::Path;

use regex::Regex;

use crate::models::diagnostic::{Diagnostic, Severity};
use crate::models::text::{Position, Range};

/// Parse every line of `output`, ignoring lines that do not match.
pub fn parse_diagnostics(
    output: &str,
    pattern: &Regex,
    default_severity: Severity,
    fallback_file: &Path,
) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| parse_line(line, pattern, default_severity, fallback_file))
        .collect()
}

fn parse_line(
    line: &str,
    pattern: &Regex,
    default_severity: Severity,
    fallback_file: &Path,
) -> Option<Diagnostic> {
    let captures = pattern.captures(line)?;

    let group = |name: &str| captures.name(name).map(|m| m.as_str());
    let coord = |name: &str| group(name).and_then(|v| v.parse::<u32>().ok());

    let start_line = coord("line").unwrap_or(1).saturating_sub(1);
    let start_col = coord("col").unwrap_or(1).saturating_sub(1);
    let end_line = coord("end_line")
        .map(|l| l.saturating_sub(1))
        .unwrap_or(start_line);
    let end_col = coord("end_col")
        .map(|c| c.saturating_sub(1))
        .unwrap_or(start_col);

    let severity = group("severity")
        .and_then(|s| s.parse::<Severity>().ok())
        .unwrap_or(default_severity);

    let message = group("message").unwrap_or(line).trim().to_string();
    let file = group("file")
        .map(Path::new)
        .unwrap_or(fallback_file)
        .to_path_buf();

    let mut diagnostic = Diagnostic::new(
        file,
        Range::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        ),
        severity,
        message,
    );
    if let Some(code) = group("code") {
        diagnostic.code = Some(code.to_string());
    }
    Some(diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gcc_style() -> Regex {
        Regex::new(r"^(?P<file>[^:]+):(?P<line>\d+):(?P<col>\d+): (?P<severity>\w+): (?P<message>.+)$")
            .unwrap()
    }

    #[test]
    fn test_parses_gcc_style_lines() {
        let output = "src/a.c:14:3: warning: unused variable 'x'\nnot a diagnostic line\nsrc/b.c:2:1: error: expected ';'\n";
        let diags = parse_diagnostics(
            output,
            &gcc_style(),
            Severity::Error,
            Path::new("fallback.c"),
        );

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].file_path, Path::new("src/a.c"));
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].range.start, Position::new(13, 2));
        assert_eq!(diags[0].message, "unused variable 'x'");
        assert_eq!(diags[1].severity, Severity::Error);
    }

    #[test]
    fn test_fallback_file_and_severity() {
        let pattern = Regex::new(r"^(?P<line>\d+): (?P<message>.+)$").unwrap();
        let diags = parse_diagnostics("7: something odd\n", &pattern, Severity::Hint, Path::new("a.txt"));

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file_path, Path::new("a.txt"));
        assert_eq!(diags[0].severity, Severity::Hint);
        assert_eq!(diags[0].range.start.line, 6);
    }

    #[test]
    fn test_code_and_end_range_groups() {
        let pattern = Regex::new(
            r"^(?P<line>\d+):(?P<col>\d+)-(?P<end_line>\d+):(?P<end_col>\d+) \[(?P<code>\w+)\] (?P<message>.+)$",
        )
        .unwrap();
        let diags =
            parse_diagnostics("3:1-3:10 [E501] line too long\n", &pattern, Severity::Warning, Path::new("x.py"));

        assert_eq!(diags[0].code.as_deref(), Some("E501"));
        assert_eq!(diags[0].range.end, Position::new(2, 9));
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let diags = parse_diagnostics("all clean\n", &gcc_style(), Severity::Error, Path::new("a.c"));
        assert!(diags.is_empty());
    }
}
