//! Local Executable Resolver
//!
//! Decides, per invocation, whether a command runs from a workspace-local
//! installation (e.g. `node_modules/.bin`) or the global search path, and
//! which working directory that choice implies. Resolution is recomputed on
//! every invocation; the resolving workspace may change between requests.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{EngineConfig, LocalSearch};

/// Policy for choosing between a local and a globally-installed executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Standard search path; working directory is inherited.
    #[default]
    Global,
    /// Use a project-local installation when one exists, else global.
    PreferLocal,
    /// Use a project-local installation or skip the generator entirely.
    OnlyLocal,
}

impl std::fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PreferLocal => write!(f, "prefer-local"),
            Self::OnlyLocal => write!(f, "only-local"),
        }
    }
}

/// Resolved program plus the working directory implied by the resolution.
/// `cwd == None` means "inherit the process working directory".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub program: PathBuf,
    pub cwd: Option<PathBuf>,
}

/// Resolve `command` for a document living in `document_dir`.
///
/// Returns `None` only for `OnlyLocal` with no local installation; the
/// caller turns that into a Skipped outcome without spawning anything.
pub fn resolve(
    command: &str,
    mode: ResolutionMode,
    document_dir: &Path,
    config: &EngineConfig,
) -> Option<Resolution> {
    match mode {
        ResolutionMode::Global => Some(resolve_global(command)),
        ResolutionMode::PreferLocal => {
            Some(find_local(command, document_dir, config).unwrap_or_else(|| {
                tracing::debug!("No local {} found, falling back to global", command);
                resolve_global(command)
            }))
        }
        ResolutionMode::OnlyLocal => {
            let found = find_local(command, document_dir, config);
            if found.is_none() {
                tracing::debug!("No local {} found under {:?}", command, document_dir);
            }
            found
        }
    }
}

fn resolve_global(command: &str) -> Resolution {
    let program = search_path(command).unwrap_or_else(|| PathBuf::from(command));
    Resolution { program, cwd: None }
}

/// Walk `$PATH` for an executable file named `command`.
fn search_path(command: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
}

/// Search for `<dir>/<local_bin>/<command>` starting at the document
/// directory, walking ancestors when configured to. The working directory
/// becomes the directory containing the found executable.
fn find_local(command: &str, document_dir: &Path, config: &EngineConfig) -> Option<Resolution> {
    let dirs: Vec<&Path> = match config.local_search {
        LocalSearch::Ancestors => document_dir.ancestors().collect(),
        LocalSearch::DocumentDirOnly => vec![document_dir],
    };

    for dir in dirs {
        for bin in &config.local_bin_dirs {
            let candidate = dir.join(bin).join(command);
            if is_executable(&candidate) {
                tracing::debug!("Resolved local {}: {}", command, candidate.display());
                let cwd = candidate.parent().map(Path::to_path_buf);
                return Some(Resolution {
                    program: candidate,
                    cwd,
                });
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    fn project_with_local_tool(command: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("node_modules/.bin");
        let src = root.path().join("src/deep");
        fs::create_dir_all(&bin).unwrap();
        fs::create_dir_all(&src).unwrap();
        make_executable(&bin.join(command));
        (root, bin, src)
    }

    #[test]
    fn test_global_mode_finds_path_executables() {
        let resolved = resolve("sh", ResolutionMode::Global, Path::new("."), &EngineConfig::default())
            .unwrap();
        assert!(resolved.program.is_absolute());
        assert!(resolved.cwd.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_only_local_miss_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(
            "mytool",
            ResolutionMode::OnlyLocal,
            dir.path(),
            &EngineConfig::default(),
        );
        assert!(resolved.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_only_local_hit_uses_bin_dir_as_cwd() {
        let (_root, bin, src) = project_with_local_tool("mytool");

        let resolved = resolve(
            "mytool",
            ResolutionMode::OnlyLocal,
            &src,
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(resolved.program, bin.join("mytool"));
        assert_eq!(resolved.cwd.as_deref(), Some(bin.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_document_dir_only_does_not_walk_ancestors() {
        let (root, _bin, src) = project_with_local_tool("mytool");
        let config = EngineConfig {
            local_search: LocalSearch::DocumentDirOnly,
            ..Default::default()
        };

        // The tool lives two levels above the document directory
        assert!(resolve("mytool", ResolutionMode::OnlyLocal, &src, &config).is_none());
        assert!(resolve("mytool", ResolutionMode::OnlyLocal, root.path(), &config).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_prefer_local_falls_back_to_global() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(
            "sh",
            ResolutionMode::PreferLocal,
            dir.path(),
            &EngineConfig::default(),
        )
        .unwrap();
        // No local sh; global one wins and cwd is inherited
        assert!(resolved.cwd.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_prefer_local_prefers_the_local_copy() {
        let (_root, bin, src) = project_with_local_tool("prettier");
        let resolved = resolve(
            "prettier",
            ResolutionMode::PreferLocal,
            &src,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(resolved.program, bin.join("prettier"));
    }
}
