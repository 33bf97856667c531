//! CLI surface
//!
//! Clap derive commands over the engine. Generator definitions come from
//! `sidecar.toml` in the workspace root.

pub mod commands;
pub mod config;
pub mod output;

pub use config::SidecarConfig;
pub use output::{OutputContext, OutputFormat};

use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, doctor::DoctorArgs, fmt::FmtArgs};

const LONG_ABOUT: &str = r#"
Sidecar - external tool orchestration for editors

Sidecar runs linters, formatters and other command-line tools against your
files and merges their output into diagnostics, formatted text, code actions
and hover content. Generators are declared in sidecar.toml.

QUICK START:
  1. Declare generators:      edit sidecar.toml
  2. Lint files:              sidecar check src/main.sh
  3. Format files:            sidecar fmt src/main.sh --write
  4. Verify your setup:       sidecar doctor

CONFIG EXAMPLE (sidecar.toml):
  [[generator]]
  name = "shellcheck"
  capability = "diagnostics"
  command = "shellcheck"
  args = ["-f", "gcc", "{file}", "-"]
  filetypes = ["sh", "bash"]
  parse = '^.*:(?P<line>\d+):(?P<col>\d+): (?P<severity>\w+): (?P<message>.*)$'
"#;

/// Sidecar - external tool orchestration for editors
#[derive(Parser, Debug)]
#[command(name = "sidecar")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'sidecar <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, text)
    #[arg(long, global = true, default_value = "json")]
    pub format: String,

    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run diagnostics generators against files
    Check(CheckArgs),

    /// Run the formatting chain against files
    Fmt(FmtArgs),

    /// Show configured generators and whether their tools resolve
    Doctor(DoctorArgs),
}
