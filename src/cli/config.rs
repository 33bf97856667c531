//! `sidecar.toml` loading
//!
//! The CLI defines its generators declaratively. Each `[[generator]]` table
//! becomes a process-backed `SourceDescriptor`: diagnostics generators parse
//! tool output through a named-group regex, formatting generators take
//! stdout verbatim as the formatted text, hover generators take stdout as
//! the hover contents.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::config::{EngineConfig, EngineTable};
use crate::error::ConfigError;
use crate::infra::exec::OutputChannel;
use crate::infra::line_parser;
use crate::infra::resolver::ResolutionMode;
use crate::models::capability::Capability;
use crate::models::diagnostic::Severity;
use crate::models::outcome::GeneratorPayload;
use crate::models::action::Hover;
use crate::source::descriptor::{InputMode, SourceDescriptor};

pub const CONFIG_FILE: &str = "sidecar.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidecarConfig {
    #[serde(default)]
    pub engine: EngineTable,

    #[serde(default, rename = "generator")]
    pub generators: Vec<GeneratorTable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorTable {
    pub name: String,
    pub capability: String,
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub filetypes: Vec<String>,

    #[serde(default)]
    pub input: InputMode,

    #[serde(default)]
    pub output: OutputChannel,

    #[serde(default)]
    pub resolution: ResolutionMode,

    pub timeout_ms: Option<u64>,

    /// Message template, e.g. `"{code}: {message} [{source}]"`.
    pub format: Option<String>,

    /// Regex with named groups for diagnostics output. Required for
    /// diagnostics generators, rejected for the others.
    pub parse: Option<String>,

    /// Default severity when the parse pattern has no `severity` group.
    pub severity: Option<String>,

    #[serde(default)]
    pub cache: bool,
}

impl SidecarConfig {
    /// Load from `dir/sidecar.toml`. A missing file is an empty config, not
    /// an error.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::from(self.engine.clone())
    }

    /// Build a descriptor for every `[[generator]]` table. Fails on the
    /// first invalid one; nothing is half-registered.
    pub fn into_descriptors(self) -> Result<Vec<SourceDescriptor>, ConfigError> {
        self.generators
            .into_iter()
            .map(build_descriptor)
            .collect()
    }
}

fn build_descriptor(table: GeneratorTable) -> Result<SourceDescriptor, ConfigError> {
    let capability = Capability::from_str(&table.capability).map_err(|e| {
        ConfigError::InvalidValue {
            key: format!("generator.{}.capability", table.name),
            message: e,
        }
    })?;

    let parser = output_parser(&table, capability)?;
    let args: Vec<&str> = table.args.iter().map(String::as_str).collect();

    let mut builder = SourceDescriptor::builder(&table.name, capability)
        .process(&table.command, &args, parser)
        .filetypes(&table.filetypes.iter().map(String::as_str).collect::<Vec<_>>())
        .input(table.input)
        .output(table.output)
        .resolution(table.resolution);

    if let Some(ms) = table.timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    if let Some(template) = table.format {
        builder = builder.format_template(template);
    }
    if table.cache {
        builder = builder.cached();
    }

    builder.build().map_err(|e| ConfigError::InvalidValue {
        key: format!("generator.{}", table.name),
        message: e.to_string(),
    })
}

type BoxedParser = Box<
    dyn Fn(
            &crate::infra::exec::ProcessResult,
            &crate::models::request::ExecutionRequest,
        ) -> Result<GeneratorPayload, String>
        + Send
        + Sync,
>;

fn output_parser(
    table: &GeneratorTable,
    capability: Capability,
) -> Result<BoxedParser, ConfigError> {
    let channel = table.output;
    match capability {
        Capability::Diagnostics => {
            let pattern_src = table.parse.as_deref().ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: format!("generator.{}.parse", table.name),
                    message: "diagnostics generators need a parse pattern".to_string(),
                }
            })?;
            let pattern = Regex::new(pattern_src).map_err(|e| ConfigError::InvalidValue {
                key: format!("generator.{}.parse", table.name),
                message: e.to_string(),
            })?;
            let default_severity = match table.severity.as_deref() {
                Some(raw) => {
                    Severity::from_str(raw).map_err(|e| ConfigError::InvalidValue {
                        key: format!("generator.{}.severity", table.name),
                        message: e,
                    })?
                }
                None => Severity::Warning,
            };
            Ok(Box::new(move |result, request| {
                Ok(GeneratorPayload::Diagnostics(line_parser::parse_diagnostics(
                    result.channel(channel),
                    &pattern,
                    default_severity,
                    request.snapshot.id.path(),
                )))
            }))
        }
        Capability::Formatting | Capability::RangeFormatting => {
            reject_parse_fields(table)?;
            Ok(Box::new(move |result, _request| {
                if !result.success() {
                    return Err(format!(
                        "formatter exited with {}: {}",
                        result.exit_code,
                        result.stderr.trim()
                    ));
                }
                Ok(GeneratorPayload::Formatted(result.channel(channel).to_string()))
            }))
        }
        Capability::Hover => {
            reject_parse_fields(table)?;
            Ok(Box::new(move |result, _request| {
                Ok(GeneratorPayload::Hover(Hover::new(
                    result.channel(channel).trim_end().to_string(),
                )))
            }))
        }
        Capability::CodeAction => Err(ConfigError::InvalidValue {
            key: format!("generator.{}.capability", table.name),
            message: "code-action generators cannot be declared in TOML; register them through the API".to_string(),
        }),
    }
}

fn reject_parse_fields(table: &GeneratorTable) -> Result<(), ConfigError> {
    if table.parse.is_some() || table.severity.is_some() {
        return Err(ConfigError::InvalidValue {
            key: format!("generator.{}.parse", table.name),
            message: format!(
                "parse/severity only apply to diagnostics generators, not {}",
                table.capability
            ),
        });
    }
    Ok(())
}
