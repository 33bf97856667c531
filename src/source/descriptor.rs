//! Generator descriptors
//!
//! A descriptor wraps a user-supplied generator, process-based or
//! function-based, together with the metadata the engine needs to run it:
//! capability, file types, conditions, resolution mode, timeout and cache
//! policy. Descriptors are immutable once built; deriving a customized
//! variant goes through [`SourceDescriptor::customize`], which never touches
//! the original.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RegistryError;
use crate::infra::exec::{OutputChannel, ProcessResult};
use crate::infra::resolver::ResolutionMode;
use crate::models::capability::Capability;
use crate::models::outcome::GeneratorPayload;
use crate::models::request::ExecutionRequest;

/// Workspace context handed to static conditions at registration.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub root: PathBuf,
}

impl WorkspaceContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// In-process generator body.
pub type GeneratorFn =
    Arc<dyn Fn(&ExecutionRequest) -> Result<GeneratorPayload, String> + Send + Sync>;

/// Turns captured process output into a capability payload. Exit-code
/// classification happens here, not in the executor: plenty of linters exit
/// non-zero exactly when they have findings to report.
pub type OutputParser =
    Arc<dyn Fn(&ProcessResult, &ExecutionRequest) -> Result<GeneratorPayload, String> + Send + Sync>;

/// One-time eligibility gate, evaluated at registration.
pub type StaticCondition = Arc<dyn Fn(&WorkspaceContext) -> bool + Send + Sync>;

/// Per-request eligibility filter.
pub type RuntimeCondition = Arc<dyn Fn(&ExecutionRequest) -> bool + Send + Sync>;

/// How document content reaches a process generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// Content streamed over the child's stdin.
    #[default]
    Stdin,
    /// Content written to a temp file whose path substitutes `{temp}` in
    /// the argument template; the file is removed on every exit path.
    TempFile,
}

/// Result memoization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    #[default]
    None,
    /// Memoize per (source, document, content hash).
    ContentKeyed,
}

/// Process-backed generator specification.
///
/// Argument templates may contain `{file}`, `{temp}`, `{row_start}`,
/// `{col_start}`, `{row_end}` and `{col_end}` tokens, substituted per
/// invocation (rows and columns 1-indexed, the convention CLI tools use).
#[derive(Clone)]
pub struct ProcessSpec {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub input: InputMode,
    pub output: OutputChannel,
    pub parser: OutputParser,
}

impl std::fmt::Debug for ProcessSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSpec")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Execution kind: spawned process or in-process function.
#[derive(Clone)]
pub enum GeneratorKind {
    Process(ProcessSpec),
    Function(GeneratorFn),
}

impl std::fmt::Debug for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process(spec) => f.debug_tuple("Process").field(spec).finish(),
            Self::Function(_) => f.write_str("Function"),
        }
    }
}

/// A registered unit of work: one generator plus its execution metadata.
#[derive(Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub capability: Capability,
    /// Lowercased file extensions this generator applies to; empty = all.
    pub filetypes: Vec<String>,
    pub kind: GeneratorKind,
    pub static_condition: Option<StaticCondition>,
    pub runtime_condition: Option<RuntimeCondition>,
    /// Diagnostics message template, e.g. `"[{source}] {message}"`.
    pub format_template: Option<String>,
    pub resolution: ResolutionMode,
    /// Per-generator timeout; engine default applies when absent.
    pub timeout: Option<Duration>,
    pub cache: CachePolicy,
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("filetypes", &self.filetypes)
            .field("kind", &self.kind)
            .field("resolution", &self.resolution)
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SourceDescriptor {
    pub fn builder(name: impl Into<String>, capability: Capability) -> DescriptorBuilder {
        DescriptorBuilder::new(name, capability)
    }

    /// Derive a modified copy. Returns a builder pre-seeded with this
    /// descriptor; `build()` yields a fresh descriptor, the original is
    /// never mutated.
    pub fn customize(&self) -> DescriptorBuilder {
        DescriptorBuilder {
            name: self.name.clone(),
            capability: self.capability,
            filetypes: self.filetypes.clone(),
            kind: Some(self.kind.clone()),
            static_condition: self.static_condition.clone(),
            runtime_condition: self.runtime_condition.clone(),
            format_template: self.format_template.clone(),
            resolution: self.resolution,
            timeout: self.timeout,
            cache: self.cache,
        }
    }

    /// Whether this generator applies to a document of the given file type.
    pub fn matches_filetype(&self, filetype: Option<&str>) -> bool {
        if self.filetypes.is_empty() {
            return true;
        }
        match filetype {
            Some(ft) => self.filetypes.iter().any(|candidate| candidate == ft),
            None => false,
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, GeneratorKind::Process(_))
    }
}

/// Fluent builder for [`SourceDescriptor`].
#[derive(Clone)]
pub struct DescriptorBuilder {
    name: String,
    capability: Capability,
    filetypes: Vec<String>,
    kind: Option<GeneratorKind>,
    static_condition: Option<StaticCondition>,
    runtime_condition: Option<RuntimeCondition>,
    format_template: Option<String>,
    resolution: ResolutionMode,
    timeout: Option<Duration>,
    cache: CachePolicy,
}

impl DescriptorBuilder {
    fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
            filetypes: Vec::new(),
            kind: None,
            static_condition: None,
            runtime_condition: None,
            format_template: None,
            resolution: ResolutionMode::default(),
            timeout: None,
            cache: CachePolicy::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Process-backed generator with stdin input, stdout output and the
    /// given parser. Refine with the other setters.
    pub fn process<F>(mut self, command: impl Into<String>, args: &[&str], parser: F) -> Self
    where
        F: Fn(&ProcessResult, &ExecutionRequest) -> Result<GeneratorPayload, String>
            + Send
            + Sync
            + 'static,
    {
        self.kind = Some(GeneratorKind::Process(ProcessSpec {
            command: command.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
            input: InputMode::default(),
            output: OutputChannel::default(),
            parser: Arc::new(parser),
        }));
        self
    }

    pub fn function<F>(mut self, body: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> Result<GeneratorPayload, String> + Send + Sync + 'static,
    {
        self.kind = Some(GeneratorKind::Function(Arc::new(body)));
        self
    }

    pub fn filetypes(mut self, filetypes: &[&str]) -> Self {
        self.filetypes = filetypes.iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(GeneratorKind::Process(spec)) = &mut self.kind {
            spec.env.push((key.into(), value.into()));
        }
        self
    }

    pub fn input(mut self, input: InputMode) -> Self {
        if let Some(GeneratorKind::Process(spec)) = &mut self.kind {
            spec.input = input;
        }
        self
    }

    pub fn output(mut self, output: OutputChannel) -> Self {
        if let Some(GeneratorKind::Process(spec)) = &mut self.kind {
            spec.output = output;
        }
        self
    }

    pub fn static_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&WorkspaceContext) -> bool + Send + Sync + 'static,
    {
        self.static_condition = Some(Arc::new(condition));
        self
    }

    pub fn runtime_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> bool + Send + Sync + 'static,
    {
        self.runtime_condition = Some(Arc::new(condition));
        self
    }

    pub fn format_template(mut self, template: impl Into<String>) -> Self {
        self.format_template = Some(template.into());
        self
    }

    pub fn resolution(mut self, mode: ResolutionMode) -> Self {
        self.resolution = mode;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cached(mut self) -> Self {
        self.cache = CachePolicy::ContentKeyed;
        self
    }

    /// Validate and produce the immutable descriptor.
    pub fn build(self) -> Result<SourceDescriptor, RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::invalid("<unnamed>", "name must not be empty"));
        }
        let kind = self
            .kind
            .ok_or_else(|| RegistryError::invalid(&self.name, "generator body is missing"))?;
        if let GeneratorKind::Process(spec) = &kind
            && spec.command.trim().is_empty()
        {
            return Err(RegistryError::invalid(
                &self.name,
                "process generator requires a command",
            ));
        }
        if let Some(timeout) = self.timeout
            && timeout.is_zero()
        {
            return Err(RegistryError::invalid(&self.name, "timeout must be non-zero"));
        }
        if let GeneratorKind::Process(spec) = &kind
            && spec.output == OutputChannel::TempFile
            && spec.input != InputMode::TempFile
        {
            return Err(RegistryError::invalid(
                &self.name,
                "temp-file output requires temp-file input",
            ));
        }

        Ok(SourceDescriptor {
            name: self.name,
            capability: self.capability,
            filetypes: self.filetypes,
            kind,
            static_condition: self.static_condition,
            runtime_condition: self.runtime_condition,
            format_template: self.format_template,
            resolution: self.resolution,
            timeout: self.timeout,
            cache: self.cache,
        })
    }
}
