//! Generator normalization
//!
//! Turns any descriptor, process-based or function-based, into the uniform
//! `invoke(request) -> Outcome` the dispatcher works with. Process
//! generators get executable resolution, argument substitution, temp-file
//! lifecycle and timeout handling here; function generators are called
//! in-process with no suspension.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::descriptor::{GeneratorKind, InputMode, ProcessSpec, SourceDescriptor};
use crate::config::EngineConfig;
use crate::infra::exec::OutputChannel;
use crate::infra::{exec, resolver};
use crate::models::outcome::{Outcome, SkipReason};
use crate::models::request::ExecutionRequest;

/// Run one generator to a terminal outcome. Never returns an error: every
/// failure mode is an [`Outcome`] variant so one generator can never abort
/// its siblings.
pub async fn invoke(
    descriptor: &SourceDescriptor,
    request: &ExecutionRequest,
    config: &EngineConfig,
) -> Outcome {
    match &descriptor.kind {
        GeneratorKind::Function(body) => match body(request) {
            Ok(payload) => Outcome::success(payload),
            Err(reason) => {
                tracing::warn!("Generator '{}' failed: {}", descriptor.name, reason);
                Outcome::Failure(reason)
            }
        },
        GeneratorKind::Process(spec) => invoke_process(descriptor, spec, request, config).await,
    }
}

async fn invoke_process(
    descriptor: &SourceDescriptor,
    spec: &ProcessSpec,
    request: &ExecutionRequest,
    config: &EngineConfig,
) -> Outcome {
    let document_dir = request
        .snapshot
        .id
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let Some(resolved) =
        resolver::resolve(&spec.command, descriptor.resolution, document_dir, config)
    else {
        return Outcome::Skipped(SkipReason::LocalExecutableMissing);
    };

    // The guard owns the temp file for exactly this invocation; dropping it
    // on any exit path, timeout included, removes the file.
    let temp_guard = match write_temp_input(spec, request) {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!("Generator '{}' temp file setup failed: {}", descriptor.name, e);
            return Outcome::Failure(e);
        }
    };
    let temp_path = temp_guard.as_ref().map(|f| f.path());

    let args = substitute_args(&spec.args, request, temp_path);
    let stdin_bytes = match spec.input {
        InputMode::Stdin => Some(request.snapshot.text.as_bytes().to_vec()),
        InputMode::TempFile => None,
    };
    let timeout = descriptor.timeout.unwrap_or(config.default_timeout);

    let result = exec::run(
        &resolved.program,
        &args,
        resolved.cwd.as_deref(),
        &spec.env,
        stdin_bytes,
        timeout,
    )
    .await;

    match result {
        Ok(mut output) => {
            if spec.output == OutputChannel::TempFile {
                match read_temp_output(temp_path) {
                    Ok(rewritten) => output.stdout = rewritten,
                    Err(e) => {
                        tracing::warn!("Generator '{}' temp file readback failed: {}", descriptor.name, e);
                        return Outcome::Failure(e);
                    }
                }
            }
            match (spec.parser)(&output, request) {
                Ok(payload) => Outcome::success(payload),
                Err(reason) => {
                    tracing::warn!("Generator '{}' output rejected: {}", descriptor.name, reason);
                    Outcome::Failure(reason)
                }
            }
        }
        Err(e) if e.is_timeout() => Outcome::Timeout,
        Err(e) => {
            tracing::warn!("Generator '{}' failed: {}", descriptor.name, e);
            Outcome::Failure(e.to_string())
        }
    }
}

fn read_temp_output(temp_path: Option<&Path>) -> Result<String, String> {
    let path = temp_path.ok_or_else(|| "temp-file output requires temp-file input".to_string())?;
    std::fs::read_to_string(path).map_err(|e| format!("failed to read temp file back: {}", e))
}

/// Write snapshot content to a temp file when the descriptor asks for
/// file-based input. The file keeps the document's extension so tools that
/// sniff filetypes behave.
fn write_temp_input(
    spec: &ProcessSpec,
    request: &ExecutionRequest,
) -> Result<Option<NamedTempFile>, String> {
    if spec.input != InputMode::TempFile {
        return Ok(None);
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("sidecar-");
    let suffix = request
        .snapshot
        .id
        .file_type()
        .map(|ext| format!(".{}", ext));
    if let Some(suffix) = &suffix {
        builder.suffix(suffix);
    }

    let mut file = builder
        .tempfile()
        .map_err(|e| format!("failed to create temp file: {}", e))?;
    file.write_all(request.snapshot.text.as_bytes())
        .map_err(|e| format!("failed to write temp file: {}", e))?;
    file.flush().map_err(|e| e.to_string())?;
    Ok(Some(file))
}

/// Substitute request-derived tokens into the argument template.
/// Rows and columns are 1-indexed, matching what CLI tools expect.
fn substitute_args(
    args: &[String],
    request: &ExecutionRequest,
    temp_path: Option<&Path>,
) -> Vec<String> {
    let file = request.snapshot.id.path().display().to_string();
    let temp = temp_path.map(|p| p.display().to_string()).unwrap_or_default();
    let range = request.range.unwrap_or_default();

    args.iter()
        .map(|arg| {
            arg.replace("{file}", &file)
                .replace("{temp}", &temp)
                .replace("{row_start}", &(range.start.line + 1).to_string())
                .replace("{col_start}", &(range.start.character + 1).to_string())
                .replace("{row_end}", &(range.end.line + 1).to_string())
                .replace("{col_end}", &(range.end.character + 1).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::infra::resolver::ResolutionMode;
    use crate::models::capability::Capability;
    use crate::models::document::{DocumentId, DocumentSnapshot};
    use crate::models::outcome::GeneratorPayload;
    use crate::models::text::{Position, Range};

    fn request(text: &str) -> ExecutionRequest {
        ExecutionRequest::new(
            Capability::Formatting,
            DocumentSnapshot::new(DocumentId::from("dir/file.txt"), text),
        )
    }

    fn stdout_formatter(descriptor: super::super::descriptor::DescriptorBuilder) -> SourceDescriptor {
        descriptor.build().unwrap()
    }

    #[test]
    fn test_substitute_args() {
        let req = request("x").with_range(Range::new(Position::new(1, 2), Position::new(4, 0)));
        let args = vec![
            "--stdin-filepath".to_string(),
            "{file}".to_string(),
            "--range".to_string(),
            "{row_start}:{col_start}-{row_end}:{col_end}".to_string(),
        ];
        let substituted = substitute_args(&args, &req, None);

        assert_eq!(substituted[1], "dir/file.txt");
        assert_eq!(substituted[3], "2:3-5:1");
    }

    #[tokio::test]
    async fn test_function_generator_outcomes() {
        let config = EngineConfig::default();
        let ok = SourceDescriptor::builder("up", Capability::Formatting)
            .function(|req| Ok(GeneratorPayload::Formatted(req.snapshot.text.to_uppercase())))
            .build()
            .unwrap();
        let outcome = invoke(&ok, &request("abc"), &config).await;
        match outcome.payload() {
            Some(GeneratorPayload::Formatted(text)) => assert_eq!(text, "ABC"),
            other => panic!("unexpected outcome payload: {:?}", other),
        }

        let failing = SourceDescriptor::builder("bad", Capability::Formatting)
            .function(|_| Err("broken".to_string()))
            .build()
            .unwrap();
        assert!(matches!(
            invoke(&failing, &request("abc"), &config).await,
            Outcome::Failure(reason) if reason == "broken"
        ));
    }

    #[tokio::test]
    async fn test_process_generator_stdin_to_stdout() {
        let config = EngineConfig::default();
        let descriptor = stdout_formatter(
            SourceDescriptor::builder("tr", Capability::Formatting).process(
                "tr",
                &["a-z", "A-Z"],
                |out, _req| Ok(GeneratorPayload::Formatted(out.stdout.clone())),
            ),
        );

        let outcome = invoke(&descriptor, &request("hello\n"), &config).await;
        match outcome.payload() {
            Some(GeneratorPayload::Formatted(text)) => assert_eq!(text, "HELLO\n"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_generator_temp_file_input() {
        let config = EngineConfig::default();
        let descriptor = SourceDescriptor::builder("cat-temp", Capability::Formatting)
            .process("cat", &["{temp}"], |out, _req| {
                Ok(GeneratorPayload::Formatted(out.stdout.clone()))
            })
            .input(InputMode::TempFile)
            .build()
            .unwrap();

        let outcome = invoke(&descriptor, &request("temp content\n"), &config).await;
        match outcome.payload() {
            Some(GeneratorPayload::Formatted(text)) => assert_eq!(text, "temp content\n"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_generator_temp_file_output_readback() {
        let config = EngineConfig::default();
        // Tool that rewrites its input file in place
        let descriptor = SourceDescriptor::builder("in-place", Capability::Formatting)
            .process(
                "sh",
                &["-c", "tr a-z A-Z < {temp} > {temp}.up && mv {temp}.up {temp}"],
                |out, _req| Ok(GeneratorPayload::Formatted(out.stdout.clone())),
            )
            .input(InputMode::TempFile)
            .output(OutputChannel::TempFile)
            .build()
            .unwrap();

        let outcome = invoke(&descriptor, &request("quiet\n"), &config).await;
        match outcome.payload() {
            Some(GeneratorPayload::Formatted(text)) => assert_eq!(text, "QUIET\n"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_timeout_becomes_timeout_outcome() {
        let config = EngineConfig::default();
        let descriptor = SourceDescriptor::builder("slow", Capability::Formatting)
            .process("sleep", &["5"], |out, _req| {
                Ok(GeneratorPayload::Formatted(out.stdout.clone()))
            })
            .timeout(Duration::from_millis(80))
            .build()
            .unwrap();

        assert!(matches!(
            invoke(&descriptor, &request("x"), &config).await,
            Outcome::Timeout
        ));
    }

    #[tokio::test]
    async fn test_only_local_miss_is_skipped_without_spawn() {
        let config = EngineConfig::default();
        let descriptor = SourceDescriptor::builder("local-only", Capability::Formatting)
            .process("definitely-not-installed-anywhere", &[], |out, _req| {
                Ok(GeneratorPayload::Formatted(out.stdout.clone()))
            })
            .resolution(ResolutionMode::OnlyLocal)
            .build()
            .unwrap();

        assert!(matches!(
            invoke(&descriptor, &request("x"), &config).await,
            Outcome::Skipped(SkipReason::LocalExecutableMissing)
        ));
    }

    #[tokio::test]
    async fn test_parser_rejection_is_failure() {
        let config = EngineConfig::default();
        let descriptor = stdout_formatter(
            SourceDescriptor::builder("true-but-rejected", Capability::Formatting).process(
                "true",
                &[],
                |_out, _req| Err("nothing useful".to_string()),
            ),
        );

        assert!(matches!(
            invoke(&descriptor, &request("x"), &config).await,
            Outcome::Failure(_)
        ));
    }

    #[tokio::test]
    async fn test_nonzero_exit_classified_by_parser() {
        let config = EngineConfig::default();
        // Parser accepts stderr findings from a non-zero exit, the common
        // linter contract.
        let descriptor = SourceDescriptor::builder("sh-lint", Capability::Formatting)
            .process("sh", &["-c", "echo formatted; exit 1"], |out, _req| {
                Ok(GeneratorPayload::Formatted(out.stdout.clone()))
            })
            .build()
            .unwrap();

        assert!(invoke(&descriptor, &request("x"), &config).await.is_success());
    }
}
