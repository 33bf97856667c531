//! Command Executor
//!
//! Runs one external generator process to completion: piped stdio, optional
//! stdin payload, hard timeout with forceful termination. The calling task
//! suspends; it never blocks a thread waiting on the child.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ExecError;

/// Where a generator writes its results: a stream, or back into the temp
/// file it was handed (tools that rewrite the file in place).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputChannel {
    #[default]
    Stdout,
    Stderr,
    TempFile,
}

/// Captured result of a finished process.
///
/// A non-zero exit code is not classified here; diagnostics tools commonly
/// exit non-zero when they find problems, so classification belongs to the
/// descriptor's output parser.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn channel(&self, channel: OutputChannel) -> &str {
        match channel {
            // Temp-file output is read back into stdout before parsing
            OutputChannel::Stdout | OutputChannel::TempFile => &self.stdout,
            OutputChannel::Stderr => &self.stderr,
        }
    }
}

/// Spawn `program` and wait for it, bounded by `timeout`.
///
/// On elapsed timeout the child is killed and `ExecError::Timeout` is
/// returned; the timeout deadline wins even against a late exit racing it.
pub async fn run(
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
    env: &[(String, String)],
    stdin_bytes: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<ProcessResult, ExecError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin_bytes.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    for (key, value) in env {
        command.env(key, value);
    }

    tracing::debug!("Spawning {} {:?}", program.display(), args);
    let mut child = command.spawn().map_err(ExecError::Spawn)?;

    // Feed stdin from a separate task so a child that writes before reading
    // cannot deadlock against us.
    if let Some(bytes) = stdin_bytes
        && let Some(mut stdin) = child.stdin.take()
    {
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&bytes).await {
                tracing::debug!("Failed to write generator stdin: {}", e);
            }
            // stdin closes on drop, signalling EOF
        });
    }

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(ExecError::Io)?,
        Err(_) => {
            // kill_on_drop reaps the child; report Timeout rather than wait
            tracing::warn!("{} exceeded {:?} timeout, killed", program.display(), timeout);
            return Err(ExecError::Timeout(timeout));
        }
    };

    Ok(ProcessResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sh() -> PathBuf {
        PathBuf::from("sh")
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let result = run(
            &sh(),
            &["-c".to_string(), "printf hello; exit 3".to_string()],
            None,
            &[],
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.stdout, "hello");
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_stdin_roundtrip() {
        let result = run(
            &PathBuf::from("cat"),
            &[],
            None,
            &[],
            Some(b"from stdin".to_vec()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.stdout, "from stdin");
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_stderr_channel() {
        let result = run(
            &sh(),
            &["-c".to_string(), "echo oops >&2".to_string()],
            None,
            &[],
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.channel(OutputChannel::Stderr).trim(), "oops");
        assert_eq!(result.channel(OutputChannel::Stdout), "");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let started = std::time::Instant::now();
        let result = run(
            &PathBuf::from("sleep"),
            &["5".to_string()],
            None,
            &[],
            None,
            Duration::from_millis(100),
        )
        .await;

        assert!(matches!(result, Err(ExecError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let result = run(
            &PathBuf::from("definitely-not-a-real-tool-9f3a"),
            &[],
            None,
            &[],
            None,
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(ExecError::Spawn(_))));
    }

    #[tokio::test]
    async fn test_env_is_passed_through() {
        let result = run(
            &sh(),
            &["-c".to_string(), "printf \"$SIDECAR_TEST_VAR\"".to_string()],
            None,
            &[("SIDECAR_TEST_VAR".to_string(), "42".to_string())],
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.stdout, "42");
    }
}
