//! Running helper commands.

use std::process::{Output, Stdio};

use {tokio::io::AsyncWriteExt, tracing::debug};

use crate::{Error, Result, error::Context as _};

/// Split a configured argv into program and leading arguments.
pub fn split_command(argv: &[String]) -> Result<(&str, &[String])> {
    match argv.split_first() {
        Some((program, args)) if !program.trim().is_empty() => Ok((program.as_str(), args)),
        _ => Err(Error::message("helper command is empty")),
    }
}

/// Fail with `ExternalToolUnavailable` when `program` cannot be found.
pub fn ensure_available(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| Error::ExternalToolUnavailable {
            tool: program.to_string(),
        })
}

/// Run `program args...`, optionally feeding `stdin`, and wait for it.
///
/// A non-zero exit status is returned as [`Error::ToolFailed`].
pub async fn run(program: &str, args: &[String], stdin: Option<&str>) -> Result<Output> {
    debug!(cmd = %program, args = args.len(), "running helper command");

    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ExternalToolUnavailable {
                tool: program.to_string(),
            },
            _ => Error::Io(e),
        })?;

    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        pipe.write_all(input.as_bytes())
            .await
            .with_context(|| format!("failed to write stdin of {program}"))?;
        pipe.write_all(b"\n")
            .await
            .with_context(|| format!("failed to write stdin of {program}"))?;
        // Dropping the pipe closes stdin so the helper sees EOF.
        drop(pipe);
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(cmd = %program, exit_code = ?output.status.code(), %stderr, "helper command failed");
        return Err(Error::ToolFailed {
            tool: program.to_string(),
            code: output.status.code(),
            stderr,
        });
    }
    Ok(output)
}
