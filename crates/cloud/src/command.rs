use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{CloudError, Result};

const NOT_FOUND_MARKERS: &[&str] = &[
    "(404)",
    "not found",
    "notfound",
    "nosuchentity",
    "nosuchbucket",
    "does not exist",
    "resourcenotfoundexception",
];

const ACCESS_DENIED_MARKERS: &[&str] = &[
    "(403)",
    "accessdenied",
    "access denied",
    "forbidden",
    "unauthorized",
    "expiredtoken",
    "invalidclienttokenid",
];

/// Maps a failed command's stderr onto the error taxonomy.
pub(crate) fn classify(command: &str, stderr: &str) -> CloudError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    if ACCESS_DENIED_MARKERS.iter().any(|m| lower.contains(m)) {
        CloudError::AccessDenied(format!("{}: {}", command, message))
    } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
        CloudError::NotFound(format!("{}: {}", command, message))
    } else {
        CloudError::CommandFailed {
            command: command.to_string(),
            message,
        }
    }
}

/// Runs `program args...`, optionally feeding `stdin`, and returns stdout.
pub(crate) async fn run(program: &str, args: &[String], stdin: Option<&[u8]>) -> Result<String> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!(command = %command_line, "Running command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CloudError::CommandNotFound(program.to_string()),
        _ => CloudError::Io(e),
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input).await?;
    }

    let output = child.wait_with_output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify(&command_line, &stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
