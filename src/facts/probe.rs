//! Raw probe primitives
//!
//! Every fact ultimately comes from one of two operations: reading a file that
//! may not exist, or running a command that may not be installed. Absence is a
//! valid, expected outcome here, never an error; callers degrade each dependent
//! fact individually.

use std::path::Path;
use tokio::process::Command;

/// Captured output of an external command.
///
/// A spawn failure is reported as empty stdout with a nonzero exit code so
/// that callers treat a missing binary exactly like a failing one.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub rc: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

/// Re-anchor an absolute probe path under a fixture root. With the default
/// root `/` this is the identity.
pub(crate) fn rooted(root: &Path, abs: &str) -> std::path::PathBuf {
    root.join(abs.trim_start_matches('/'))
}

/// Read a file, returning its trimmed content if the path exists, is readable
/// and is non-empty after trimming.
pub async fn read_file(path: impl AsRef<Path>) -> Option<String> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub async fn path_exists(path: impl AsRef<Path>) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

/// Run an external command, capturing stdout and stderr.
///
/// Execution failure (binary not installed, permission denied) yields empty
/// output and rc 257, a sentinel above the 8-bit exit-status range so it
/// cannot collide with any real exit code.
pub async fn run_command(argv: &[&str]) -> CommandOutput {
    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => {
            return CommandOutput {
                stdout: String::new(),
                stderr: "empty argv".to_string(),
                rc: 257,
            }
        }
    };

    match Command::new(program).args(args).output().await {
        Ok(output) => CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            rc: output.status.code().unwrap_or(257),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: e.to_string(),
            rc: 257,
        },
    }
}
