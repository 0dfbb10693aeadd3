//! Running the configured command inside a repository.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::error::RunError;

/// Executes the configured command with a working directory.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Run `command` in `dir`, returning its standard output.
    async fn run(&self, dir: &Path, command: &str) -> Result<Vec<u8>, RunError>;
}

/// Runs commands through `<shell> -c <command>`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl ActionRunner for ShellRunner {
    async fn run(&self, dir: &Path, command: &str) -> Result<Vec<u8>, RunError> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RunError::Spawn {
                command: command.to_string(),
                dir: dir.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(RunError::Failed {
                command: command.to_string(),
                dir: dir.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
