//! Timeout-bounded execution of external analyzer processes

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::process::Command;
use tokio::time;

use crate::config::defaults::AVAILABILITY_TIMEOUT_SECS;
use crate::errors::SandboxError;
use crate::utils;

/// Captured result of a process the exit-code policy accepted
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,

    /// Standard error, lossily decoded
    pub stderr: String,

    /// Exit code (always accepted by the policy)
    pub exit_code: Option<i32>,

    /// Wall-clock time of the run
    pub duration: Duration,
}

/// Runs one command at a time with a hard timeout.
///
/// Exit code 0 is always success. Linters that exit non-zero to signal
/// "findings present" are listed in the findings table; their codes are
/// treated as success too.
#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Program name -> exit codes meaning "findings present"
    findings_exit_codes: HashMap<String, Vec<i32>>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Sandbox with the built-in findings table (`ruff` and `bandit` exit 1)
    pub fn new() -> Self {
        Self::strict()
            .with_findings_exit_code("ruff", 1)
            .with_findings_exit_code("bandit", 1)
    }

    /// Sandbox that only accepts exit code 0
    pub fn strict() -> Self {
        Self {
            findings_exit_codes: HashMap::new(),
        }
    }

    /// Accept `code` as "findings present" for `program`
    pub fn with_findings_exit_code(mut self, program: &str, code: i32) -> Self {
        self.findings_exit_codes
            .entry(program_key(program))
            .or_default()
            .push(code);
        self
    }

    /// Whether `code` counts as success for `program`
    pub fn accepts(&self, program: &str, code: i32) -> bool {
        code == 0
            || self
                .findings_exit_codes
                .get(&program_key(program))
                .is_some_and(|codes| codes.contains(&code))
    }

    /// Run `command` in `working_dir`, killing it once `timeout` elapses
    pub async fn run<S: AsRef<str>>(
        &self,
        command: &[S],
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, SandboxError> {
        let (program, args) = command.split_first().ok_or(SandboxError::EmptyCommand)?;
        let program = program.as_ref();
        if program.trim().is_empty() {
            return Err(SandboxError::EmptyCommand);
        }

        if !working_dir.is_dir() {
            error!("Directory '{}' does not exist", working_dir.display());
            return Err(SandboxError::MissingDirectory(working_dir.to_path_buf()));
        }

        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(AsRef::as_ref))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        utils::log_command(cmd.as_std());

        let start = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| classify_spawn_error(program, e))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                error!("Waiting for '{}' failed: {}", program, source);
                return Err(SandboxError::Io {
                    program: program.to_string(),
                    source,
                });
            }
            Err(_) => {
                error!(
                    "Command '{}' exceeded timeout of {} seconds",
                    program,
                    timeout.as_secs_f64()
                );
                return Err(SandboxError::Timeout {
                    program: program.to_string(),
                    seconds: timeout.as_secs_f64(),
                });
            }
        };

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        match exit_code {
            Some(code) if self.accepts(program, code) => {
                if code == 0 {
                    info!("Command '{}' completed in {:?}", program, duration);
                } else {
                    info!(
                        "Command '{}' reported findings (exit code {}) in {:?}",
                        program, code, duration
                    );
                }
                Ok(CommandOutput {
                    stdout,
                    stderr,
                    exit_code,
                    duration,
                })
            }
            _ => {
                warn!(
                    "Command '{}' failed with exit code {:?} after {:?}",
                    program, exit_code, duration
                );
                let output = if stderr.trim().is_empty() { stdout } else { stderr };
                Err(SandboxError::Failed {
                    program: program.to_string(),
                    code: exit_code,
                    output,
                })
            }
        }
    }

    /// Check a program is on PATH and answers `--version` with exit code 0
    pub async fn is_available(&self, program: &str) -> bool {
        self.version_output(program).await.is_some()
    }

    /// First line of `program --version`, if the program is available
    pub async fn version(&self, program: &str) -> Option<String> {
        let stdout = self.version_output(program).await?;
        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }

    async fn version_output(&self, program: &str) -> Option<String> {
        if !utils::command_exists(program) {
            return None;
        }

        let probe = [program, "--version"];
        match self
            .run(
                &probe,
                &std::env::temp_dir(),
                Duration::from_secs(AVAILABILITY_TIMEOUT_SECS),
            )
            .await
        {
            Ok(output) if output.exit_code == Some(0) => Some(output.stdout),
            Ok(_) => None,
            Err(e) => {
                debug!("Availability probe for '{}' failed: {}", program, e);
                None
            }
        }
    }
}

/// Lowercased file name of a program, so `/usr/bin/Ruff` matches `ruff`
fn program_key(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| program.to_lowercase())
}

fn classify_spawn_error(program: &str, err: io::Error) -> SandboxError {
    let program = program.to_string();
    match err.kind() {
        io::ErrorKind::NotFound => {
            error!("Command '{}' not found. Is it installed?", program);
            SandboxError::NotFound { program }
        }
        io::ErrorKind::PermissionDenied => {
            error!("Permission denied to execute '{}'", program);
            SandboxError::PermissionDenied { program }
        }
        _ => {
            error!("Unexpected error running '{}': {}", program, err);
            SandboxError::Io {
                program,
                source: err,
            }
        }
    }
}
