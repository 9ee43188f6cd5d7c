//! Process execution seam.
//!
//! `CommandRunner` is the only place the crate touches real processes. The
//! system implementation spawns through tokio; tests swap in a scripted runner
//! that simulates a platform's remote state.

use crate::error::{CliError, DeployError, PlatformError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Outcome of one external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
    /// Raw stdout bytes
    pub stdout: Vec<u8>,
    /// Raw stderr bytes
    pub stderr: Vec<u8>,
}

impl CommandResult {
    /// Build a result from text output
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into().into_bytes(),
            stderr: stderr.into().into_bytes(),
        }
    }

    /// Zero exit status
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Lossy UTF-8 view of stdout
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Lossy UTF-8 view of stderr
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// A parsed command line ready to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Binary name
    pub program: String,
    /// Arguments, already split
    pub args: Vec<String>,
    /// Working directory
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Split a command line with shell quoting rules
    pub fn parse(command: &str) -> Result<Self> {
        let mut words = shell_words::split(command).map_err(|e| {
            DeployError::Cli(CliError::InvalidArguments {
                reason: format!("Cannot parse command `{}`: {}", command, e),
            })
        })?;

        if words.is_empty() {
            return Err(DeployError::Cli(CliError::InvalidArguments {
                reason: "Empty command".to_string(),
            }));
        }

        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            current_dir: None,
        })
    }

    /// Run the command from `dir`
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Command line as it would be typed
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Runs external commands
pub trait CommandRunner {
    /// True if `program` can be found in the execution environment
    fn is_available(&self, program: &str) -> bool;

    /// Run to completion, capturing stdout and stderr
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<CommandResult>>;

    /// Run to completion, handing each stdout/stderr line to `on_line` as it arrives
    fn run_streaming<F>(
        &self,
        spec: &CommandSpec,
        on_line: F,
    ) -> impl Future<Output = Result<CommandResult>>
    where
        F: FnMut(&str);
}

/// Runner backed by real processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, e: std::io::Error) -> DeployError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeployError::Platform(PlatformError::ToolNotInstalled {
                tool: spec.program.clone(),
                install_hint: super::install_hint(&spec.program).to_string(),
            })
        } else {
            DeployError::Platform(PlatformError::CommandFailed {
                command: spec.display(),
                exit_code: -1,
                stderr: e.to_string(),
            })
        }
    }
}

impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn run_streaming<F>(&self, spec: &CommandSpec, mut on_line: F) -> Result<CommandResult>
    where
        F: FnMut(&str),
    {
        let mut child = Self::command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(spec, e))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(DeployError::Platform(PlatformError::CommandFailed {
                command: spec.display(),
                exit_code: -1,
                stderr: "output pipes unavailable".to_string(),
            }));
        };

        let mut out_reader = BufReader::new(stdout);
        let mut err_reader = BufReader::new(stderr);
        let mut out_line = Vec::new();
        let mut err_line = Vec::new();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut out_done = false;
        let mut err_done = false;

        // git push and most deploy commands report progress on stderr, so both
        // pipes are forwarded in arrival order. Lines are raw bytes; a CLI that
        // prints non-UTF-8 must not abort a push that is still running.
        while !(out_done && err_done) {
            tokio::select! {
                read = out_reader.read_until(b'\n', &mut out_line), if !out_done => match read {
                    Ok(0) => out_done = true,
                    Ok(_) => {
                        on_line(&line_text(&out_line));
                        stdout_buf.append(&mut out_line);
                    }
                    Err(e) => {
                        log::warn!("Stopped reading stdout of `{}`: {}", spec.display(), e);
                        out_done = true;
                    }
                },
                read = err_reader.read_until(b'\n', &mut err_line), if !err_done => match read {
                    Ok(0) => err_done = true,
                    Ok(_) => {
                        on_line(&line_text(&err_line));
                        stderr_buf.append(&mut err_line);
                    }
                    Err(e) => {
                        log::warn!("Stopped reading stderr of `{}`: {}", spec.display(), e);
                        err_done = true;
                    }
                },
            }
        }

        let status = child.wait().await?;

        Ok(CommandResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout_buf,
            stderr: stderr_buf,
        })
    }
}

/// One output line without its terminator, lossily decoded
fn line_text(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_quoted_words() {
        let spec = CommandSpec::parse(r#"git commit -am "Configured project for deployment.""#)
            .expect("parse");
        assert_eq!(spec.program, "git");
        assert_eq!(
            spec.args,
            vec!["commit", "-am", "Configured project for deployment."]
        );
    }

    #[test]
    fn test_parse_rejects_empty_command() {
        assert!(CommandSpec::parse("   ").is_err());
    }

    #[test]
    fn test_display_round_trips_quoting() {
        let spec = CommandSpec::parse("flyctl secrets set -a blog ON_FLYIO=1").expect("parse");
        assert_eq!(spec.display(), "flyctl secrets set -a blog ON_FLYIO=1");
    }

    #[test]
    fn test_line_text_strips_terminator_and_keeps_bad_bytes() {
        assert_eq!(line_text(b"ok\r\n"), "ok");
        assert_eq!(line_text(b"\xff\n"), "\u{FFFD}");
        assert_eq!(line_text(b"last"), "last");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streaming_survives_invalid_utf8() {
        let spec = CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), r"printf 'ok\n\377\nafter\n'; exit 0".to_string()],
            current_dir: None,
        };

        let mut seen = Vec::new();
        let result = SystemRunner
            .run_streaming(&spec, |line| seen.push(line.to_string()))
            .await
            .expect("stream completes");

        assert!(result.success());
        assert_eq!(seen, vec!["ok", "\u{FFFD}", "after"]);
        assert_eq!(result.stdout, b"ok\n\xff\nafter\n".to_vec());
    }

    #[test]
    fn test_result_success_tracks_exit_code() {
        assert!(CommandResult::new(0, "ok", "").success());
        assert!(!CommandResult::new(2, "", "nope").success());
        assert_eq!(CommandResult::new(1, "", "nope").stderr_text(), "nope");
    }
}
