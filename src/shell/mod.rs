//! Shell-command execution for platform CLIs.
//!
//! The [`Executor`] checks that a CLI is installed before its first use, runs
//! commands through a [`CommandRunner`], and copies all captured output into
//! the run log.

mod run_log;
mod runner;

pub use run_log::{LOG_DIR_NAME, RunLog, redact_secret};
pub use runner::{CommandResult, CommandRunner, CommandSpec, SystemRunner};

use crate::error::{DeployError, PlatformError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where to get a CLI the executor could not find
pub fn install_hint(program: &str) -> &'static str {
    match program {
        "flyctl" | "fly" => "https://fly.io/docs/hands-on/install-flyctl/",
        "platform" => "https://docs.platform.sh/administration/cli.html",
        "heroku" => "https://devcenter.heroku.com/articles/heroku-cli",
        "git" => "https://git-scm.com/downloads",
        _ => "see the platform's documentation",
    }
}

/// Runs commands in the project root and logs their output
#[derive(Debug)]
pub struct Executor<R> {
    runner: R,
    log: RunLog,
    project_root: PathBuf,
    verified: Mutex<HashSet<String>>,
}

impl<R: CommandRunner> Executor<R> {
    /// Create an executor rooted at `project_root`
    pub fn new(runner: R, log: RunLog, project_root: &Path) -> Self {
        Self {
            runner,
            log,
            project_root: project_root.to_path_buf(),
            verified: Mutex::new(HashSet::new()),
        }
    }

    /// The durable run log
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Fail with `ToolNotInstalled` unless `program` is reachable
    pub fn ensure_installed(&self, program: &str) -> Result<()> {
        if let Ok(verified) = self.verified.lock()
            && verified.contains(program)
        {
            return Ok(());
        }

        if !self.runner.is_available(program) {
            return Err(DeployError::Platform(PlatformError::ToolNotInstalled {
                tool: program.to_string(),
                install_hint: install_hint(program).to_string(),
            }));
        }

        if let Ok(mut verified) = self.verified.lock() {
            verified.insert(program.to_string());
        }
        Ok(())
    }

    fn prepare(&self, command: &str) -> Result<CommandSpec> {
        let spec = CommandSpec::parse(command)?.in_dir(&self.project_root);
        self.ensure_installed(&spec.program)?;
        self.log.record(&format!("$ {}", command));
        log::debug!("Running `{}`", redact_secret(command));
        Ok(spec)
    }

    /// Run `command` and capture its output; a non-zero exit is returned, not raised
    pub async fn execute(&self, command: &str) -> Result<CommandResult> {
        let spec = self.prepare(command)?;
        let result = self.runner.run(&spec).await?;

        self.log.record(&result.stdout_text());
        self.log.record(&result.stderr_text());
        if !result.success() {
            log::debug!("`{}` exited with {}", command, result.exit_code);
        }
        Ok(result)
    }

    /// Run a mutating `command`; a non-zero exit is an `ExternalCommandFailure`
    pub async fn execute_checked(&self, command: &str) -> Result<CommandResult> {
        let result = self.execute(command).await?;
        Self::check(command, result)
    }

    /// Run a long `command`, forwarding each output line to `on_line` as it arrives
    pub async fn execute_streaming<F>(&self, command: &str, mut on_line: F) -> Result<CommandResult>
    where
        F: FnMut(&str),
    {
        let spec = self.prepare(command)?;
        let run_log = &self.log;
        let result = self
            .runner
            .run_streaming(&spec, |line| {
                run_log.record(line);
                on_line(line);
            })
            .await?;

        Self::check(command, result)
    }

    fn check(command: &str, result: CommandResult) -> Result<CommandResult> {
        if result.success() {
            return Ok(result);
        }

        Err(DeployError::Platform(PlatformError::CommandFailed {
            command: redact_secret(command),
            exit_code: result.exit_code,
            stderr: result.stderr_text().trim().to_string(),
        }))
    }
}
