//! Shared state for one deployment run.

use super::gate::{ConfirmationGate, ConfirmationRequest};
use super::provision_config::ProvisionConfig;
use super::Platform;
use crate::cli::OutputManager;
use crate::error::{CliError, DeployError, Result};
use crate::project::ProjectInfo;
use crate::shell::{CommandRunner, Executor};
use std::path::PathBuf;

/// Run-wide switches, passed explicitly to every stage
#[derive(Debug, Clone, Default)]
pub struct DeployFlags {
    /// Commit, push and open the deployed project after configuring
    pub automate_all: bool,
    /// Approve every confirmation without prompting (`--yes`)
    pub skip_confirmations: bool,
    /// Replace every remote query with the precomputed values below
    pub unit_testing: bool,
    /// Keep a run log in `simple_deploy_logs/`
    pub log_output: bool,
    /// Configure even if git reports unrelated changes
    pub ignore_unclean_git: bool,
    /// App name to use when remote queries are replaced
    pub deployed_project_name: Option<String>,
    /// Region to use when remote queries are replaced
    pub region: Option<String>,
}

impl DeployFlags {
    /// True when confirmations never block
    pub fn bypass_confirmations(&self) -> bool {
        self.unit_testing || self.skip_confirmations
    }
}

/// Facts learned from the platform during the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFacts {
    /// App (or project) being configured
    pub app_name: Option<String>,
    /// Region the app runs in
    pub region: Option<String>,
    /// Database attached to the app
    pub db_name: Option<String>,
    /// Public URL, once deployed
    pub url: Option<String>,
}

/// Everything a stage needs: project metadata, flags, facts, executor and gate
#[derive(Debug)]
pub struct DeploymentContext<R> {
    /// Local project facts
    pub project: ProjectInfo,
    /// Target platform
    pub platform: Platform,
    /// Run-wide switches
    pub flags: DeployFlags,
    /// Sizes and plans for created resources
    pub provision: ProvisionConfig,
    /// Facts learned from the platform
    pub remote: RemoteFacts,
    /// Files written during this run
    pub generated_files: Vec<PathBuf>,
    executor: Executor<R>,
    gate: ConfirmationGate,
    output: OutputManager,
}

impl<R: CommandRunner> DeploymentContext<R> {
    /// Assemble a context
    pub fn new(
        project: ProjectInfo,
        platform: Platform,
        flags: DeployFlags,
        executor: Executor<R>,
        gate: ConfirmationGate,
    ) -> Self {
        Self {
            project,
            platform,
            flags,
            provision: ProvisionConfig::from_env(),
            remote: RemoteFacts::default(),
            generated_files: Vec::new(),
            executor,
            gate,
            output: OutputManager::new(),
        }
    }

    /// Override the provisioning config
    pub fn with_provision(mut self, provision: ProvisionConfig) -> Self {
        self.provision = provision;
        self
    }

    /// Shell-command executor
    pub fn executor(&self) -> &Executor<R> {
        &self.executor
    }

    /// Console output
    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Print `message` and record it in the run log
    pub fn write_output(&self, message: &str) {
        let _ = self.output.println(message);
        self.executor.log().record(message);
    }

    /// Print `message` without recording it
    pub fn write_console(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Ask for confirmation; a decline ends the run with `cancel_message`
    pub fn require_confirmation(
        &mut self,
        request: &ConfirmationRequest<'_>,
        cancel_message: &str,
    ) -> Result<()> {
        self.executor.log().record(&request.prompt());
        let outcome = self.gate.require(request, cancel_message);
        let answer = match (&outcome, self.gate.is_bypassed()) {
            (Ok(()), true) => "yes (confirmations skipped)",
            (Ok(()), false) => "yes",
            (Err(_), _) => "no",
        };
        self.executor.log().record(&format!("  Answer: {}", answer));
        outcome
    }

    /// Resolved app name; stages after ResolveIdentity rely on it
    pub fn app_name(&self) -> Result<&str> {
        self.remote.app_name.as_deref().ok_or_else(|| {
            DeployError::Cli(CliError::MissingArgument {
                argument: "deployed app name (not resolved yet)".to_string(),
            })
        })
    }

    /// Remember a file written this run
    pub fn record_file(&mut self, path: PathBuf) {
        self.generated_files.push(path);
    }
}
