//! The deploy command: inspect the project, then hand off to the platform deployer.

use crate::cli::Args;
use crate::deploy::{ConfirmationGate, DeploymentContext, DeploymentSummary, Platform, dispatch};
use crate::error::Result;
use crate::project::ProjectInfo;
use crate::shell::{CommandRunner, Executor, RunLog, SystemRunner};

/// Configure the project named by `args` using the real platform CLIs
pub async fn execute_deploy(args: &Args) -> Result<DeploymentSummary> {
    let gate = ConfirmationGate::stdin(args.flags().bypass_confirmations());
    run_with(args, SystemRunner, gate).await
}

/// Same as [`execute_deploy`] with an explicit runner and gate
pub async fn run_with<R: CommandRunner>(
    args: &Args,
    runner: R,
    gate: ConfirmationGate,
) -> Result<DeploymentSummary> {
    let platform: Platform = args.platform.parse()?;
    let root = args.project_root.canonicalize()?;
    let project = ProjectInfo::inspect(&root, args.settings_path.as_deref())?;
    let flags = args.flags();

    let log = if flags.log_output {
        RunLog::create(&root)?
    } else {
        RunLog::disabled()
    };
    log.record("\nLogging run of `simple_deploy`...");
    log.record(&format!("Configuration details:\n  {}", args.describe()));
    log.record(&format!(
        "  Dependency management approach: {}",
        project.manifest.kind()
    ));

    let executor = Executor::new(runner, log, &root);
    let mut ctx = DeploymentContext::new(project, platform, flags, executor, gate);
    dispatch(&mut ctx).await
}
