//! The stage machine shared by every platform.
//!
//! Stages run strictly forward, one at a time. A failing stage ends the run;
//! nothing is retried because remote state may already be partly changed.

use super::context::{DeploymentContext, RemoteFacts};
use super::files::{WriteOutcome, ensure_line};
use super::gate::ConfirmationRequest;
use super::{Platform, PlatformDeployer};
use crate::error::{CliError, DeployError, Result};
use crate::project::{AddOutcome, DependencyKind};
use crate::shell::{CommandRunner, LOG_DIR_NAME};
use crate::vcs;
use std::fmt;
use std::path::PathBuf;

/// One step of a deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Up-front confirmations and the git check
    Init,
    /// Platform CLI is installed
    ValidateCli,
    /// Find the app to configure
    ResolveIdentity,
    /// Find the app's region
    ResolveRegion,
    /// Create or reuse the database
    ProvisionDatabase,
    /// Set missing platform secrets
    ConfigureSecrets,
    /// Write config files and the settings block
    GenerateConfigFiles,
    /// Declare required packages
    AddDependencies,
    /// Commit the changes (`--automate-all` only)
    Commit,
    /// Push and deploy (`--automate-all` only)
    Push,
    /// Finished
    Done,
}

impl Stage {
    /// Stage after this one; `Commit` and `Push` only run with `--automate-all`
    pub fn next(self, automate_all: bool) -> Self {
        match self {
            Self::Init => Self::ValidateCli,
            Self::ValidateCli => Self::ResolveIdentity,
            Self::ResolveIdentity => Self::ResolveRegion,
            Self::ResolveRegion => Self::ProvisionDatabase,
            Self::ProvisionDatabase => Self::ConfigureSecrets,
            Self::ConfigureSecrets => Self::GenerateConfigFiles,
            Self::GenerateConfigFiles => Self::AddDependencies,
            Self::AddDependencies if automate_all => Self::Commit,
            Self::AddDependencies => Self::Done,
            Self::Commit => Self::Push,
            Self::Push | Self::Done => Self::Done,
        }
    }

    /// True for stages that only talk to the platform
    pub fn is_remote(self) -> bool {
        matches!(
            self,
            Self::ValidateCli
                | Self::ProvisionDatabase
                | Self::ConfigureSecrets
                | Self::Commit
                | Self::Push
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ValidateCli => "validate CLI",
            Self::ResolveIdentity => "resolve app",
            Self::ResolveRegion => "resolve region",
            Self::ProvisionDatabase => "provision database",
            Self::ConfigureSecrets => "configure secrets",
            Self::GenerateConfigFiles => "generate config files",
            Self::AddDependencies => "add dependencies",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    /// Target platform
    pub platform: Platform,
    /// Facts learned from the platform
    pub remote: RemoteFacts,
    /// Files written this run
    pub generated_files: Vec<PathBuf>,
    /// Packages added to the dependency manifest this run
    pub added_packages: Vec<String>,
    /// Manual steps left for the user (empty with `--automate-all`)
    pub next_steps: Vec<String>,
    /// Stages visited, in order
    pub stages: Vec<Stage>,
}

/// Drive `deployer` through every stage
pub async fn run<D, R>(deployer: &D, ctx: &mut DeploymentContext<R>) -> Result<DeploymentSummary>
where
    D: PlatformDeployer,
    R: CommandRunner,
{
    let automate_all = ctx.flags.automate_all;
    let mut stage = Stage::Init;
    let mut visited = Vec::new();
    let mut added_packages = Vec::new();

    while stage != Stage::Done {
        visited.push(stage);

        if ctx.flags.unit_testing && stage.is_remote() {
            log::debug!("Unit testing: skipping stage '{}'", stage);
            stage = stage.next(automate_all);
            continue;
        }

        log::info!("Stage: {}", stage);
        match stage {
            Stage::Init => init(deployer, ctx).await?,
            Stage::ValidateCli => deployer.validate_cli(ctx).await?,
            Stage::ResolveIdentity => {
                let app_name = if ctx.flags.unit_testing {
                    ctx.flags.deployed_project_name.clone().ok_or_else(|| {
                        DeployError::Cli(CliError::MissingArgument {
                            argument: "--deployed-project-name".to_string(),
                        })
                    })?
                } else {
                    deployer.resolve_identity(ctx).await?
                };
                ctx.write_output(&format!("  Using {} app: {}", deployer.platform(), app_name));
                ctx.remote.app_name = Some(app_name);
            }
            Stage::ResolveRegion => {
                let region = if ctx.flags.unit_testing {
                    ctx.flags
                        .region
                        .clone()
                        .unwrap_or_else(|| deployer.default_region().to_string())
                } else {
                    deployer.resolve_region(ctx).await?
                };
                ctx.write_output(&format!("  Region: {}", region));
                ctx.remote.region = Some(region);
            }
            Stage::ProvisionDatabase => deployer.provision_database(ctx).await?,
            Stage::ConfigureSecrets => deployer.configure_secrets(ctx).await?,
            Stage::GenerateConfigFiles => {
                if ctx.flags.log_output {
                    ignore_log_dir(ctx)?;
                }
                deployer.generate_config_files(ctx)?;
            }
            Stage::AddDependencies => {
                added_packages = add_dependencies(deployer, ctx)?;
            }
            Stage::Commit => vcs::commit(ctx.executor()).await?,
            Stage::Push => push(deployer, ctx).await?,
            Stage::Done => {}
        }

        stage = stage.next(automate_all);
    }
    visited.push(Stage::Done);

    let next_steps = if automate_all {
        Vec::new()
    } else {
        deployer.next_steps(&ctx.remote)
    };

    let summary = DeploymentSummary {
        platform: deployer.platform(),
        remote: ctx.remote.clone(),
        generated_files: ctx.generated_files.clone(),
        added_packages,
        next_steps,
        stages: visited,
    };
    report(ctx, &summary);
    Ok(summary)
}

/// Package providing the simple_deploy Django app itself
pub const SIMPLE_DEPLOY_PACKAGE: &str = "django-simple-deploy";

async fn init<D, R>(deployer: &D, ctx: &mut DeploymentContext<R>) -> Result<()>
where
    D: PlatformDeployer,
    R: CommandRunner,
{
    ctx.write_output(&format!("Configuring project for deployment to {}...", deployer.platform()));

    if let Some(notice) = deployer.preliminary_notice() {
        ctx.require_confirmation(&ConfirmationRequest::new(notice), deployer.cancel_message())?;
    }

    if ctx.flags.automate_all {
        ctx.require_confirmation(
            &ConfirmationRequest::new(deployer.automate_all_message()),
            deployer.cancel_message(),
        )?;
    }

    if ctx.flags.unit_testing {
        return Ok(());
    }

    if ctx.flags.ignore_unclean_git {
        ctx.write_output("  Ignoring git status.");
        return Ok(());
    }

    let settings = ctx
        .project
        .settings_path
        .strip_prefix(&ctx.project.root)
        .unwrap_or(&ctx.project.settings_path)
        .to_string_lossy()
        .into_owned();
    vcs::ensure_clean(ctx.executor(), &settings).await
}

fn ignore_log_dir<R: CommandRunner>(ctx: &mut DeploymentContext<R>) -> Result<()> {
    let path = ctx.project.root.join(".gitignore");
    let outcome = ensure_line(
        &path,
        &format!("{}/", LOG_DIR_NAME),
        Some("# Ignore logs from simple_deploy."),
    )?;
    if outcome == WriteOutcome::Created {
        ctx.write_output(&format!("  Added {}/ to .gitignore", LOG_DIR_NAME));
    }
    Ok(())
}

fn add_dependencies<D, R>(deployer: &D, ctx: &mut DeploymentContext<R>) -> Result<Vec<String>>
where
    D: PlatformDeployer,
    R: CommandRunner,
{
    ctx.write_output(&format!(
        "\n  Looking in {} for required packages...",
        ctx.project.manifest.path().display()
    ));

    // simple_deploy sits in INSTALLED_APPS, so the deployed project must be
    // able to import it. Pipenv and poetry record it when it is installed.
    let mut packages = Vec::new();
    if ctx.project.manifest.kind() == DependencyKind::RequirementsTxt {
        packages.push(SIMPLE_DEPLOY_PACKAGE);
    }
    packages.extend_from_slice(deployer.required_packages());

    let mut added = Vec::new();
    for package in packages {
        match ctx.project.manifest.add(package)? {
            AddOutcome::Added => {
                ctx.write_output(&format!("    Added {} to requirements.", package));
                added.push(package.to_string());
            }
            AddOutcome::AlreadyPresent => {
                ctx.write_output(&format!("    Found {} in requirements.", package));
            }
        }
    }
    Ok(added)
}

async fn push<D, R>(deployer: &D, ctx: &mut DeploymentContext<R>) -> Result<()>
where
    D: PlatformDeployer,
    R: CommandRunner,
{
    ctx.write_output(&format!("  Pushing project to {}...", deployer.platform()));
    let output = ctx.output();
    ctx.executor()
        .execute_streaming(deployer.deploy_command(), |line| {
            let _ = output.println(line);
        })
        .await?;

    let url = deployer.fetch_url(ctx).await?;
    if let Some(url) = &url {
        ctx.write_output(&format!("  Deployed project is at {}", url));
    }
    ctx.remote.url = url;
    Ok(())
}

fn report<R: CommandRunner>(ctx: &DeploymentContext<R>, summary: &DeploymentSummary) {
    let output = ctx.output();
    let _ = output.section(&format!("Finished configuring for {}", summary.platform));
    if let Some(app) = &summary.remote.app_name {
        let _ = output.indent(&format!("App: {}", app));
    }
    if let Some(region) = &summary.remote.region {
        let _ = output.indent(&format!("Region: {}", region));
    }
    if let Some(db) = &summary.remote.db_name {
        let _ = output.indent(&format!("Database: {}", db));
    }
    for file in &summary.generated_files {
        let _ = output.indent(&format!("Generated: {}", file.display()));
    }
    if let Some(url) = &summary.remote.url {
        let _ = output.success(&format!("Your project is live at {}", url));
    }
    if !summary.next_steps.is_empty() {
        let _ = output.println("\nTo deploy your project:");
        for step in &summary.next_steps {
            let _ = output.indent(step);
        }
    }
    if let Some(path) = ctx.executor().log().path() {
        let _ = output.info(&format!("A log of this run is at {}", path.display()));
    }
}
