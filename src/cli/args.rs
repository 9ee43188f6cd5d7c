//! Command line argument parsing and validation.

use crate::deploy::DeployFlags;
use clap::Parser;
use std::path::PathBuf;

/// Configure a Django project for deployment
#[derive(Parser, Debug, Clone)]
#[command(
    name = "simple_deploy",
    version,
    about = "Configure a Django project for deployment",
    long_about = "Configure a Django project for deployment to Fly.io, Platform.sh or Heroku.

Usage:
  simple_deploy --platform fly_io
  simple_deploy --platform heroku --automate-all
  simple_deploy --platform platform_sh --project-root ./blog"
)]
pub struct Args {
    /// Platform to deploy to: fly_io, platform_sh or heroku
    #[arg(long, value_name = "PLATFORM")]
    pub platform: String,

    /// Create resources, commit and push, not just configure
    #[arg(long)]
    pub automate_all: bool,

    /// Do not write a log of this run to simple_deploy_logs/
    #[arg(long)]
    pub no_logging: bool,

    /// Configure even if git reports unrelated uncommitted changes
    #[arg(long)]
    pub ignore_unclean_git: bool,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Directory holding manage.py
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub project_root: PathBuf,

    /// settings.py to modify, when it cannot be discovered
    #[arg(long, value_name = "PATH")]
    pub settings_path: Option<PathBuf>,

    /// Skip every platform query; for testing only
    #[arg(long, hide = true)]
    pub unit_testing: bool,

    /// App name to use with --unit-testing
    #[arg(long, hide = true, value_name = "NAME")]
    pub deployed_project_name: Option<String>,

    /// Region to use with --unit-testing
    #[arg(long, hide = true, value_name = "REGION")]
    pub region: Option<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.platform.trim().is_empty() {
            return Err("--platform is required".to_string());
        }

        if self.unit_testing && self.deployed_project_name.is_none() {
            return Err("--unit-testing requires --deployed-project-name".to_string());
        }

        if !self.unit_testing && (self.deployed_project_name.is_some() || self.region.is_some()) {
            return Err(
                "--deployed-project-name and --region are only valid with --unit-testing"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Run-wide switches for the deployer
    pub fn flags(&self) -> DeployFlags {
        DeployFlags {
            automate_all: self.automate_all,
            skip_confirmations: self.yes,
            unit_testing: self.unit_testing,
            log_output: !self.no_logging,
            ignore_unclean_git: self.ignore_unclean_git,
            deployed_project_name: self.deployed_project_name.clone(),
            region: self.region.clone(),
        }
    }

    /// Options as recorded at the top of the run log
    pub fn describe(&self) -> String {
        let mut options = vec![format!("--platform {}", self.platform)];
        let switches = [
            (self.automate_all, "--automate-all"),
            (self.no_logging, "--no-logging"),
            (self.ignore_unclean_git, "--ignore-unclean-git"),
            (self.yes, "--yes"),
            (self.unit_testing, "--unit-testing"),
        ];
        options.extend(
            switches
                .iter()
                .filter(|(on, _)| *on)
                .map(|(_, name)| name.to_string()),
        );
        options.join(" ")
    }
}
