//! Deployment orchestration.
//!
//! A [`PlatformDeployer`] supplies the platform-specific command text and
//! parsing; [`workflow::run`] drives every platform through the same stage
//! sequence. [`dispatch`] picks the deployer for the platform named on the
//! command line.

pub mod context;
pub mod files;
pub mod gate;
pub mod platforms;
pub mod probe;
pub mod provision_config;
pub mod workflow;

pub use context::{DeployFlags, DeploymentContext, RemoteFacts};
pub use gate::{ConfirmationGate, ConfirmationRequest};
pub use probe::{RemoteResource, ResourceKind, probe};
pub use provision_config::ProvisionConfig;
pub use workflow::{DeploymentSummary, Stage};

use crate::error::{CliError, DeployError, PlatformError, Result};
use crate::shell::CommandRunner;
use platforms::{FlyDeployer, HerokuDeployer, PlatformShDeployer};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Supported hosting platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Fly.io
    FlyIo,
    /// Platform.sh
    PlatformSh,
    /// Heroku
    Heroku,
}

impl Platform {
    /// Name used on the command line
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::FlyIo => "fly_io",
            Self::PlatformSh => "platform_sh",
            Self::Heroku => "heroku",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlyIo => write!(f, "Fly.io"),
            Self::PlatformSh => write!(f, "Platform.sh"),
            Self::Heroku => write!(f, "Heroku"),
        }
    }
}

impl FromStr for Platform {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fly_io" => Ok(Self::FlyIo),
            "platform_sh" => Ok(Self::PlatformSh),
            "heroku" => Ok(Self::Heroku),
            "azur_appservice" | "azure" => Err(DeployError::Platform(
                PlatformError::UnsupportedPlatform {
                    name: s.to_string(),
                },
            )),
            other => Err(DeployError::Cli(CliError::InvalidArguments {
                reason: format!(
                    "Unknown platform '{}'. Choose one of: fly_io, platform_sh, heroku",
                    other
                ),
            })),
        }
    }
}

/// Platform-specific half of a deployment.
///
/// The stage machine in [`workflow`] calls these in order. Methods that touch
/// the platform are never called in unit-testing mode; the workflow fills the
/// context from precomputed flags instead.
pub trait PlatformDeployer {
    /// Which platform this deployer targets
    fn platform(&self) -> Platform;

    /// Name of the platform CLI binary
    fn cli(&self) -> &'static str;

    /// Packages the deployed project needs, in the order they are added
    fn required_packages(&self) -> &'static [&'static str];

    /// Printed when the user declines a confirmation
    fn cancel_message(&self) -> &'static str;

    /// Shown before anything happens when `--automate-all` is set
    fn automate_all_message(&self) -> &'static str;

    /// Extra confirmation shown before anything else, for platforms with preliminary support
    fn preliminary_notice(&self) -> Option<&'static str> {
        None
    }

    /// Region assumed when remote queries are replaced and none was given
    fn default_region(&self) -> &'static str;

    /// Fail fast when the CLI is missing
    fn validate_cli<R: CommandRunner>(
        &self,
        ctx: &DeploymentContext<R>,
    ) -> impl Future<Output = Result<()>> {
        async move { ctx.executor().ensure_installed(self.cli()) }
    }

    /// Find the app to configure; never creates it
    fn resolve_identity<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> impl Future<Output = Result<String>>;

    /// Region the resolved app runs in
    fn resolve_region<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> impl Future<Output = Result<String>>;

    /// Probe for the database, create it behind the gate if absent, then attach
    fn provision_database<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> impl Future<Output = Result<()>>;

    /// Set each platform secret that is not already set
    fn configure_secrets<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> impl Future<Output = Result<()>>;

    /// Write config files that do not exist yet and append the settings block
    fn generate_config_files<R: CommandRunner>(&self, ctx: &mut DeploymentContext<R>)
    -> Result<()>;

    /// Listing command that reveals whether `kind` exists; `None` if the platform has none
    fn probe_command(&self, kind: &ResourceKind, facts: &RemoteFacts) -> Option<String>;

    /// Read the listing produced by [`probe_command`](Self::probe_command)
    fn parse_exists(&self, kind: &ResourceKind, output: &str) -> bool;

    /// Command that pushes the configured project
    fn deploy_command(&self) -> &'static str;

    /// Public URL of the deployed project
    fn fetch_url<R: CommandRunner>(
        &self,
        ctx: &DeploymentContext<R>,
    ) -> impl Future<Output = Result<Option<String>>>;

    /// Manual steps printed when `--automate-all` was not used
    fn next_steps(&self, facts: &RemoteFacts) -> Vec<String>;
}

/// Run the deployment for the platform stored in `ctx`
pub async fn dispatch<R: CommandRunner>(
    ctx: &mut DeploymentContext<R>,
) -> Result<DeploymentSummary> {
    log::info!("Dispatching to the {} deployer", ctx.platform);
    match ctx.platform {
        Platform::FlyIo => workflow::run(&FlyDeployer, ctx).await,
        Platform::PlatformSh => workflow::run(&PlatformShDeployer, ctx).await,
        Platform::Heroku => workflow::run(&HerokuDeployer, ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_names_parse() {
        assert_eq!("fly_io".parse::<Platform>().unwrap(), Platform::FlyIo);
        assert_eq!("Platform_SH".parse::<Platform>().unwrap(), Platform::PlatformSh);
        assert_eq!("heroku".parse::<Platform>().unwrap(), Platform::Heroku);
    }

    #[test]
    fn test_azure_is_recognised_but_unsupported() {
        let err = "azur_appservice".parse::<Platform>().unwrap_err();
        assert!(matches!(
            err,
            DeployError::Platform(PlatformError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_unknown_platform_is_argument_error() {
        let err = "vercel".parse::<Platform>().unwrap_err();
        assert!(matches!(err, DeployError::Cli(CliError::InvalidArguments { .. })));
        assert!(err.to_string().contains("fly_io"));
    }

    #[test]
    fn test_cli_name_round_trips() {
        for platform in [Platform::FlyIo, Platform::PlatformSh, Platform::Heroku] {
            assert_eq!(platform.cli_name().parse::<Platform>().unwrap(), platform);
        }
    }
}
