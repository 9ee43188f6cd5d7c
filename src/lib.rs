//! # simple_deploy
//!
//! Configures a Django project for deployment to Fly.io, Platform.sh or Heroku.
//!
//! A run inspects the local project, asks the platform CLI what already
//! exists, creates only what is missing (after confirmation), writes config
//! files that are not already present, and declares the packages the platform
//! needs.
//!
//! ## Usage
//!
//! ```bash
//! simple_deploy --platform fly_io                  # configure only
//! simple_deploy --platform heroku --automate-all   # configure, commit and push
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod deploy;
pub mod error;
pub mod parse;
pub mod project;
pub mod shell;
pub mod vcs;

pub use cli::Args;
pub use deploy::{
    ConfirmationGate, ConfirmationRequest, DeployFlags, DeploymentContext, DeploymentSummary,
    Platform, PlatformDeployer, ProvisionConfig, dispatch,
};
pub use error::{DeployError, Result};
pub use project::{DependencyKind, ProjectInfo};
pub use shell::{CommandResult, CommandRunner, CommandSpec, Executor, RunLog, SystemRunner};
