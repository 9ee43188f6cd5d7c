//! Error types for simple_deploy operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for simple_deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for all simple_deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Remote platform errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Local project errors
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// The user declined a confirmation prompt.
    ///
    /// Not a fault: the command exits successfully after printing `message`.
    #[error("{message}")]
    Declined {
        /// Platform-specific cancellation message
        message: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML editing errors
    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    /// Template rendering errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// Errors raised while talking to a hosting platform
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Platform CLI binary is not reachable
    #[error("The {tool} CLI is not installed or not on PATH.")]
    ToolNotInstalled {
        /// Binary name
        tool: String,
        /// Where to get it
        install_hint: String,
    },

    /// An expected remote resource could not be resolved
    #[error("Could not find {resource} (checked with `{command}`).")]
    ResourceNotFound {
        /// What was looked for
        resource: String,
        /// Listing command that was parsed
        command: String,
        /// What the user should do before re-running
        remediation: String,
    },

    /// A command exited with a non-zero status
    #[error("`{command}` failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        /// Command text
        command: String,
        /// Exit code (-1 when killed by a signal)
        exit_code: i32,
        /// Captured stderr
        stderr: String,
    },

    /// Platform name is known but not supported
    #[error("Platform '{name}' is not currently supported.")]
    UnsupportedPlatform {
        /// Requested platform
        name: String,
    },
}

/// Errors about the local project
#[derive(Error, Debug)]
pub enum ProjectError {
    /// None of requirements.txt, Pipfile or a poetry pyproject.toml exists
    #[error("No requirements.txt, Pipfile or poetry pyproject.toml found in {root}")]
    NoDependencyFile {
        /// Project root
        root: PathBuf,
    },

    /// settings.py could not be located
    #[error("Could not locate settings.py under {root}")]
    SettingsNotFound {
        /// Project root
        root: PathBuf,
    },

    /// Working tree contains changes simple_deploy did not make
    #[error("Git working tree is not clean:\n{status}")]
    UncleanGit {
        /// Output of `git status --porcelain`
        status: String,
    },

    /// A dependency manifest could not be understood
    #[error("Malformed {path}: {reason}")]
    MalformedManifest {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl DeployError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DeployError::Platform(PlatformError::ToolNotInstalled { tool, install_hint }) => vec![
                format!("Install the {} CLI: {}", tool, install_hint),
                "Log in with the CLI, then run simple_deploy again".to_string(),
            ],
            DeployError::Platform(PlatformError::ResourceNotFound { remediation, .. }) => {
                vec![remediation.clone(), "Then run simple_deploy again".to_string()]
            }
            DeployError::Platform(PlatformError::CommandFailed { command, .. }) => vec![
                format!("Run `{}` yourself to see the full error", command),
                "Remote resources may be partially created; inspect them before re-running"
                    .to_string(),
            ],
            DeployError::Project(ProjectError::UncleanGit { .. }) => vec![
                "Commit pending changes: git add . && git commit -m 'message'".to_string(),
                "Or pass --ignore-unclean-git to configure anyway".to_string(),
            ],
            DeployError::Project(ProjectError::SettingsNotFound { .. }) => {
                vec!["Point at the file with --settings-path".to_string()]
            }
            DeployError::Project(ProjectError::NoDependencyFile { .. }) => vec![
                "Generate one with: pip freeze > requirements.txt".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// True when the user chose not to continue
    pub fn is_declined(&self) -> bool {
        matches!(self, DeployError::Declined { .. })
    }
}
