//! One [`PlatformDeployer`](super::PlatformDeployer) per supported platform.

mod fly;
mod heroku;
mod platformsh;

pub use fly::FlyDeployer;
pub use heroku::HerokuDeployer;
pub use platformsh::PlatformShDeployer;

use super::context::DeploymentContext;
use super::files::{WriteOutcome, ensure_block, write_if_missing};
use crate::error::Result;
use crate::shell::CommandRunner;
use std::path::Path;

/// Write `relative` under the project root unless it exists, reporting either way
fn add_file<R: CommandRunner>(
    ctx: &mut DeploymentContext<R>,
    relative: &str,
    contents: &str,
) -> Result<WriteOutcome> {
    let path = ctx.project.root.join(relative);
    ctx.write_output(&format!("\n  Looking for {}...", relative));

    let outcome = write_if_missing(&path, contents)?;
    match outcome {
        WriteOutcome::Kept => ctx.write_output(&format!("    Found existing {}.", relative)),
        WriteOutcome::Created => {
            ctx.write_output(&format!("    Generated {}: {}", relative, path.display()));
            ctx.record_file(path);
        }
    }
    Ok(outcome)
}

/// Append the platform block to settings.py unless `marker` is already there
fn add_settings_block<R: CommandRunner>(
    ctx: &mut DeploymentContext<R>,
    marker: &str,
    block: &str,
) -> Result<WriteOutcome> {
    let path = ctx.project.settings_path.clone();
    ctx.write_output(&format!("\n  Checking {} for deployment settings...", display(&path)));

    let outcome = ensure_block(&path, marker, block)?;
    match outcome {
        WriteOutcome::Kept => ctx.write_output("    Found existing deployment settings."),
        WriteOutcome::Created => {
            ctx.write_output("    Added deployment settings.");
            ctx.record_file(path);
        }
    }
    Ok(outcome)
}

fn display(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
