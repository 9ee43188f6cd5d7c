//! Command execution and top-level error handling.

mod deploy;

pub use deploy::{execute_deploy, run_with};

use crate::cli::{Args, OutputManager};
use crate::error::{DeployError, Result};

/// Execute the deploy command and map its outcome to an exit code.
///
/// A declined confirmation is a clean exit: the cancellation message is
/// printed and the exit code is 0.
pub async fn execute_command(args: Args) -> Result<i32> {
    let output = OutputManager::new();

    if let Err(validation_error) = args.validate() {
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    match execute_deploy(&args).await {
        Ok(_) => Ok(0),
        Err(e) => Ok(report_failure(&output, &e)),
    }
}

/// Print `error` and return the exit code it maps to
pub fn report_failure(output: &OutputManager, error: &DeployError) -> i32 {
    if error.is_declined() {
        let _ = output.println(&format!("\n{}", error));
        return 0;
    }

    output.error(&format!("simple_deploy failed: {}", error));
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        let _ = output.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            let _ = output.println(&format!("  • {}", suggestion));
        }
    }
    1
}
