//! simple_deploy - configure a Django project for deployment to a hosting platform.

use kodegen_simple_deploy::cli;
use kodegen_simple_deploy::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new();
            process::exit(cli::commands::report_failure(&output, &e));
        }
    }
}
