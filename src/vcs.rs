//! Git working-tree checks and the automate-all commit.

use crate::error::{DeployError, ProjectError, Result};
use crate::shell::{CommandRunner, Executor, LOG_DIR_NAME};

const COMMIT_MESSAGE: &str = "Configured project for deployment.";

/// Lines simple_deploy itself adds to .gitignore
const GITIGNORE_ADDITIONS: [&str; 3] =
    ["", "# Ignore logs from simple_deploy.", "simple_deploy_logs/"];

/// Whether `git status --porcelain` and `git diff --unified=0` show only
/// changes simple_deploy makes itself.
///
/// Tolerated: the log directory untracked, `.gitignore` gaining the log
/// entry, and `settings` gaining `'simple_deploy',` (plus end-of-file
/// newline churn).
pub fn check_status_output(status: &str, diff: &str, settings: &str) -> bool {
    let log_dir = format!("{}/", LOG_DIR_NAME);
    let status_ok = status.lines().filter(|line| !line.trim().is_empty()).all(|line| {
        let code = line.get(..2).unwrap_or_default().trim();
        let path = line.get(3..).unwrap_or_default().trim();
        match code {
            "??" => path == log_dir,
            "M" => path == ".gitignore" || path == settings,
            _ => false,
        }
    });
    if !status_ok {
        return false;
    }

    file_diffs(diff).iter().all(|file| {
        if file.path == ".gitignore" {
            file.removed.is_empty()
                && file
                    .added
                    .iter()
                    .all(|line| GITIGNORE_ADDITIONS.contains(&line.as_str()))
        } else if file.path == settings {
            let mut added: Vec<&str> = file
                .added
                .iter()
                .map(String::as_str)
                .filter(|line| line.trim() != "'simple_deploy',")
                .collect();
            let mut removed: Vec<&str> = file.removed.iter().map(String::as_str).collect();
            added.sort_unstable();
            removed.sort_unstable();
            added == removed
        } else {
            false
        }
    })
}

#[derive(Debug, Default)]
struct FileDiff {
    path: String,
    added: Vec<String>,
    removed: Vec<String>,
}

fn file_diffs(diff: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    for line in diff.lines() {
        if line.starts_with("diff --git ") {
            files.push(FileDiff::default());
            continue;
        }
        let Some(current) = files.last_mut() else {
            continue;
        };

        if let Some(path) = line.strip_prefix("+++ b/") {
            current.path = path.trim().to_string();
        } else if line.starts_with("+++") || line.starts_with("---") {
            continue;
        } else if let Some(added) = line.strip_prefix('+') {
            current.added.push(added.to_string());
        } else if let Some(removed) = line.strip_prefix('-') {
            current.removed.push(removed.to_string());
        }
    }
    files
}

/// Fail with `UncleanGit` unless the tree only holds simple_deploy's own changes
pub async fn ensure_clean<R: CommandRunner>(executor: &Executor<R>, settings: &str) -> Result<()> {
    let status = executor
        .execute_checked("git status --porcelain")
        .await?
        .stdout_text();
    let diff = executor
        .execute_checked("git diff --unified=0")
        .await?
        .stdout_text();

    if check_status_output(&status, &diff, settings) {
        log::info!("Git status is clean enough to continue");
        return Ok(());
    }

    Err(DeployError::Project(ProjectError::UncleanGit {
        status: status.trim_end().to_string(),
    }))
}

/// Stage and commit everything
pub async fn commit<R: CommandRunner>(executor: &Executor<R>) -> Result<()> {
    executor.execute_checked("git add .").await?;
    executor
        .execute_checked(&format!("git commit -am \"{}\"", COMMIT_MESSAGE))
        .await?;
    log::info!("Committed changes");
    Ok(())
}
