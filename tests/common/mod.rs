//! Shared fixtures: sample Django projects and a simulated platform.

#![allow(dead_code)]

use kodegen_simple_deploy::deploy::{
    ConfirmationGate, DeployFlags, DeploymentContext, Platform, ProvisionConfig,
};
use kodegen_simple_deploy::error::Result;
use kodegen_simple_deploy::project::ProjectInfo;
use kodegen_simple_deploy::shell::{CommandResult, CommandRunner, CommandSpec, Executor, RunLog};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const MANAGE_PY: &str = r#"#!/usr/bin/env python
import os
import sys


def main():
    os.environ.setdefault('DJANGO_SETTINGS_MODULE', 'blog.settings')
"#;

pub const SETTINGS_PY: &str = "\
from pathlib import Path

BASE_DIR = Path(__file__).resolve().parent.parent
DEBUG = True
ALLOWED_HOSTS = []
";

pub const REQUIREMENTS: &str = "Django==4.1\ndjango-bootstrap5==22.1\n";

/// A `blog` project using requirements.txt
pub fn sample_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("manage.py"), MANAGE_PY).unwrap();
    fs::create_dir_all(dir.path().join("blog")).unwrap();
    fs::write(dir.path().join("blog/settings.py"), SETTINGS_PY).unwrap();
    fs::write(dir.path().join("requirements.txt"), REQUIREMENTS).unwrap();
    fs::write(dir.path().join(".gitignore"), "db.sqlite3\n").unwrap();
    dir
}

#[derive(Debug, Default)]
pub struct RemoteState {
    /// Fly.io apps: name and whether it has been deployed
    pub fly_apps: Vec<(String, bool)>,
    pub fly_region: String,
    /// `flyctl version` exits non-zero (broken install)
    pub fly_version_fails: bool,
    pub fly_clusters: Vec<String>,
    pub fly_secrets: Vec<String>,
    pub heroku_app: Option<String>,
    pub heroku_addons: Vec<String>,
    pub heroku_config: BTreeMap<String, String>,
    pub platformsh_title: Option<String>,
    /// Output of `git status --porcelain`
    pub git_status: String,
    /// Every command issued, `program arg arg`
    pub commands: Vec<String>,
}

/// Scripted runner that answers platform CLI commands from [`RemoteState`]
#[derive(Debug, Clone)]
pub struct SimulatedPlatform {
    pub state: Arc<Mutex<RemoteState>>,
    installed: Arc<HashSet<String>>,
}

impl SimulatedPlatform {
    pub fn new(state: RemoteState) -> Self {
        let installed = ["flyctl", "heroku", "platform", "git"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            state: Arc::new(Mutex::new(state)),
            installed: Arc::new(installed),
        }
    }

    /// Remote state with one freshly created, never deployed Fly.io app
    pub fn fly_with_new_app(app: &str) -> Self {
        Self::new(RemoteState {
            fly_apps: vec![("old-site".to_string(), true), (app.to_string(), false)],
            fly_region: "sea".to_string(),
            ..RemoteState::default()
        })
    }

    pub fn heroku_with_app(app: &str) -> Self {
        Self::new(RemoteState {
            heroku_app: Some(app.to_string()),
            ..RemoteState::default()
        })
    }

    pub fn platformsh_with_project(title: &str) -> Self {
        Self::new(RemoteState {
            platformsh_title: Some(title.to_string()),
            ..RemoteState::default()
        })
    }

    pub fn without(mut self, program: &str) -> Self {
        let mut installed = (*self.installed).clone();
        installed.remove(program);
        self.installed = Arc::new(installed);
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }

    fn respond(&self, spec: &CommandSpec) -> CommandResult {
        let mut state = self.state.lock().unwrap();
        let line = std::iter::once(spec.program.as_str())
            .chain(spec.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        state.commands.push(line);

        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        match (spec.program.as_str(), args.as_slice()) {
            ("flyctl", ["version"]) if state.fly_version_fails => fail("flyctl: bad CPU type\n"),
            ("flyctl", ["version"]) => ok("flyctl v0.1.0"),
            ("flyctl", ["apps", "list"]) => {
                let mut out = String::from(
                    "NAME          OWNER       STATUS      PLATFORM    LATEST DEPLOY\n",
                );
                for (name, deployed) in &state.fly_apps {
                    if *deployed {
                        out.push_str(&format!("{name}  personal  deployed  machines  2h ago\n"));
                    } else {
                        out.push_str(&format!("{name}  personal  pending\n"));
                    }
                }
                ok(&out)
            }
            ("flyctl", ["regions", "list", "-a", _]) => {
                ok(&format!("Region Pool: \n{}\nBackup Region: \n", state.fly_region))
            }
            ("flyctl", ["postgres", "list", "--json"]) => {
                let names: Vec<_> = state.fly_clusters.iter().map(|n| json!({"Name": n})).collect();
                ok(&json!(names).to_string())
            }
            ("flyctl", ["postgres", "create", "--name", name, ..]) => {
                let name = name.to_string();
                state.fly_clusters.push(name.clone());
                ok(&format!("Creating postgres cluster {name}\nPostgres cluster {name} created\n"))
            }
            ("flyctl", ["postgres", "attach", "--app", _, _]) => {
                state.fly_secrets.push("DATABASE_URL".to_string());
                ok("The following secret was added:\n  DATABASE_URL=postgres://example\n")
            }
            ("flyctl", ["secrets", "list", "-a", _, "--json"]) => {
                let names: Vec<_> = state.fly_secrets.iter().map(|n| json!({"Name": n})).collect();
                ok(&json!(names).to_string())
            }
            ("flyctl", ["secrets", "set", "-a", _, assignment]) => {
                let key = assignment.split('=').next().unwrap_or_default().to_string();
                state.fly_secrets.push(key);
                ok("Secrets are staged for the first deployment\n")
            }
            ("flyctl", ["deploy"]) => ok("==> Building image\n--> v0 deployed successfully\n"),
            ("flyctl", ["info", "-a", app]) => ok(&format!("App\n  Hostname = {app}.fly.dev\n")),

            ("heroku", ["apps:info", "--json"]) => match &state.heroku_app {
                Some(app) => ok(&json!({
                    "app": {
                        "name": app,
                        "region": {"name": "us"},
                        "web_url": format!("https://{app}.herokuapp.com/"),
                    }
                })
                .to_string()),
                None => fail(" ▸    No app specified.\n"),
            },
            ("heroku", ["addons", "--json"]) => {
                let addons: Vec<_> = state
                    .heroku_addons
                    .iter()
                    .map(|n| json!({"addon_service": {"name": n}}))
                    .collect();
                ok(&json!(addons).to_string())
            }
            ("heroku", ["addons:create", plan]) => {
                let service = plan.split(':').next().unwrap_or_default().to_string();
                state.heroku_addons.push(service);
                ok("Creating heroku-postgresql... done\n")
            }
            ("heroku", ["config", "--json"]) => ok(&json!(state.heroku_config).to_string()),
            ("heroku", ["config:set", assignment]) => {
                let (key, value) = assignment.split_once('=').unwrap_or((*assignment, ""));
                state.heroku_config.insert(key.to_string(), value.to_string());
                ok(&format!("Setting {key} and restarting... done\n{key}: {value}\n"))
            }

            ("platform", ["project:info", "--yes"]) => match &state.platformsh_title {
                Some(title) => ok(&format!(
                    "+----------+----------------+\n\
                     | Property | Value          |\n\
                     +----------+----------------+\n\
                     | id       | djb2ml3uxgs3g  |\n\
                     | region   | us-3.platform.sh |\n\
                     | title    | {title} |\n\
                     +----------+----------------+\n"
                )),
                None => fail("Could not determine the current project.\n"),
            },
            ("platform", ["push", "--yes"]) => ok("Pushing HEAD to the existing environment main\n"),
            ("platform", ["url", "--yes"]) => ok("https://main-bvxea6i-djb2ml3uxgs3g.us-3.platformsh.site/\n"),

            ("git", ["status", "--porcelain"]) => ok(&state.git_status),
            ("git", ["diff", "--unified=0"]) => ok(""),
            ("git", ["add", "."]) => ok(""),
            ("git", ["commit", "-am", _]) => ok("[main 1a2b3c4] Configured project for deployment.\n"),
            ("git", ["push", "heroku", "main"]) => ok("remote: Verifying deploy... done.\n"),

            _ => fail("unknown command\n"),
        }
    }
}

fn ok(stdout: &str) -> CommandResult {
    CommandResult::new(0, stdout, "")
}

fn fail(stderr: &str) -> CommandResult {
    CommandResult::new(1, "", stderr)
}

impl CommandRunner for SimulatedPlatform {
    fn is_available(&self, program: &str) -> bool {
        self.installed.contains(program)
    }

    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        Ok(self.respond(spec))
    }

    async fn run_streaming<F>(&self, spec: &CommandSpec, mut on_line: F) -> Result<CommandResult>
    where
        F: FnMut(&str),
    {
        let result = self.respond(spec);
        for line in result.stdout_text().lines() {
            on_line(line);
        }
        Ok(result)
    }
}

/// Flags for a fully interactive run with every confirmation pre-approved
pub fn approved_flags() -> DeployFlags {
    DeployFlags {
        skip_confirmations: true,
        log_output: true,
        ..DeployFlags::default()
    }
}

/// Context over `root` using `runner`, answering prompts from `answers`
pub fn context(
    root: &Path,
    platform: Platform,
    flags: DeployFlags,
    runner: SimulatedPlatform,
    answers: &str,
) -> DeploymentContext<SimulatedPlatform> {
    let project = ProjectInfo::inspect(root, None).expect("inspect sample project");
    let log = if flags.log_output {
        RunLog::create(root).expect("create run log")
    } else {
        RunLog::disabled()
    };
    let gate = ConfirmationGate::with_input(
        flags.bypass_confirmations(),
        Cursor::new(answers.as_bytes().to_vec()),
    );
    let executor = Executor::new(runner, log, root);
    DeploymentContext::new(project, platform, flags, executor, gate)
        .with_provision(ProvisionConfig::default())
}

/// Concatenated contents of every run log under `root`
pub fn run_logs(root: &Path) -> String {
    let dir = root.join("simple_deploy_logs");
    let Ok(entries) = fs::read_dir(dir) else {
        return String::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| fs::read_to_string(entry.path()).ok())
        .collect::<Vec<_>>()
        .join("\n")
}
