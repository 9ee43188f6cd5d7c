//! Local project inspection.
//!
//! Finds the Django settings module and the dependency manifest. Nothing here
//! talks to a platform.

mod manifest;

pub use manifest::{AddOutcome, DependencyKind, DependencyManifest, root_name};

use crate::error::{DeployError, ProjectError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Facts about the project being configured
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    /// Directory holding manage.py
    pub root: PathBuf,
    /// Django project package name, e.g. `blog`
    pub project_name: String,
    /// Path to settings.py
    pub settings_path: PathBuf,
    /// Dependency manifest and its current requirements
    pub manifest: DependencyManifest,
}

impl ProjectInfo {
    /// Inspect the project at `root`
    pub fn inspect(root: &Path, settings_override: Option<&Path>) -> Result<Self> {
        let settings_path = match settings_override {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => root.join(path),
            None => find_settings(root)?,
        };

        if !settings_path.is_file() {
            return Err(DeployError::Project(ProjectError::SettingsNotFound {
                root: root.to_path_buf(),
            }));
        }

        let project_name = settings_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DeployError::Project(ProjectError::SettingsNotFound {
                    root: root.to_path_buf(),
                })
            })?;

        let manifest = DependencyManifest::load(root)?;

        log::info!(
            "Project '{}' uses {} ({})",
            project_name,
            manifest.kind(),
            settings_path.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            project_name,
            settings_path,
            manifest,
        })
    }
}

/// Settings module named by manage.py, e.g. `blog.settings`
fn settings_module_from_manage_py(root: &Path) -> Option<String> {
    static SETTINGS_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"DJANGO_SETTINGS_MODULE['"]\s*,\s*['"](?P<module>[\w.]+)['"]"#)
            .expect("settings module regex is valid")
    });

    let manage_py = fs::read_to_string(root.join("manage.py")).ok()?;
    SETTINGS_MODULE_RE
        .captures(&manage_py)
        .map(|caps| caps["module"].to_string())
}

fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || matches!(name, "node_modules" | "__pycache__" | "site-packages")
        || name.ends_with("env")
        || name == "simple_deploy_logs"
}

fn find_settings(root: &Path) -> Result<PathBuf> {
    if let Some(module) = settings_module_from_manage_py(root) {
        let candidate = root.join(format!("{}.py", module.replace('.', "/")));
        if candidate.is_file() {
            return Ok(candidate);
        }
        log::debug!(
            "manage.py names {} but {} does not exist",
            module,
            candidate.display()
        );
    }

    let found: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(3)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_skipped_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "settings.py")
        .map(|entry| entry.into_path())
        .collect();

    match found.as_slice() {
        [only] => Ok(only.clone()),
        _ => Err(DeployError::Project(ProjectError::SettingsNotFound {
            root: root.to_path_buf(),
        })),
    }
}
