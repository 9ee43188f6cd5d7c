//! Config-file generation.
//!
//! Every write is "create if missing": an existing file is never touched, and
//! a settings block is appended only when its marker line is absent.

use crate::error::Result;
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Embedded templates, keyed by the file they produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Fly.io Dockerfile
    FlyDockerfile,
    /// Fly.io .dockerignore
    FlyDockerignore,
    /// Fly.io fly.toml
    FlyToml,
    /// Fly.io settings block
    FlySettings,
    /// Platform.sh .platform.app.yaml
    PlatformShApp,
    /// Platform.sh .platform/routes.yaml
    PlatformShRoutes,
    /// Platform.sh .platform/services.yaml
    PlatformShServices,
    /// Platform.sh settings block
    PlatformShSettings,
    /// Heroku Procfile
    HerokuProcfile,
    /// Heroku settings block
    HerokuSettings,
}

impl Template {
    fn source(self) -> &'static str {
        match self {
            Self::FlyDockerfile => include_str!("../../templates/fly/dockerfile.hbs"),
            Self::FlyDockerignore => include_str!("../../templates/fly/dockerignore.hbs"),
            Self::FlyToml => include_str!("../../templates/fly/fly.toml.hbs"),
            Self::FlySettings => include_str!("../../templates/fly/settings.py.hbs"),
            Self::PlatformShApp => include_str!("../../templates/platformsh/platform.app.yaml.hbs"),
            Self::PlatformShRoutes => include_str!("../../templates/platformsh/routes.yaml.hbs"),
            Self::PlatformShServices => {
                include_str!("../../templates/platformsh/services.yaml.hbs")
            }
            Self::PlatformShSettings => include_str!("../../templates/platformsh/settings.py.hbs"),
            Self::HerokuProcfile => include_str!("../../templates/heroku/Procfile.hbs"),
            Self::HerokuSettings => include_str!("../../templates/heroku/settings.py.hbs"),
        }
    }

    /// Render with `data`. Missing fields are an error, and output is not HTML-escaped.
    pub fn render<T: Serialize>(self, data: &T) -> Result<String> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        Ok(registry.render_template(self.source(), data)?)
    }
}

/// What a write helper did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file (or block) was written
    Created,
    /// Something was already there; nothing changed
    Kept,
}

/// Write `contents` to `path` unless the file already exists
pub fn write_if_missing(path: &Path, contents: &str) -> Result<WriteOutcome> {
    if path.exists() {
        log::info!("Found existing {}; leaving it unchanged", path.display());
        return Ok(WriteOutcome::Kept);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    log::info!("Generated {}", path.display());
    Ok(WriteOutcome::Created)
}

/// Append `block` to `path` unless a line of the file already equals `marker`.
///
/// `block` must contain `marker` so a second run finds it.
pub fn ensure_block(path: &Path, marker: &str, block: &str) -> Result<WriteOutcome> {
    let current = fs::read_to_string(path)?;
    if current.lines().any(|line| line.trim() == marker.trim()) {
        log::info!("{} already holds the deployment block", path.display());
        return Ok(WriteOutcome::Kept);
    }

    let mut updated = current;
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(block);
    fs::write(path, updated)?;
    Ok(WriteOutcome::Created)
}

/// Append `line` to `path` (creating it) unless it is already listed
pub fn ensure_line(path: &Path, line: &str, comment: Option<&str>) -> Result<WriteOutcome> {
    let current = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if current.lines().any(|existing| existing.trim() == line) {
        return Ok(WriteOutcome::Kept);
    }

    let mut updated = current;
    if !updated.is_empty() {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push('\n');
    }
    if let Some(comment) = comment {
        updated.push_str(comment);
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    fs::write(path, updated)?;
    Ok(WriteOutcome::Created)
}
