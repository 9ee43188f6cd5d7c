//! Durable run log.
//!
//! Every line written here has passed through [`redact_secret`]. The in-memory
//! command results handed back to callers are never touched.

use crate::error::Result;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory created in the project root to hold run logs
pub const LOG_DIR_NAME: &str = "simple_deploy_logs";

/// Secret markers and what replaces everything from the marker on.
/// `SECRET_KEY=` covers the `config:set` command line itself and the quoted
/// form covers `--json` listings of config vars.
const SECRET_MARKERS: [(&str, &str); 3] = [
    ("\"SECRET_KEY\"", "\"SECRET_KEY\": \"*value hidden*\""),
    ("SECRET_KEY:", "SECRET_KEY: *value hidden*"),
    ("SECRET_KEY=", "SECRET_KEY=*value hidden*"),
];

/// Hide everything after a secret-key marker
pub fn redact_secret(line: &str) -> String {
    SECRET_MARKERS
        .iter()
        .find_map(|(marker, hidden)| {
            line.find(marker)
                .map(|idx| format!("{}{}", &line[..idx], hidden))
        })
        .unwrap_or_else(|| line.to_string())
}

/// Append-only log file for one simple_deploy run
#[derive(Debug)]
pub struct RunLog {
    file: Option<(PathBuf, File)>,
}

impl RunLog {
    /// Create `simple_deploy_logs/simple_deploy_<timestamp>.log` under `project_root`
    pub fn create(project_root: &Path) -> Result<Self> {
        let dir = project_root.join(LOG_DIR_NAME);
        fs::create_dir_all(&dir)?;

        let stamp = Local::now().format("%Y-%m-%d-%H%M%S");
        let path = dir.join(format!("simple_deploy_{}.log", stamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        log::debug!("Run log at {}", path.display());
        Ok(Self {
            file: Some((path, file)),
        })
    }

    /// A log that drops everything (`--no-logging`)
    pub fn disabled() -> Self {
        Self { file: None }
    }

    /// Path of the log file, if logging is on
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    /// Persist `text` line by line, redacting secrets
    pub fn record(&self, text: &str) {
        let Some((path, file)) = &self.file else {
            return;
        };

        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut writer = file;
        for line in text.lines() {
            if let Err(e) = writeln!(writer, "{} INFO: {}", stamp, redact_secret(line)) {
                log::warn!("Failed to write run log {}: {}", path.display(), e);
                return;
            }
        }
    }
}
