//! Dependency manifests: requirements.txt, Pipfile and poetry's pyproject.toml.
//!
//! Additions are append-only. Existing entries, comments and formatting are
//! kept verbatim, and a package already present (under any version) is left
//! alone.

use crate::error::{DeployError, ProjectError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table};

const ADDED_COMMENT: &str = "# Added by simple_deploy command.";
const COMMENT_COLUMN: usize = 30;

/// How the project declares its dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// requirements.txt
    RequirementsTxt,
    /// Pipfile
    Pipenv,
    /// pyproject.toml managed by poetry
    Poetry,
}

impl DependencyKind {
    /// Detect the approach used in `root`.
    ///
    /// Poetry wins over Pipenv, which wins over a plain requirements file.
    pub fn detect(root: &Path) -> Result<Self> {
        let pyproject = root.join("pyproject.toml");
        if pyproject.is_file() {
            let content = fs::read_to_string(&pyproject)?;
            let parsed: toml::Table = toml::from_str(&content)?;
            let is_poetry = parsed
                .get("tool")
                .and_then(|tool| tool.get("poetry"))
                .is_some();
            if is_poetry {
                return Ok(Self::Poetry);
            }
        }

        if root.join("Pipfile").is_file() {
            return Ok(Self::Pipenv);
        }

        if root.join("requirements.txt").is_file() {
            return Ok(Self::RequirementsTxt);
        }

        Err(DeployError::Project(ProjectError::NoDependencyFile {
            root: root.to_path_buf(),
        }))
    }

    /// File name of the manifest in the project root
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::RequirementsTxt => "requirements.txt",
            Self::Pipenv => "Pipfile",
            Self::Poetry => "pyproject.toml",
        }
    }

    /// Key templates branch on
    pub fn template_key(&self) -> &'static str {
        match self {
            Self::RequirementsTxt => "requirements_txt",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequirementsTxt => write!(f, "requirements.txt"),
            Self::Pipenv => write!(f, "Pipenv"),
            Self::Poetry => write!(f, "Poetry"),
        }
    }
}

/// Normalised distribution name of a requirement line: `Django_Foo[x]>=4` → `django-foo`
pub fn root_name(requirement: &str) -> String {
    requirement
        .trim()
        .split(|c: char| "<>=!~;[ @#\t".contains(c))
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .replace('_', "-")
}

/// Result of [`DependencyManifest::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The package was written to the manifest
    Added,
    /// The package was already declared
    AlreadyPresent,
}

/// The project's dependency file plus the requirements it currently declares
#[derive(Debug, Clone)]
pub struct DependencyManifest {
    kind: DependencyKind,
    path: PathBuf,
    requirements: Vec<String>,
}

impl DependencyManifest {
    /// Detect the dependency kind in `root` and read current requirements
    pub fn load(root: &Path) -> Result<Self> {
        let kind = DependencyKind::detect(root)?;
        let path = root.join(kind.file_name());
        let content = fs::read_to_string(&path)?;

        let requirements = match kind {
            DependencyKind::RequirementsTxt => parse_requirements_txt(&content),
            DependencyKind::Pipenv => parse_pipfile(&content),
            DependencyKind::Poetry => parse_poetry(&content)?,
        };

        log::debug!(
            "Found {} requirements in {}",
            requirements.len(),
            path.display()
        );
        Ok(Self {
            kind,
            path,
            requirements,
        })
    }

    /// Dependency kind, fixed at load time
    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// Manifest path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requirements declared so far, including ones added this run
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Whether `package` is declared under any version
    pub fn contains(&self, package: &str) -> bool {
        let wanted = root_name(package);
        self.requirements.iter().any(|r| root_name(r) == wanted)
    }

    /// Declare `package` unless it is already present
    pub fn add(&mut self, package: &str) -> Result<AddOutcome> {
        if self.contains(package) {
            return Ok(AddOutcome::AlreadyPresent);
        }

        let content = fs::read_to_string(&self.path)?;
        let updated = match self.kind {
            DependencyKind::RequirementsTxt => append_requirement(&content, package),
            DependencyKind::Pipenv => insert_pipfile_package(&content, package),
            DependencyKind::Poetry => insert_poetry_package(&content, package, &self.path)?,
        };
        fs::write(&self.path, updated)?;

        self.requirements.push(package.to_string());
        Ok(AddOutcome::Added)
    }
}

fn aligned_comment(used: usize) -> String {
    let pad = COMMENT_COLUMN.saturating_sub(used).max(1);
    format!("{}{}", " ".repeat(pad), ADDED_COMMENT)
}

fn parse_requirements_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with('-')
        })
        .map(str::to_string)
        .collect()
}

fn parse_pipfile(content: &str) -> Vec<String> {
    content
        .lines()
        .skip_while(|line| line.trim() != "[packages]")
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with('['))
        .filter_map(|line| line.split('=').next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with('#'))
        .map(|name| name.trim_matches('"').to_string())
        .collect()
}

fn parse_poetry(content: &str) -> Result<Vec<String>> {
    let parsed: toml::Table = toml::from_str(content)?;
    let Some(poetry) = parsed.get("tool").and_then(|tool| tool.get("poetry")) else {
        return Ok(Vec::new());
    };

    let mut names: Vec<String> = poetry
        .get("dependencies")
        .and_then(toml::Value::as_table)
        .map(|deps| deps.keys().cloned().collect())
        .unwrap_or_default();

    if let Some(groups) = poetry.get("group").and_then(toml::Value::as_table) {
        for group in groups.values() {
            if let Some(deps) = group.get("dependencies").and_then(toml::Value::as_table) {
                names.extend(deps.keys().cloned());
            }
        }
    }

    Ok(names)
}

fn append_requirement(content: &str, package: &str) -> String {
    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(package);
    updated.push_str(&aligned_comment(package.len()));
    updated.push('\n');
    updated
}

fn insert_pipfile_package(content: &str, package: &str) -> String {
    let entry = format!("{} = \"*\"", package);
    let line = format!("{}{}", entry, aligned_comment(entry.len()));

    if content.lines().any(|l| l.trim() == "[packages]") {
        // New packages go directly under the section header.
        content.replacen("[packages]", &format!("[packages]\n{}", line), 1)
    } else {
        let mut updated = content.to_string();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format!("\n[packages]\n{}\n", line));
        updated
    }
}

fn child_table<'a>(parent: &'a mut Table, key: &str, path: &Path) -> Result<&'a mut Table> {
    parent
        .entry(key)
        .or_insert_with(|| {
            let mut table = Table::new();
            table.set_implicit(true);
            Item::Table(table)
        })
        .as_table_mut()
        .ok_or_else(|| {
            DeployError::Project(ProjectError::MalformedManifest {
                path: path.to_path_buf(),
                reason: format!("`{}` is not a table", key),
            })
        })
}

fn insert_poetry_package(content: &str, package: &str, path: &Path) -> Result<String> {
    let mut doc: DocumentMut = content.parse()?;

    let deps = ["tool", "poetry", "group", "deploy", "dependencies"]
        .iter()
        .try_fold(doc.as_table_mut(), |table, key| child_table(table, key, path))?;
    deps.set_implicit(false);
    deps.insert(package, toml_edit::value("*"));

    Ok(doc.to_string())
}
