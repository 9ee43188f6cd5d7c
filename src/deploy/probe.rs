//! Resource state prober.
//!
//! Queries the platform for a named resource so creation can be skipped when
//! it already exists. The platform is the source of truth; nothing is cached
//! between runs.

use super::context::DeploymentContext;
use super::PlatformDeployer;
use crate::error::Result;
use crate::shell::CommandRunner;
use std::fmt;

/// Kind of remote resource to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// The top-level app or project
    App,
    /// A database with this name
    Database(String),
    /// A platform secret / config var with this name
    Secret(String),
}

impl ResourceKind {
    /// Name of the resource being looked for
    pub fn name(&self) -> &str {
        match self {
            Self::App => "app",
            Self::Database(name) | Self::Secret(name) => name,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => write!(f, "app"),
            Self::Database(name) => write!(f, "database {}", name),
            Self::Secret(name) => write!(f, "secret {}", name),
        }
    }
}

/// A provisioned (or missing) entity on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    /// What was looked for
    pub kind: ResourceKind,
    /// Logical name
    pub name: String,
    /// Region, when the listing reports one
    pub region: Option<String>,
    /// Whether the platform reported it
    pub exists: bool,
    /// Listing output the decision was made from
    pub raw: String,
}

impl RemoteResource {
    /// A resource found in `raw`
    pub fn found(kind: ResourceKind, raw: impl Into<String>) -> Self {
        let name = kind.name().to_string();
        Self {
            kind,
            name,
            region: None,
            exists: true,
            raw: raw.into(),
        }
    }

    /// A resource the platform did not report
    pub fn missing(kind: ResourceKind, raw: impl Into<String>) -> Self {
        Self {
            exists: false,
            ..Self::found(kind, raw)
        }
    }

    /// Attach a region
    pub fn in_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// Ask the platform whether `kind` exists.
///
/// Runs the deployer's listing command and hands its output to the
/// deployer's parser. A failing listing command is an error, never "absent",
/// so a broken login cannot trigger duplicate creation.
pub async fn probe<D, R>(
    deployer: &D,
    ctx: &DeploymentContext<R>,
    kind: ResourceKind,
) -> Result<RemoteResource>
where
    D: PlatformDeployer,
    R: CommandRunner,
{
    let Some(command) = deployer.probe_command(&kind, &ctx.remote) else {
        log::debug!("{} has no listing for {}", deployer.platform(), kind);
        return Ok(RemoteResource::missing(kind, String::new()));
    };

    let raw = ctx.executor().execute_checked(&command).await?.stdout_text();
    let exists = deployer.parse_exists(&kind, &raw);
    log::info!("Probed {}: exists={}", kind, exists);

    let resource = if exists {
        RemoteResource::found(kind, raw)
    } else {
        RemoteResource::missing(kind, raw)
    };
    Ok(resource.in_region(ctx.remote.region.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_follow_kind() {
        let db = RemoteResource::found(ResourceKind::Database("blog-db".into()), "[]");
        assert!(db.exists);
        assert_eq!(db.name, "blog-db");

        let app = RemoteResource::missing(ResourceKind::App, "").in_region(Some("sea".into()));
        assert!(!app.exists);
        assert_eq!(app.name, "app");
        assert_eq!(app.region.as_deref(), Some("sea"));
    }
}
