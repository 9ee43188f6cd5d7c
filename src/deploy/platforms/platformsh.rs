//! Platform.sh through the `platform` CLI.
//!
//! The database is a service declared in `.platform/services.yaml`, so nothing
//! is created remotely and no secrets are needed: settings read credentials
//! through `platformshconfig` at runtime.

use super::{add_file, add_settings_block};
use crate::deploy::context::{DeploymentContext, RemoteFacts};
use crate::deploy::files::Template;
use crate::deploy::probe::ResourceKind;
use crate::deploy::{Platform, PlatformDeployer};
use crate::error::{DeployError, PlatformError, Result};
use crate::parse::platformsh;
use crate::shell::CommandRunner;
use serde_json::json;

const SETTINGS_MARKER: &str = "if config.is_valid_platform():";

const PROJECT_INFO: &str = "platform project:info --yes";

/// Service name declared in services.yaml
const DB_SERVICE: &str = "db";

const CANCEL: &str = "\
Okay, cancelling Platform.sh configuration and deployment.";

const AUTOMATE_ALL: &str = "\
The --automate-all flag means simple_deploy will:
- Use the Platform.sh project linked to this directory.
- Configure your project for deployment on Platform.sh.
- Commit all changes to your project that are necessary for deployment.
- Push these changes to Platform.sh.
- Open your deployed project in a new browser tab.";

/// Deploys to Platform.sh
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformShDeployer;

impl PlatformShDeployer {
    /// `platform project:info` output; a non-zero exit means no project is linked
    async fn project_info<R: CommandRunner>(ctx: &DeploymentContext<R>) -> Result<String> {
        let result = ctx.executor().execute(PROJECT_INFO).await?;
        if !result.success() {
            return Err(Self::missing("a Platform.sh project linked to this directory"));
        }
        Ok(result.stdout_text())
    }

    fn missing(resource: &str) -> DeployError {
        DeployError::Platform(PlatformError::ResourceNotFound {
            resource: resource.to_string(),
            command: PROJECT_INFO.to_string(),
            remediation: "Create a project with `platform create`, or link this directory with `platform project:set-remote`"
                .to_string(),
        })
    }
}

impl PlatformDeployer for PlatformShDeployer {
    fn platform(&self) -> Platform {
        Platform::PlatformSh
    }

    fn cli(&self) -> &'static str {
        "platform"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        &["platformshconfig", "gunicorn", "psycopg2"]
    }

    fn cancel_message(&self) -> &'static str {
        CANCEL
    }

    fn automate_all_message(&self) -> &'static str {
        AUTOMATE_ALL
    }

    fn default_region(&self) -> &'static str {
        "us-3.platform.sh"
    }

    async fn resolve_identity<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        ctx.write_output("\nLooking for Platform.sh project...");
        let output = Self::project_info(ctx).await?;
        let title =
            platformsh::project_property(&output, "title").ok_or_else(|| Self::missing("Platform.sh project title"))?;
        ctx.remote.region = platformsh::project_property(&output, "region");
        Ok(title)
    }

    /// Region comes from the same `project:info` table as the title
    async fn resolve_region<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        ctx.remote.region.clone().ok_or_else(|| Self::missing("Platform.sh project region"))
    }

    async fn provision_database<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        ctx.write_output("  Postgres is declared in .platform/services.yaml.");
        ctx.remote.db_name = Some(DB_SERVICE.to_string());
        Ok(())
    }

    async fn configure_secrets<R: CommandRunner>(
        &self,
        _ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        Ok(())
    }

    fn generate_config_files<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        let data = json!({
            "project_name": ctx.project.project_name,
            "dependency_kind": ctx.project.manifest.kind().template_key(),
        });

        add_file(ctx, ".platform.app.yaml", &Template::PlatformShApp.render(&data)?)?;
        add_file(ctx, ".platform/routes.yaml", &Template::PlatformShRoutes.render(&data)?)?;
        add_file(ctx, ".platform/services.yaml", &Template::PlatformShServices.render(&data)?)?;
        add_settings_block(ctx, SETTINGS_MARKER, &Template::PlatformShSettings.render(&data)?)?;
        Ok(())
    }

    fn probe_command(&self, kind: &ResourceKind, _facts: &RemoteFacts) -> Option<String> {
        match kind {
            ResourceKind::App => Some(PROJECT_INFO.to_string()),
            ResourceKind::Database(_) | ResourceKind::Secret(_) => None,
        }
    }

    fn parse_exists(&self, kind: &ResourceKind, output: &str) -> bool {
        match kind {
            ResourceKind::App => platformsh::project_property(output, "title").is_some(),
            ResourceKind::Database(_) | ResourceKind::Secret(_) => false,
        }
    }

    fn deploy_command(&self) -> &'static str {
        "platform push --yes"
    }

    async fn fetch_url<R: CommandRunner>(
        &self,
        ctx: &DeploymentContext<R>,
    ) -> Result<Option<String>> {
        let output = ctx
            .executor()
            .execute_checked("platform url --yes")
            .await?
            .stdout_text();
        Ok(platformsh::project_url(&output))
    }

    fn next_steps(&self, _facts: &RemoteFacts) -> Vec<String> {
        vec![
            "Commit the changes: git add . && git commit -am \"Configured for deployment.\""
                .to_string(),
            "Push your project to Platform.sh: platform push".to_string(),
            "Open your project: platform url".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_remote_database_or_secret_listing() {
        let facts = RemoteFacts::default();
        assert!(
            PlatformShDeployer
                .probe_command(&ResourceKind::Database("db".into()), &facts)
                .is_none()
        );
        assert!(
            PlatformShDeployer
                .probe_command(&ResourceKind::Secret("X".into()), &facts)
                .is_none()
        );
    }

    #[test]
    fn test_app_yaml_uses_poetry_when_detected() {
        let rendered = Template::PlatformShApp
            .render(&json!({"project_name": "blog", "dependency_kind": "poetry"}))
            .unwrap();
        assert!(rendered.contains("poetry install --no-root"));
        assert!(rendered.contains("poetry run gunicorn"));
        assert!(rendered.contains("blog.wsgi:application"));
    }

    #[test]
    fn test_routes_keep_placeholder_braces() {
        let rendered = Template::PlatformShRoutes
            .render(&json!({"project_name": "blog"}))
            .unwrap();
        assert!(rendered.contains("\"https://{default}/\":"));
        assert!(rendered.contains("upstream: \"blog:http\""));
    }
}
