//! Fly.io through `flyctl`.

use super::{add_file, add_settings_block};
use crate::deploy::context::{DeploymentContext, RemoteFacts};
use crate::deploy::files::Template;
use crate::deploy::gate::ConfirmationRequest;
use crate::deploy::probe::{ResourceKind, probe};
use crate::deploy::{Platform, PlatformDeployer};
use crate::error::{DeployError, PlatformError, Result};
use crate::parse::fly;
use crate::shell::{CommandRunner, install_hint};
use serde_json::json;

const SETTINGS_MARKER: &str = r#"if os.environ.get("ON_FLYIO"):"#;

const CANCEL: &str = "\
Okay, cancelling Fly.io configuration and deployment.

You may want to try again, or deploy to a different platform.";

const PRELIMINARY: &str = "\
Support for Fly.io is in a preliminary phase.

This will create a Postgres database on your Fly.io account, set a secret on
your app, and add configuration files to your project. Fly.io may charge for
the resources created. Please review the generated files before deploying.";

const AUTOMATE_ALL: &str = "\
The --automate-all flag means simple_deploy will:
- Find the Fly.io app you created and create a Postgres database for it.
- Configure your project for deployment on Fly.io.
- Commit all changes to your project that are necessary for deployment.
- Push these changes to Fly.io.
- Open your deployed project in a new browser tab.";

/// Deploys to Fly.io
#[derive(Debug, Clone, Copy, Default)]
pub struct FlyDeployer;

impl FlyDeployer {
    fn db_name(app: &str) -> String {
        format!("{}-db", app)
    }
}

impl PlatformDeployer for FlyDeployer {
    fn platform(&self) -> Platform {
        Platform::FlyIo
    }

    fn cli(&self) -> &'static str {
        "flyctl"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        &["gunicorn", "psycopg2-binary", "dj-database-url"]
    }

    fn cancel_message(&self) -> &'static str {
        CANCEL
    }

    fn automate_all_message(&self) -> &'static str {
        AUTOMATE_ALL
    }

    fn preliminary_notice(&self) -> Option<&'static str> {
        Some(PRELIMINARY)
    }

    fn default_region(&self) -> &'static str {
        "sea"
    }

    /// A `flyctl` that cannot report its version is treated as not installed
    async fn validate_cli<R: CommandRunner>(&self, ctx: &DeploymentContext<R>) -> Result<()> {
        ctx.executor().ensure_installed(self.cli())?;
        let result = ctx.executor().execute("flyctl version").await?;
        if !result.success() {
            return Err(DeployError::Platform(PlatformError::ToolNotInstalled {
                tool: self.cli().to_string(),
                install_hint: install_hint(self.cli()).to_string(),
            }));
        }
        Ok(())
    }

    async fn resolve_identity<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        ctx.write_output("\nLooking for Fly.io app to deploy against...");
        let command = "flyctl apps list";
        let output = ctx.executor().execute_checked(command).await?.stdout_text();

        let candidates = fly::undeployed_apps(&output);
        if candidates.len() > 1 {
            let _ = ctx.output().warn(&format!(
                "Found {} undeployed apps ({}); using the last one listed.",
                candidates.len(),
                candidates.join(", ")
            ));
        }

        match fly::undeployed_app_name(&output) {
            Some(app) => {
                ctx.write_output(&format!("  Found Fly.io app: {}", app));
                Ok(app)
            }
            None => Err(DeployError::Platform(PlatformError::ResourceNotFound {
                resource: "undeployed Fly.io app".to_string(),
                command: command.to_string(),
                remediation: "Create an app with `flyctl apps create --generate-name`".to_string(),
            })),
        }
    }

    async fn resolve_region<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        ctx.write_output("Looking for Fly.io region...");
        let command = format!("flyctl regions list -a {}", ctx.app_name()?);
        let output = ctx.executor().execute_checked(&command).await?.stdout_text();

        fly::region(&output).ok_or_else(|| {
            DeployError::Platform(PlatformError::ResourceNotFound {
                resource: "Fly.io region".to_string(),
                command,
                remediation: "Check the app's region with `flyctl regions list`".to_string(),
            })
        })
    }

    async fn provision_database<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        ctx.write_output("Looking for a Postgres database...");
        let app = ctx.app_name()?.to_string();
        let db_name = Self::db_name(&app);

        let database = probe(self, ctx, ResourceKind::Database(db_name.clone())).await?;
        if database.exists {
            ctx.write_output(&format!("  Found Postgres database: {}", db_name));
        } else {
            let region = ctx
                .remote
                .region
                .clone()
                .unwrap_or_else(|| self.default_region().to_string());
            let p = &ctx.provision;
            let command = format!(
                "flyctl postgres create --name {} --region {} --initial-cluster-size {} --vm-size {} --volume-size {}",
                db_name, region, p.fly_cluster_size, p.fly_vm_size, p.fly_volume_size
            );

            ctx.require_confirmation(
                &ConfirmationRequest::with_command(
                    "A Postgres database is required to continue with deployment. \
                     If you confirm this, the following command will be run to create a \
                     new database on your account:",
                    &command,
                ),
                CANCEL,
            )?;

            ctx.write_output("  Creating database...");
            let output = ctx.output();
            ctx.executor()
                .execute_streaming(&command, |line| {
                    let _ = output.println(line);
                })
                .await?;
            ctx.write_output("  Created Postgres database.");
        }

        let secrets = probe(self, ctx, ResourceKind::Secret("DATABASE_URL".to_string())).await?;
        if secrets.exists {
            ctx.write_output("  Database is already attached to the app.");
        } else {
            ctx.write_output("  Attaching database to Fly.io app...");
            let command = format!("flyctl postgres attach --app {} {}", app, db_name);
            ctx.executor().execute_checked(&command).await?;
            ctx.write_output("  Attached database to app.");
        }

        ctx.remote.db_name = Some(db_name);
        Ok(())
    }

    async fn configure_secrets<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        let secret = probe(self, ctx, ResourceKind::Secret("ON_FLYIO".to_string())).await?;
        if secret.exists {
            ctx.write_output("  Found secret ON_FLYIO.");
            return Ok(());
        }

        let command = format!("flyctl secrets set -a {} ON_FLYIO=1", ctx.app_name()?);
        ctx.executor().execute_checked(&command).await?;
        ctx.write_output("  Set secret ON_FLYIO=1.");
        Ok(())
    }

    fn generate_config_files<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        let app = ctx.app_name()?.to_string();
        let data = json!({
            "project_name": ctx.project.project_name,
            "deployed_project_name": app,
            "region": ctx.remote.region.clone().unwrap_or_else(|| self.default_region().to_string()),
            "dependency_kind": ctx.project.manifest.kind().template_key(),
            "ignored_dirs": ["venv", ".venv", "ll_env"],
        });

        add_file(ctx, "Dockerfile", &Template::FlyDockerfile.render(&data)?)?;
        add_file(ctx, ".dockerignore", &Template::FlyDockerignore.render(&data)?)?;
        add_file(ctx, "fly.toml", &Template::FlyToml.render(&data)?)?;
        add_settings_block(ctx, SETTINGS_MARKER, &Template::FlySettings.render(&data)?)?;
        Ok(())
    }

    fn probe_command(&self, kind: &ResourceKind, facts: &RemoteFacts) -> Option<String> {
        match kind {
            ResourceKind::App => Some("flyctl apps list".to_string()),
            ResourceKind::Database(_) => Some("flyctl postgres list --json".to_string()),
            ResourceKind::Secret(_) => facts
                .app_name
                .as_ref()
                .map(|app| format!("flyctl secrets list -a {} --json", app)),
        }
    }

    fn parse_exists(&self, kind: &ResourceKind, output: &str) -> bool {
        match kind {
            ResourceKind::App => !fly::undeployed_apps(output).is_empty(),
            ResourceKind::Database(name) => fly::postgres_cluster_exists(output, name),
            ResourceKind::Secret(name) => fly::secret_is_set(output, name),
        }
    }

    fn deploy_command(&self) -> &'static str {
        "flyctl deploy"
    }

    async fn fetch_url<R: CommandRunner>(
        &self,
        ctx: &DeploymentContext<R>,
    ) -> Result<Option<String>> {
        let command = format!("flyctl info -a {}", ctx.app_name()?);
        let output = ctx.executor().execute_checked(&command).await?.stdout_text();
        Ok(fly::hostname(&output).map(|host| format!("https://{}", host)))
    }

    fn next_steps(&self, facts: &RemoteFacts) -> Vec<String> {
        let mut steps = vec![
            "Commit the changes: git add . && git commit -am \"Configured for deployment.\""
                .to_string(),
            "Push your project to Fly.io: flyctl deploy".to_string(),
        ];
        if let Some(app) = &facts.app_name {
            steps.push(format!("Visit your project: https://{}.fly.dev", app));
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_probe_needs_app_name() {
        let facts = RemoteFacts::default();
        assert_eq!(
            FlyDeployer.probe_command(&ResourceKind::Secret("ON_FLYIO".into()), &facts),
            None
        );

        let facts = RemoteFacts {
            app_name: Some("blog-8711".into()),
            ..RemoteFacts::default()
        };
        assert_eq!(
            FlyDeployer
                .probe_command(&ResourceKind::Secret("ON_FLYIO".into()), &facts)
                .as_deref(),
            Some("flyctl secrets list -a blog-8711 --json")
        );
    }

    #[test]
    fn test_database_probe_matches_by_name() {
        let kind = ResourceKind::Database("blog-db".into());
        assert!(FlyDeployer.parse_exists(&kind, r#"[{"Name":"blog-db"}]"#));
        assert!(!FlyDeployer.parse_exists(&kind, r#"[{"Name":"shop-db"}]"#));
        assert!(!FlyDeployer.parse_exists(&kind, "No postgres clusters found\n"));
    }

    #[test]
    fn test_settings_marker_is_in_template() {
        let block = Template::FlySettings
            .render(&json!({"deployed_project_name": "blog-8711"}))
            .unwrap();
        assert!(block.lines().any(|line| line == SETTINGS_MARKER));
        assert!(block.contains("blog-8711.fly.dev"));
    }

    #[test]
    fn test_next_steps_name_the_app() {
        let facts = RemoteFacts {
            app_name: Some("blog-8711".into()),
            ..RemoteFacts::default()
        };
        let steps = FlyDeployer.next_steps(&facts);
        assert!(steps.iter().any(|s| s.contains("flyctl deploy")));
        assert!(steps.iter().any(|s| s.contains("https://blog-8711.fly.dev")));
    }
}
