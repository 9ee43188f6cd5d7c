//! Heroku through the `heroku` CLI.

use super::{add_file, add_settings_block};
use crate::deploy::context::{DeploymentContext, RemoteFacts};
use crate::deploy::files::Template;
use crate::deploy::gate::ConfirmationRequest;
use crate::deploy::probe::{ResourceKind, probe};
use crate::deploy::{Platform, PlatformDeployer};
use crate::error::{DeployError, PlatformError, Result};
use crate::parse::heroku;
use crate::shell::CommandRunner;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;

const SETTINGS_MARKER: &str = "if 'ON_HEROKU' in os.environ:";
const SECRET_KEY_LEN: usize = 50;

const CANCEL: &str = "\
Okay, cancelling Heroku configuration and deployment.";

const AUTOMATE_ALL: &str = "\
The --automate-all flag means simple_deploy will:
- Use the Heroku app linked to this directory and add a Postgres database.
- Configure your project for deployment on Heroku.
- Commit all changes to your project that are necessary for deployment.
- Push these changes to Heroku.
- Open your deployed project in a new browser tab.";

const PLACEHOLDER: &str =
    "This is a placeholder file to make sure this folder is pushed to Heroku.\n";

const APPS_INFO: &str = "heroku apps:info --json";

/// Deploys to Heroku
#[derive(Debug, Clone, Copy, Default)]
pub struct HerokuDeployer;

impl HerokuDeployer {
    /// The linked app; a failing or unreadable `apps:info` means there is none
    async fn app<R: CommandRunner>(ctx: &DeploymentContext<R>) -> Result<heroku::HerokuApp> {
        let result = ctx.executor().execute(APPS_INFO).await?;
        let app = if result.success() {
            heroku::app_info(&result.stdout_text())
        } else {
            None
        };
        app.ok_or_else(|| {
            DeployError::Platform(PlatformError::ResourceNotFound {
                resource: "Heroku app".to_string(),
                command: APPS_INFO.to_string(),
                remediation: "Create an app with `heroku create`".to_string(),
            })
        })
    }

    fn secret_key() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_KEY_LEN)
            .map(char::from)
            .collect()
    }
}

impl PlatformDeployer for HerokuDeployer {
    fn platform(&self) -> Platform {
        Platform::Heroku
    }

    fn cli(&self) -> &'static str {
        "heroku"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        &["gunicorn", "psycopg2", "dj-database-url", "whitenoise"]
    }

    fn cancel_message(&self) -> &'static str {
        CANCEL
    }

    fn automate_all_message(&self) -> &'static str {
        AUTOMATE_ALL
    }

    fn default_region(&self) -> &'static str {
        "us"
    }

    async fn resolve_identity<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        ctx.write_output("\nLooking for Heroku app to deploy against...");
        let app = Self::app(ctx).await?;
        ctx.write_output(&format!("  Found Heroku app: {}", app.name));
        ctx.remote.region = app.region;
        Ok(app.name)
    }

    /// Region was read from `apps:info` along with the app name
    async fn resolve_region<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<String> {
        Ok(ctx
            .remote
            .region
            .clone()
            .unwrap_or_else(|| self.default_region().to_string()))
    }

    async fn provision_database<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        ctx.write_output("Looking for a Postgres database...");
        let database =
            probe(self, ctx, ResourceKind::Database(heroku::POSTGRES_ADDON.to_string())).await?;

        if database.exists {
            ctx.write_output("  Found Heroku Postgres add-on.");
        } else {
            let command = format!(
                "heroku addons:create heroku-postgresql:{}",
                ctx.provision.heroku_db_plan
            );
            ctx.require_confirmation(
                &ConfirmationRequest::with_command(
                    "A Postgres database is required to continue with deployment. \
                     If you confirm this, the following command will be run to add \
                     Heroku Postgres to your app:",
                    &command,
                ),
                CANCEL,
            )?;
            ctx.executor().execute_checked(&command).await?;
            ctx.write_output("  Added Heroku Postgres.");
        }

        ctx.remote.db_name = Some(heroku::POSTGRES_ADDON.to_string());
        Ok(())
    }

    async fn configure_secrets<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        // One listing answers for every config var.
        let listing = probe(self, ctx, ResourceKind::Secret("SECRET_KEY".to_string())).await?;
        for name in ["ON_HEROKU", "DEBUG", "SECRET_KEY"] {
            if self.parse_exists(&ResourceKind::Secret(name.to_string()), &listing.raw) {
                ctx.write_output(&format!("  Found config var {}.", name));
                continue;
            }

            let value = match name {
                "ON_HEROKU" => "1".to_string(),
                "DEBUG" => "FALSE".to_string(),
                _ => Self::secret_key(),
            };
            let result = ctx
                .executor()
                .execute_checked(&format!("heroku config:set {}={}", name, value))
                .await?;
            // The CLI echoes `SECRET_KEY: <value>`; the run log redacts it.
            log::debug!("heroku config:set {} exited with {}", name, result.exit_code);
            ctx.write_console(&format!("  Set config var {}.", name));
        }
        Ok(())
    }

    fn generate_config_files<R: CommandRunner>(
        &self,
        ctx: &mut DeploymentContext<R>,
    ) -> Result<()> {
        let data = json!({
            "project_name": ctx.project.project_name,
            "deployed_project_name": ctx.app_name()?,
        });

        add_file(ctx, "Procfile", &Template::HerokuProcfile.render(&data)?)?;
        add_file(ctx, "static/placeholder.txt", PLACEHOLDER)?;
        add_settings_block(ctx, SETTINGS_MARKER, &Template::HerokuSettings.render(&data)?)?;
        Ok(())
    }

    fn probe_command(&self, kind: &ResourceKind, _facts: &RemoteFacts) -> Option<String> {
        let command = match kind {
            ResourceKind::App => APPS_INFO,
            ResourceKind::Database(_) => "heroku addons --json",
            ResourceKind::Secret(_) => "heroku config --json",
        };
        Some(command.to_string())
    }

    fn parse_exists(&self, kind: &ResourceKind, output: &str) -> bool {
        match kind {
            ResourceKind::App => heroku::app_info(output).is_some(),
            ResourceKind::Database(_) => heroku::has_postgres_addon(output),
            ResourceKind::Secret(name) => heroku::config_has(output, name),
        }
    }

    fn deploy_command(&self) -> &'static str {
        "git push heroku main"
    }

    async fn fetch_url<R: CommandRunner>(
        &self,
        ctx: &DeploymentContext<R>,
    ) -> Result<Option<String>> {
        Ok(Self::app(ctx).await?.web_url)
    }

    fn next_steps(&self, _facts: &RemoteFacts) -> Vec<String> {
        vec![
            "Commit the changes: git add . && git commit -am \"Configured for deployment.\""
                .to_string(),
            "Push your project to Heroku: git push heroku main".to_string(),
            "Migrate the database: heroku run python manage.py migrate".to_string(),
            "Open your project: heroku open".to_string(),
        ]
    }
}
