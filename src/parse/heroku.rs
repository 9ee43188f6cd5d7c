//! Parsers for `heroku` CLI `--json` output.

use serde::Deserialize;
use serde_json::Value;

/// Add-on service that provides Heroku Postgres
pub const POSTGRES_ADDON: &str = "heroku-postgresql";

/// App facts from `heroku apps:info --json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HerokuApp {
    /// App name
    pub name: String,
    /// Region name, e.g. `us`
    pub region: Option<String>,
    /// Public URL
    pub web_url: Option<String>,
}

#[derive(Deserialize)]
struct AppsInfo {
    app: AppInfo,
}

#[derive(Deserialize)]
struct AppInfo {
    name: String,
    region: Option<NamedRef>,
    web_url: Option<String>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize)]
struct Addon {
    addon_service: NamedRef,
}

/// Parse `heroku apps:info --json`; `None` when no app is linked
pub fn app_info(output: &str) -> Option<HerokuApp> {
    let info: AppsInfo = serde_json::from_str(output.trim()).ok()?;
    Some(HerokuApp {
        name: info.app.name,
        region: info.app.region.map(|r| r.name),
        web_url: info.app.web_url,
    })
}

/// Whether `heroku addons --json` lists a Heroku Postgres add-on
pub fn has_postgres_addon(output: &str) -> bool {
    serde_json::from_str::<Vec<Addon>>(output.trim())
        .map(|addons| {
            addons
                .iter()
                .any(|addon| addon.addon_service.name == POSTGRES_ADDON)
        })
        .unwrap_or(false)
}

/// Whether `heroku config --json` contains `key`
pub fn config_has(output: &str, key: &str) -> bool {
    match serde_json::from_str::<Value>(output.trim()) {
        Ok(Value::Object(vars)) => vars.contains_key(key),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_info() {
        let out = r#"{
            "addons": [],
            "app": {
                "name": "frozen-lake-12345",
                "region": {"id": "59accabd", "name": "us"},
                "web_url": "https://frozen-lake-12345.herokuapp.com/"
            },
            "dynos": []
        }"#;
        assert_eq!(
            app_info(out),
            Some(HerokuApp {
                name: "frozen-lake-12345".to_string(),
                region: Some("us".to_string()),
                web_url: Some("https://frozen-lake-12345.herokuapp.com/".to_string()),
            })
        );
    }

    #[test]
    fn test_app_info_not_linked() {
        assert_eq!(
            app_info(" ▸    Missing required flag app\n ▸    Specify an app with --app"),
            None
        );
    }

    #[test]
    fn test_postgres_addon() {
        let out = r#"[{"addon_service": {"name": "heroku-postgresql"}, "plan": {"name": "heroku-postgresql:essential-0"}}]"#;
        assert!(has_postgres_addon(out));
        assert!(!has_postgres_addon("[]"));
        assert!(!has_postgres_addon("No add-ons for app"));
    }

    #[test]
    fn test_config_has() {
        let out = r#"{"ON_HEROKU": "1", "DATABASE_URL": "postgres://x"}"#;
        assert!(config_has(out, "ON_HEROKU"));
        assert!(!config_has(out, "SECRET_KEY"));
        assert!(!config_has("not json", "ON_HEROKU"));
    }
}
