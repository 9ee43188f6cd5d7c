//! Tunables for resources created on the user's account.
//!
//! Defaults are the smallest plans each platform offers. Every value can be
//! overridden through the environment.

/// Sizes and plans used when creating databases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Fly.io postgres VM size
    pub fly_vm_size: String,

    /// Fly.io postgres volume size in GB
    pub fly_volume_size: u32,

    /// Fly.io postgres initial cluster size
    pub fly_cluster_size: u32,

    /// Heroku Postgres plan
    pub heroku_db_plan: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            fly_vm_size: "shared-cpu-1x".to_string(),
            fly_volume_size: 1,
            fly_cluster_size: 1,
            heroku_db_plan: "essential-0".to_string(),
        }
    }
}

impl ProvisionConfig {
    /// Parse a count, clamped to `[1, max]`
    fn parse_count(value: Option<String>, default: u32, max: u32) -> u32 {
        value
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|v| v.clamp(1, max))
            .unwrap_or(default)
    }

    /// Read a plan/size name; blank values fall back to `default`
    fn parse_name(value: Option<String>, default: &str) -> String {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// Create config from environment variables with fallback to defaults
    pub fn from_env() -> Self {
        let env = |name: &str| std::env::var(name).ok();
        let defaults = Self::default();
        Self {
            fly_vm_size: Self::parse_name(env("SIMPLE_DEPLOY_FLY_VM_SIZE"), &defaults.fly_vm_size),
            fly_volume_size: Self::parse_count(
                env("SIMPLE_DEPLOY_FLY_VOLUME_SIZE"),
                defaults.fly_volume_size,
                500,
            ),
            fly_cluster_size: Self::parse_count(
                env("SIMPLE_DEPLOY_FLY_CLUSTER_SIZE"),
                defaults.fly_cluster_size,
                3,
            ),
            heroku_db_plan: Self::parse_name(
                env("SIMPLE_DEPLOY_HEROKU_DB_PLAN"),
                &defaults.heroku_db_plan,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_clamps() {
        assert_eq!(ProvisionConfig::parse_count(Some("99".into()), 1, 3), 3);
        assert_eq!(ProvisionConfig::parse_count(Some("0".into()), 1, 3), 1);
        assert_eq!(ProvisionConfig::parse_count(Some(" 2 ".into()), 1, 3), 2);
    }

    #[test]
    fn test_count_invalid_uses_default() {
        assert_eq!(ProvisionConfig::parse_count(Some("lots".into()), 2, 3), 2);
        assert_eq!(ProvisionConfig::parse_count(None, 2, 3), 2);
    }

    #[test]
    fn test_name_blank_uses_default() {
        assert_eq!(
            ProvisionConfig::parse_name(Some("   ".into()), "essential-0"),
            "essential-0"
        );
        assert_eq!(
            ProvisionConfig::parse_name(Some(" standard-0 ".into()), "essential-0"),
            "standard-0"
        );
    }

    #[test]
    fn test_defaults_are_smallest_plans() {
        let config = ProvisionConfig::default();
        assert_eq!(config.fly_vm_size, "shared-cpu-1x");
        assert_eq!(config.fly_volume_size, 1);
        assert_eq!(config.heroku_db_plan, "essential-0");
    }
}
