use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::ledger::DEFAULT_OP_TIMEOUT_MS;

/// Built-in signing secret, only acceptable for the `dev` environment
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Also show span events for the HTTP trace layer
    #[serde(default)]
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; the ledger runs in memory when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expires_hours: 24,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Budget for one ledger unit of work, store round-trips included
    pub op_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Read `config/{env}.yaml` and apply environment overrides
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.check_secrets(env)?;
        Ok(config)
    }

    /// Outside `dev` the JWT secret must be set and must not be the built-in one
    pub fn check_secrets(&self, env: &str) -> anyhow::Result<()> {
        if env == "dev" {
            return Ok(());
        }
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() || secret == DEV_JWT_SECRET {
            anyhow::bail!(
                "JWT secret is not configured for env '{}': set JWT_SECRET or auth.jwt_secret",
                env
            );
        }
        Ok(())
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// `DATABASE_URL`, `JWT_SECRET` and `PORT` win over file values
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.postgres_url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.gateway.port = port
                .parse()
                .with_context(|| format!("Invalid PORT: {}", port))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: memo_credits.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
"#;

    #[test]
    fn test_defaults_for_optional_sections() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert!(config.postgres_url.is_none());
        assert!(!config.enable_tracing);
        assert_eq!(config.auth.jwt_expires_hours, 24);
        assert_eq!(config.ledger.op_timeout_ms, DEFAULT_OP_TIMEOUT_MS);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = format!(
            "{}postgres_url: postgresql://a@b/c\nauth:\n  jwt_secret: s3\n  jwt_expires_hours: 2\nledger:\n  op_timeout_ms: 250\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.postgres_url.as_deref(), Some("postgresql://a@b/c"));
        assert_eq!(config.auth.jwt_secret, "s3");
        assert_eq!(config.ledger.op_timeout_ms, 250);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgresql://env/db"),
            ("JWT_SECRET", "from-env"),
            ("PORT", "9090"),
        ]
        .into_iter()
        .collect();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.postgres_url.as_deref(), Some("postgresql://env/db"));
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.gateway.port, 9090);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        config
            .apply_env_overrides(|_| Some(String::new()))
            .unwrap();
        assert!(config.postgres_url.is_none());
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        let result = config.apply_env_overrides(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_secret_rejected_outside_dev() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert!(config.check_secrets("dev").is_ok());
        assert!(config.check_secrets("prod").is_err());

        config.auth.jwt_secret = "  ".to_string();
        assert!(config.check_secrets("prod").is_err());

        config
            .apply_env_overrides(|k| (k == "JWT_SECRET").then(|| "a-real-secret".to_string()))
            .unwrap();
        assert!(config.check_secrets("prod").is_ok());
    }

    #[test]
    fn test_prod_file_requires_secret_from_env() {
        let content = fs::read_to_string("config/prod.yaml").unwrap();
        let config = AppConfig::from_yaml(&content).unwrap();
        assert!(config.check_secrets("prod").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load("does-not-exist").is_err());
    }
}
