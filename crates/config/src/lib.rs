//! vsync-config - 配置加载库
//!
//! 合并顺序：`default.toml` → `{APP_ENV}.toml` → `SECRET_SYNC_*` 环境变量

use std::fmt;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "SECRET_SYNC_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// JSON log lines; forced on in production
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// Secret store 客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Reuse a login token for this long. Unset means every operation
    /// authenticates again.
    #[serde(default)]
    pub credential_cache_ttl_secs: Option<u64>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            credential_cache_ttl_secs: None,
        }
    }
}

/// One managed secret, as written by the operator.
///
/// Fields are kept loosely typed here; they are validated into a
/// `SecretResource` before anything talks to the store.
#[derive(Clone, Deserialize)]
pub struct ResourceParams {
    pub secret_fqdn: String,
    #[serde(default = "default_ensure")]
    pub ensure: String,
    pub url: String,
    pub auth: serde_json::Value,
    #[serde(default)]
    pub secret: Option<serde_json::Value>,
    #[serde(default = "default_update")]
    pub update: bool,
}

fn default_ensure() -> String {
    "present".to_string()
}

fn default_update() -> bool {
    true
}

impl fmt::Debug for ResourceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceParams")
            .field("secret_fqdn", &self.secret_fqdn)
            .field("ensure", &self.ensure)
            .field("url", &self.url)
            .field("auth", &"[REDACTED]")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("update", &self.update)
            .finish()
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub resources: Vec<ResourceParams>,
}

fn default_app_name() -> String {
    "secret-sync".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        let config: Self = Self::figment(config_dir, &env).extract()?;

        Ok(config)
    }

    fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否输出 JSON 日志
    pub fn json_logs(&self) -> bool {
        self.telemetry.json || self.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const DEFAULT_TOML: &str = r#"
        app_name = "secret-sync"

        [store]
        timeout_secs = 5

        [[resources]]
        secret_fqdn = "secret/foo"
        url = "http://127.0.0.1:8200"
        auth = { type = "token", token = "c38e2dca" }
        secret = { value1 = "bar1", value2 = "bar2" }

        [[resources]]
        secret_fqdn = "secret/old"
        ensure = "absent"
        url = "http://127.0.0.1:8200"
        auth = { type = "approle", role_id = "r1", secret_id = "s1" }
        update = false
    "#;

    #[test]
    fn test_load_defaults_and_resources() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", DEFAULT_TOML)?;
            let config = AppConfig::load(".").map_err(|e| e.to_string())?;

            assert_eq!(config.app_env, "development");
            assert_eq!(config.telemetry.log_level, "info");
            assert_eq!(config.store.timeout_secs, 5);
            assert_eq!(config.store.connect_timeout_secs, 10);
            assert!(config.store.credential_cache_ttl_secs.is_none());
            assert_eq!(config.resources.len(), 2);

            let foo = &config.resources[0];
            assert_eq!(foo.ensure, "present");
            assert!(foo.update);
            assert_eq!(foo.auth["type"], "token");
            assert_eq!(foo.secret.as_ref().unwrap()["value1"], "bar1");

            let old = &config.resources[1];
            assert_eq!(old.ensure, "absent");
            assert!(!old.update);
            assert!(old.secret.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_env_file_and_variables_override() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", DEFAULT_TOML)?;
            jail.create_file(
                "production.toml",
                r#"
                app_env = "production"
                [telemetry]
                log_level = "warn"
                "#,
            )?;
            jail.set_env("APP_ENV", "production");
            jail.set_env("SECRET_SYNC_STORE__CREDENTIAL_CACHE_TTL_SECS", "60");

            let config = AppConfig::load(".").map_err(|e| e.to_string())?;
            assert!(config.is_production());
            assert!(config.json_logs());
            assert_eq!(config.telemetry.log_level, "warn");
            assert_eq!(config.store.credential_cache_ttl_secs, Some(60));
            Ok(())
        });
    }

    #[test]
    fn test_debug_redacts_credentials() {
        Jail::expect_with(|jail| {
            jail.create_file("default.toml", DEFAULT_TOML)?;
            let config = AppConfig::load(".").map_err(|e| e.to_string())?;
            let debug_output = format!("{:?}", config);
            assert!(!debug_output.contains("c38e2dca"));
            assert!(!debug_output.contains("bar1"));
            assert!(debug_output.contains("[REDACTED]"));
            Ok(())
        });
    }
}
