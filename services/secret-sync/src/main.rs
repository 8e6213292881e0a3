//! secret-sync binary
//!
//! Usage: `secret-sync [CONFIG_DIR]` (default `config`)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secret_sync::{Outcome, Reconciler, apply_all};
use tracing::info;
use vsync_adapter_vault::{Authenticator, ClientSettingsBuilder, HttpClient, ReqwestClient};
use vsync_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config_dir = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let config = AppConfig::load(&config_dir)
        .with_context(|| format!("failed to load config from {}", config_dir))?;

    // 初始化 tracing
    vsync_telemetry::init(&config.telemetry.log_level, config.json_logs());

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        resources = config.resources.len(),
        "Runtime initialized"
    );

    let settings = ClientSettingsBuilder::new()
        .with_timeout(config.store.timeout_secs)
        .with_connect_timeout(config.store.connect_timeout_secs)
        .build();
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&settings)?);

    let authenticator = match config.store.credential_cache_ttl_secs {
        Some(ttl) => Authenticator::with_cache(Duration::from_secs(ttl)),
        None => Authenticator::new(),
    };
    let reconciler = Reconciler::new(http).with_authenticator(authenticator);

    let report = apply_all(&reconciler, &config.resources).await;

    info!(
        created = report.count(Outcome::Created),
        updated = report.count(Outcome::Updated),
        deleted = report.count(Outcome::Deleted),
        unchanged = report.count(Outcome::Unchanged),
        failed = report.failed(),
        "Sync finished"
    );

    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} secrets failed to reconcile",
            report.failed(),
            report.resources.len()
        );
    }

    Ok(())
}
