//! vsync-telemetry - 可观测性库

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 按配置选择输出格式
pub fn init(log_level: &str, json: bool) {
    if json {
        init_tracing_json(log_level);
    } else {
        init_tracing(log_level);
    }
}
