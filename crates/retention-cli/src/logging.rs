//! tracing-subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// RUST_LOG wins; otherwise the configured level plus optional directives.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = config.level.as_str();

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{base_level},{filter}");
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        EnvFilter::new(base_level)
    }
}

pub fn init(config: &LoggingConfig) {
    // 二重初期化（テストなど）は無視する
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
