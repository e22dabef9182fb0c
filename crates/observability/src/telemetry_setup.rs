use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduler_core::config::ObservabilityConfig;

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(anyhow::anyhow!("无效的日志格式: {}", other)),
        }
    }
}

/// 初始化全局 tracing subscriber
///
/// `RUST_LOG` 优先于 `level`。重复初始化会返回错误。
pub fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true);
            registry.with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(false);
            registry.with(fmt_layer).try_init()?;
        }
    }

    info!(logging.format = ?format, logging.level = level, "日志系统初始化完成");

    Ok(())
}

pub fn init_from_config(config: &ObservabilityConfig) -> Result<()> {
    let format = config.log_format.parse()?;
    init_tracing(&config.log_level, format)
}
