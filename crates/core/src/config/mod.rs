//! 配置管理
//!
//! 加载顺序：
//! 1. 默认配置（每个配置段都有默认值）
//! 2. TOML配置文件（显式路径或默认搜索路径）
//! 3. 环境变量覆盖（前缀 `SCHEDULER_`，层级分隔符 `__`）
//!
//! ```rust,ignore
//! use scheduler_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/scheduler.toml"))?;
//! let policy = config.scheduler.retry_policy();
//! ```

pub mod models;

pub use models::*;

#[cfg(test)]
mod tests;
