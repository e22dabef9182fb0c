use serde::{Deserialize, Serialize};

/// 性能告警阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 成功率下限（百分比）
    pub success_rate_threshold: f64,
    /// 失败率上限（百分比）
    pub failure_rate_threshold: f64,
    /// 平均执行时间上限（毫秒）
    pub average_time_threshold_ms: f64,
    /// 负载分布变异系数上限（百分比）
    pub distribution_balance_threshold: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            success_rate_threshold: 90.0,
            failure_rate_threshold: 10.0,
            average_time_threshold_ms: 100.0,
            distribution_balance_threshold: 50.0,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("成功率阈值", self.success_rate_threshold),
            ("失败率阈值", self.failure_rate_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(anyhow::anyhow!("{}必须在0到100之间: {}", name, value));
            }
        }

        if self.average_time_threshold_ms < 0.0 {
            return Err(anyhow::anyhow!("平均执行时间阈值不能为负数"));
        }

        if self.distribution_balance_threshold < 0.0 {
            return Err(anyhow::anyhow!("负载分布阈值不能为负数"));
        }

        Ok(())
    }
}

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];
pub const ALERT_LEVELS: [&str; 4] = ["none", "errors", "all_alerts", "verbose"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
    pub alert_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            alert_level: "all_alerts".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志级别: {}，支持的级别: {:?}",
                self.log_level,
                LOG_LEVELS
            ));
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志格式: {}，支持的格式: {:?}",
                self.log_format,
                LOG_FORMATS
            ));
        }

        if !ALERT_LEVELS.contains(&self.alert_level.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的告警级别: {}，支持的级别: {:?}",
                self.alert_level,
                ALERT_LEVELS
            ));
        }

        Ok(())
    }
}
