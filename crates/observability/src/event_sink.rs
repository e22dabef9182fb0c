use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// 事件接收接口
///
/// 调度核心只通过这三个方法上报事件。实现必须是同步、不会失败的，
/// 也不能把panic传播回调用方。
pub trait EventSink: Send + Sync {
    fn record_info(&self, message: &str);
    fn record_warning(&self, message: &str);
    fn record_error(&self, message: &str);
}

/// 告警输出级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// 不输出任何事件
    None,
    /// 只输出错误
    Errors,
    /// 输出错误和警告
    #[default]
    AllAlerts,
    /// 输出错误、警告和普通信息
    Verbose,
}

impl AlertLevel {
    pub fn allows_error(&self) -> bool {
        *self >= AlertLevel::Errors
    }

    pub fn allows_warning(&self) -> bool {
        *self >= AlertLevel::AllAlerts
    }

    pub fn allows_info(&self) -> bool {
        *self == AlertLevel::Verbose
    }
}

impl FromStr for AlertLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(AlertLevel::None),
            "errors" => Ok(AlertLevel::Errors),
            "all_alerts" => Ok(AlertLevel::AllAlerts),
            "verbose" => Ok(AlertLevel::Verbose),
            other => Err(anyhow::anyhow!("无效的告警级别: {}", other)),
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertLevel::None => "none",
            AlertLevel::Errors => "errors",
            AlertLevel::AllAlerts => "all_alerts",
            AlertLevel::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// Routes events to `tracing`, filtered by [`AlertLevel`].
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink {
    level: AlertLevel,
}

impl TracingEventSink {
    pub fn new(level: AlertLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }
}

impl EventSink for TracingEventSink {
    fn record_info(&self, message: &str) {
        if self.level.allows_info() {
            info!(target: "scheduler::alerts", "{}", message);
        }
    }

    fn record_warning(&self, message: &str) {
        if self.level.allows_warning() {
            warn!(target: "scheduler::alerts", "{}", message);
        }
    }

    fn record_error(&self, message: &str) {
        if self.level.allows_error() {
            error!(target: "scheduler::alerts", "{}", message);
        }
    }
}

/// 丢弃所有事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record_info(&self, _message: &str) {}
    fn record_warning(&self, _message: &str) {}
    fn record_error(&self, _message: &str) {}
}
