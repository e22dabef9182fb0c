use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use scheduler_errors::{SchedulerError, TaskFailure};

use crate::event_sink::EventSink;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Worker,
    Task,
    Scheduler,
    Other,
    Performance,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::Worker,
        ErrorCategory::Task,
        ErrorCategory::Scheduler,
        ErrorCategory::Other,
        ErrorCategory::Performance,
    ];

    fn index(self) -> usize {
        match self {
            ErrorCategory::Worker => 0,
            ErrorCategory::Task => 1,
            ErrorCategory::Scheduler => 2,
            ErrorCategory::Other => 3,
            ErrorCategory::Performance => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Worker => "worker",
            ErrorCategory::Task => "task",
            ErrorCategory::Scheduler => "scheduler",
            ErrorCategory::Other => "other",
            ErrorCategory::Performance => "performance",
        }
    }

    pub fn of_scheduler_error(error: &SchedulerError) -> Self {
        match error {
            SchedulerError::InvalidWorker { .. } | SchedulerError::DuplicateWorker { .. } => {
                ErrorCategory::Worker
            }
            SchedulerError::InvalidTask { .. }
            | SchedulerError::UnmetDependencies { .. }
            | SchedulerError::RetryExhausted { .. } => ErrorCategory::Task,
            SchedulerError::NoWorkersRegistered | SchedulerError::SchedulerFull(_) => {
                ErrorCategory::Scheduler
            }
            _ => ErrorCategory::Other,
        }
    }

    pub fn of_task_failure(failure: &TaskFailure) -> Self {
        match failure {
            TaskFailure::Execution { .. } | TaskFailure::Timeout { .. } | TaskFailure::Aborted { .. } => {
                ErrorCategory::Task
            }
            TaskFailure::CircuitOpen { .. } | TaskFailure::Transport { .. } => ErrorCategory::Worker,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按类别统计错误次数
#[derive(Debug, Default)]
pub struct ErrorTracker {
    counts: [AtomicU64; 5],
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次错误并通过 `sink` 上报
    pub fn record(&self, category: ErrorCategory, message: &str, sink: &dyn EventSink) {
        self.increment(category);
        sink.record_error(&format!("{category} error: {message}"));
    }

    pub fn record_scheduler_error(&self, error: &SchedulerError, sink: &dyn EventSink) {
        self.record(ErrorCategory::of_scheduler_error(error), &error.to_string(), sink);
    }

    pub fn record_task_failure(&self, failure: &TaskFailure, sink: &dyn EventSink) {
        self.record(ErrorCategory::of_task_failure(failure), &failure.to_string(), sink);
    }

    /// 性能告警计入 `Performance` 类别，以警告级别上报
    pub fn record_performance_warning(&self, message: &str, sink: &dyn EventSink) {
        self.increment(ErrorCategory::Performance);
        sink.record_warning(&format!("Performance warning: {message}"));
    }

    pub fn count(&self, category: ErrorCategory) -> u64 {
        self.counts[category.index()].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        ErrorCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn snapshot(&self) -> BTreeMap<ErrorCategory, u64> {
        ErrorCategory::ALL
            .iter()
            .map(|category| (*category, self.count(*category)))
            .collect()
    }

    /// 以info级别输出所有类别的计数
    pub fn display_all_metrics(&self, sink: &dyn EventSink) {
        sink.record_info("Error Metrics:");
        for category in ErrorCategory::ALL {
            sink.record_info(&format!("{} errors: {}", category, self.count(category)));
        }
    }

    fn increment(&self, category: ErrorCategory) {
        self.counts[category.index()].fetch_add(1, Ordering::Relaxed);
        metrics::counter!("scheduler_errors_total", "category" => category.as_str()).increment(1);
    }
}
