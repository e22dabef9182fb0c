use serde::{Deserialize, Serialize};

use crate::duration::Duration;

/// Worker类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Local,
    Remote,
}

/// Worker执行计数
///
/// 每次尝试（包括超时和熔断拒绝）都计入 `executed`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerMetrics {
    pub tasks_executed: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub total_execution_time: Duration,
}

impl WorkerMetrics {
    pub fn record_success(&mut self, elapsed: &Duration) {
        self.tasks_executed += 1;
        self.tasks_completed += 1;
        self.total_execution_time = self.total_execution_time.plus(elapsed);
    }

    pub fn record_failure(&mut self, elapsed: &Duration) {
        self.tasks_executed += 1;
        self.tasks_failed += 1;
        self.total_execution_time = self.total_execution_time.plus(elapsed);
    }

    /// 平均执行时间（毫秒），没有执行记录时为0
    pub fn average_execution_ms(&self) -> f64 {
        if self.tasks_executed == 0 {
            0.0
        } else {
            self.total_execution_time.millis_u64_saturating() as f64 / self.tasks_executed as f64
        }
    }
}

/// 调度器维护的单个Worker负载
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLoad {
    pub task_count: u64,
    pub total_duration: Duration,
}

impl WorkerLoad {
    /// 负载分数 = 任务数 + 预计执行时间总和（毫秒），两者权重相同
    pub fn score(&self) -> Duration {
        self.total_duration.plus(&Duration::of_millis(self.task_count))
    }

    pub fn assign(&mut self, estimated: &Duration) {
        self.task_count += 1;
        self.total_duration = self.total_duration.plus(estimated);
    }

    pub fn reset(&mut self) {
        *self = WorkerLoad::default();
    }
}
