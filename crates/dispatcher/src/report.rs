use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scheduler_core::{SchedulerError, SharedTask, WorkerKind, WorkerLoad, WorkerMetrics};
use scheduler_observability::{PerformanceAlert, PerformanceReport};

/// 一轮 `execute_all` 的结果
#[derive(Debug)]
pub struct ExecutionReport {
    pub round_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Worker ID -> 本轮完成的任务（首次执行或重试成功）
    pub completed: HashMap<String, Vec<SharedTask>>,
    /// 重试耗尽的任务，每个任务一个 `RetryExhausted`
    pub exhausted: Vec<SchedulerError>,
    /// 重试耗尽后被放弃的任务，可由调用方重新调度
    pub abandoned: Vec<SharedTask>,
    pub performance: PerformanceReport,
    pub alerts: Vec<PerformanceAlert>,
}

impl ExecutionReport {
    pub fn total_completed(&self) -> usize {
        self.completed.values().map(Vec::len).sum()
    }

    /// 本轮完成的任务ID，已排序
    pub fn completed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .completed
            .values()
            .flatten()
            .map(|task| task.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    pub fn completed_on(&self, worker_id: &str) -> &[SharedTask] {
        self.completed
            .get(worker_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_clean(&self) -> bool {
        self.exhausted.is_empty()
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            round_id: self.round_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            elapsed_ms: (self.finished_at - self.started_at).num_milliseconds(),
            completed: self
                .completed
                .iter()
                .map(|(worker_id, tasks)| {
                    let mut ids: Vec<String> = tasks.iter().map(|t| t.id().to_string()).collect();
                    ids.sort();
                    (worker_id.clone(), ids)
                })
                .collect(),
            exhausted: self.exhausted.iter().map(|e| e.to_string()).collect(),
            performance: self.performance.clone(),
            alerts: self.alerts.iter().map(PerformanceAlert::message).collect(),
        }
    }
}

/// 可序列化的执行摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub completed: BTreeMap<String, Vec<String>>,
    pub exhausted: Vec<String>,
    pub performance: PerformanceReport,
    pub alerts: Vec<String>,
}

/// Worker 状态快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub worker_id: String,
    pub kind: WorkerKind,
    pub pending: Vec<String>,
    pub failed: Vec<String>,
    pub metrics: WorkerMetrics,
    pub load: WorkerLoad,
    pub responsive: bool,
}
