use scheduler_core::{Duration, SharedTask, WorkerMetrics};

/// Worker的队列与计数
///
/// 任务要么在 `pending`，要么在 `failed`，要么已经作为完成结果返回。
#[derive(Debug, Default)]
pub struct WorkerState {
    pending: Vec<SharedTask>,
    failed: Vec<SharedTask>,
    metrics: WorkerMetrics,
}

impl WorkerState {
    pub fn enqueue(&mut self, task: SharedTask) {
        self.pending.push(task);
    }

    pub fn pending(&self) -> &[SharedTask] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<SharedTask> {
        std::mem::take(&mut self.pending)
    }

    pub fn failed(&self) -> &[SharedTask] {
        &self.failed
    }

    pub fn take_failed(&mut self) -> Vec<SharedTask> {
        std::mem::take(&mut self.failed)
    }

    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    pub fn record_completed(&mut self, elapsed: &Duration) {
        self.metrics.record_success(elapsed);
    }

    pub fn record_failed(&mut self, task: SharedTask, elapsed: &Duration) {
        self.metrics.record_failure(elapsed);
        self.failed.push(task);
    }
}

pub(crate) fn elapsed_since(started: std::time::Instant) -> Duration {
    Duration::of_millis(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
}
