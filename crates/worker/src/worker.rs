use scheduler_core::{SharedTask, WorkerKind, WorkerMetrics};
use scheduler_observability::WorkerStats;

use crate::local::LocalWorker;
use crate::remote::RemoteWorker;
use crate::state::WorkerState;

/// 调度器管理的Worker
pub enum Worker {
    Local(LocalWorker),
    Remote(RemoteWorker),
}

impl Worker {
    pub fn id(&self) -> &str {
        match self {
            Worker::Local(worker) => worker.id(),
            Worker::Remote(worker) => worker.id(),
        }
    }

    pub fn kind(&self) -> WorkerKind {
        match self {
            Worker::Local(_) => WorkerKind::Local,
            Worker::Remote(_) => WorkerKind::Remote,
        }
    }

    fn state(&self) -> &WorkerState {
        match self {
            Worker::Local(worker) => worker.state(),
            Worker::Remote(worker) => worker.state(),
        }
    }

    fn state_mut(&mut self) -> &mut WorkerState {
        match self {
            Worker::Local(worker) => worker.state_mut(),
            Worker::Remote(worker) => worker.state_mut(),
        }
    }

    /// 加入待执行队列，不检查依赖
    pub fn enqueue(&mut self, task: SharedTask) {
        self.state_mut().enqueue(task);
    }

    pub fn pending_tasks(&self) -> &[SharedTask] {
        self.state().pending()
    }

    pub fn drain_pending(&mut self) -> Vec<SharedTask> {
        self.state_mut().take_pending()
    }

    pub fn failed_tasks(&self) -> &[SharedTask] {
        self.state().failed()
    }

    pub fn drain_failed(&mut self) -> Vec<SharedTask> {
        self.state_mut().take_failed()
    }

    pub fn metrics(&self) -> &WorkerMetrics {
        self.state().metrics()
    }

    /// 执行所有待执行任务，返回报告完成的任务
    pub async fn execute_all(&mut self) -> Vec<SharedTask> {
        match self {
            Worker::Local(worker) => worker.execute_all().await,
            Worker::Remote(worker) => worker.execute_all().await,
        }
    }

    /// 本地Worker总是可用
    pub async fn is_responsive(&self) -> bool {
        match self {
            Worker::Local(_) => true,
            Worker::Remote(worker) => worker.is_responsive().await,
        }
    }

    pub fn shutdown(&mut self) {
        if let Worker::Remote(worker) = self {
            worker.stop();
        }
    }

    pub async fn stats(&self) -> WorkerStats {
        WorkerStats {
            worker_id: self.id().to_string(),
            kind: self.kind(),
            metrics: self.metrics().clone(),
            responsive: self.is_responsive().await,
        }
    }
}

impl From<LocalWorker> for Worker {
    fn from(worker: LocalWorker) -> Self {
        Worker::Local(worker)
    }
}

impl From<RemoteWorker> for Worker {
    fn from(worker: RemoteWorker) -> Self {
        Worker::Remote(worker)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("pending", &self.pending_tasks().len())
            .field("failed", &self.failed_tasks().len())
            .finish()
    }
}
