use std::sync::Arc;
use std::time::Instant;

use scheduler_core::SharedTask;
use scheduler_observability::EventSink;
use tracing::debug;

use crate::components::{ExecutionOutcome, TaskExecutionManager};
use crate::state::{elapsed_since, WorkerState};

/// 进程内Worker
pub struct LocalWorker {
    id: String,
    state: WorkerState,
    executor: TaskExecutionManager,
}

impl LocalWorker {
    pub fn new<S: Into<String>>(id: S, events: Arc<dyn EventSink>) -> Self {
        let id = id.into();
        Self {
            executor: TaskExecutionManager::new(id.clone(), events),
            id,
            state: WorkerState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorkerState {
        &mut self.state
    }

    /// 依次执行所有待执行任务，返回成功完成的任务
    pub async fn execute_all(&mut self) -> Vec<SharedTask> {
        let pending = self.state.take_pending();
        debug!("Worker {} 开始执行 {} 个任务", self.id, pending.len());

        let mut completed = Vec::with_capacity(pending.len());
        for task in pending {
            let started = Instant::now();
            let outcome = self.executor.run(task).await;
            let elapsed = elapsed_since(started);

            metrics::counter!("scheduler_tasks_executed_total", "worker" => self.id.clone())
                .increment(1);
            match outcome {
                ExecutionOutcome::Completed(task) => {
                    self.state.record_completed(&elapsed);
                    metrics::counter!("scheduler_tasks_completed_total", "worker" => self.id.clone())
                        .increment(1);
                    completed.push(task);
                }
                ExecutionOutcome::Failed { task, .. } => {
                    self.state.record_failed(task, &elapsed);
                    metrics::counter!("scheduler_tasks_failed_total", "worker" => self.id.clone())
                        .increment(1);
                }
            }
        }

        completed
    }
}
