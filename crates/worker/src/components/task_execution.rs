use std::sync::Arc;

use scheduler_core::{SharedTask, TaskFailure};
use scheduler_observability::EventSink;
use tracing::{debug, warn};

/// 单次执行的结果
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Completed(SharedTask),
    Failed { task: SharedTask, reason: TaskFailure },
}

impl ExecutionOutcome {
    pub fn task(&self) -> &SharedTask {
        match self {
            ExecutionOutcome::Completed(task) => task,
            ExecutionOutcome::Failed { task, .. } => task,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(_))
    }
}

/// 带超时的任务执行器
///
/// 工作负载（先休眠预计执行时间，再调用 `execute()`）在独立的tokio任务中运行，
/// 与任务的超时时间竞争。超时后中止该tokio任务并记为失败。失败时总会调用 `cleanup()`。
pub struct TaskExecutionManager {
    worker_id: String,
    events: Arc<dyn EventSink>,
}

impl TaskExecutionManager {
    pub fn new<S: Into<String>>(worker_id: S, events: Arc<dyn EventSink>) -> Self {
        Self {
            worker_id: worker_id.into(),
            events,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    pub async fn run(&self, task: SharedTask) -> ExecutionOutcome {
        let timeout = task.timeout().to_std();
        let workload = {
            let task = Arc::clone(&task);
            tokio::spawn(async move {
                tokio::time::sleep(task.estimated_duration().to_std()).await;
                task.execute().await
            })
        };
        let abort_handle = workload.abort_handle();

        let result = match tokio::time::timeout(timeout, workload).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(failure))) => Err(failure),
            Ok(Err(join_error)) => {
                warn!("任务 {} 的执行单元异常结束: {}", task.id(), join_error);
                Err(TaskFailure::Aborted {
                    task_id: task.id().to_string(),
                })
            }
            Err(_) => {
                abort_handle.abort();
                Err(TaskFailure::Timeout {
                    task_id: task.id().to_string(),
                    timeout_ms: task.timeout_millis(),
                })
            }
        };

        match result {
            Ok(()) if task.is_completed() => {
                debug!("任务 {} 在Worker {} 上执行成功", task.id(), self.worker_id);
                self.events.record_info(&format!(
                    "Task {} completed successfully on worker {}",
                    task.id(),
                    self.worker_id
                ));
                ExecutionOutcome::Completed(task)
            }
            Ok(()) => {
                let reason = TaskFailure::execution(task.id(), "执行返回成功但任务未标记为完成");
                self.fail(task, reason).await
            }
            Err(reason) => self.fail(task, reason).await,
        }
    }

    /// 记录失败并调用 `cleanup()`
    pub async fn fail(&self, task: SharedTask, reason: TaskFailure) -> ExecutionOutcome {
        task.cleanup().await;
        warn!("任务 {} 在Worker {} 上失败: {}", task.id(), self.worker_id, reason);
        self.events.record_error(&format!(
            "Task {} failed on worker {}: {}",
            task.id(),
            self.worker_id,
            reason
        ));
        ExecutionOutcome::Failed { task, reason }
    }
}
