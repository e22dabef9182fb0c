use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use scheduler_core::{Duration, RetryPolicy, SchedulerError, SchedulerResult, SharedTask};
use scheduler_observability::{ErrorTracker, EventSink};

/// 重试服务接口
#[async_trait]
pub trait RetryService: Send + Sync {
    /// 重试一个失败的任务，成功时返回实际执行的重试次数
    async fn retry_failed_task(&self, task: &SharedTask, worker_id: &str) -> SchedulerResult<u32>;

    /// 第 `attempt` 次失败后的等待时间
    fn delay_for(&self, attempt: u32) -> Duration;
}

/// 基于 [`RetryPolicy`] 的重试服务
///
/// NOTE: retries call `Task::execute` directly, without the executor's
/// timeout wrapper. A task that hangs during a retry holds its worker's retry
/// loop until it returns.
pub struct TaskRetryService {
    policy: RetryPolicy,
    events: Arc<dyn EventSink>,
    errors: Arc<ErrorTracker>,
}

impl TaskRetryService {
    pub fn new(policy: RetryPolicy, events: Arc<dyn EventSink>, errors: Arc<ErrorTracker>) -> Self {
        Self {
            policy,
            events,
            errors,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl RetryService for TaskRetryService {
    async fn retry_failed_task(&self, task: &SharedTask, worker_id: &str) -> SchedulerResult<u32> {
        let mut attempt = 1;
        let mut executions = 0;

        while self.policy.should_retry(attempt) {
            self.events.record_warning(&format!(
                "Retrying task {} on worker {} (attempt {})",
                task.id(),
                worker_id,
                attempt
            ));
            metrics::counter!("scheduler_task_retries_total", "worker" => worker_id.to_string())
                .increment(1);
            executions += 1;

            match task.execute().await {
                Ok(()) if task.is_completed() => {
                    info!("任务 {} 在第 {} 次重试后完成", task.id(), attempt);
                    return Ok(executions);
                }
                Ok(()) => {
                    debug!("任务 {} 重试返回成功但未标记完成", task.id());
                }
                Err(failure) => {
                    self.errors.record_task_failure(&failure, self.events.as_ref());
                }
            }

            if !self.policy.should_retry(attempt) {
                break;
            }
            let delay = self.delay_for(attempt);
            debug!("任务 {} 将在 {} 后重试", task.id(), delay);
            tokio::time::sleep(delay.to_std()).await;
            attempt += 1;
        }

        warn!("任务 {} 在Worker {} 上重试 {} 次后仍然失败", task.id(), worker_id, executions);
        let error = SchedulerError::RetryExhausted {
            task_id: task.id().to_string(),
            worker_id: worker_id.to_string(),
            attempts: executions,
        };
        self.events.record_error(&format!(
            "Task {} failed after all retries on worker {}",
            task.id(),
            worker_id
        ));
        self.errors.record_scheduler_error(&error, self.events.as_ref());
        Err(error)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.policy.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use scheduler_core::tasks::FailingTask;
    use scheduler_observability::NoopEventSink;

    use super::*;

    fn service(max_retries: u32) -> TaskRetryService {
        TaskRetryService::new(
            RetryPolicy::new(max_retries, Duration::of_millis(1), true),
            Arc::new(NoopEventSink),
            Arc::new(ErrorTracker::new()),
        )
    }

    #[tokio::test]
    async fn test_retry_succeeds() {
        // 第一次执行已在Worker上失败，重试时第2次成功
        let failing = Arc::new(FailingTask::new("flaky", Duration::of_millis(1), 2));
        let task: SharedTask = failing.clone();
        let _ = task.execute().await;

        let executions = service(3).retry_failed_task(&task, "local-1").await.unwrap();
        assert_eq!(executions, 1);
        assert!(task.is_completed());
        assert_eq!(failing.attempts(), 2);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let failing = Arc::new(FailingTask::new("stubborn", Duration::of_millis(1), 5));
        let task: SharedTask = failing.clone();
        let _ = task.execute().await;

        let err = service(3).retry_failed_task(&task, "local-1").await.unwrap_err();
        match err {
            SchedulerError::RetryExhausted {
                task_id,
                worker_id,
                attempts,
            } => {
                assert_eq!(task_id, "stubborn");
                assert_eq!(worker_id, "local-1");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!task.is_completed());
        // 首次执行 + 2 次重试
        assert_eq!(failing.attempts(), 3);
    }

    #[tokio::test]
    async fn test_no_retries_allowed() {
        let failing = Arc::new(FailingTask::new("once", Duration::of_millis(1), 2));
        let task: SharedTask = failing.clone();

        let err = service(1).retry_failed_task(&task, "local-1").await.unwrap_err();
        assert!(err.is_retry_exhausted());
        assert_eq!(failing.attempts(), 0);
    }

    #[test]
    fn test_delay_for_follows_policy() {
        let service = service(5);
        assert_eq!(service.delay_for(1), Duration::of_millis(1));
        assert_eq!(service.delay_for(3), Duration::of_millis(4));
    }
}
