use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::TaskState;
use crate::duration::Duration;
use crate::traits::{Task, TaskPriority};
use crate::TaskFailure;

/// 在第 `succeed_on_attempt` 次执行时才成功的任务
///
/// 之前的每次 `execute()` 都返回 [`TaskFailure::Execution`]。
#[derive(Debug)]
pub struct FailingTask {
    state: TaskState,
    succeed_on_attempt: u32,
    attempts: AtomicU32,
}

impl FailingTask {
    pub fn new<S: Into<String>>(id: S, estimated_duration: Duration, succeed_on_attempt: u32) -> Self {
        Self {
            state: TaskState::new(id, estimated_duration),
            succeed_on_attempt,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.state = self.state.with_priority(priority);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.state = self.state.with_timeout(timeout);
        self
    }

    /// Number of `execute` calls so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn succeed_on_attempt(&self) -> u32 {
        self.succeed_on_attempt
    }
}

#[async_trait]
impl Task for FailingTask {
    fn id(&self) -> &str {
        self.state.id()
    }

    async fn execute(&self) -> Result<(), TaskFailure> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < self.succeed_on_attempt {
            return Err(TaskFailure::execution(
                self.state.id(),
                format!("第 {attempt} 次执行失败"),
            ));
        }
        self.state.mark_completed();
        self.cleanup().await;
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    fn estimated_duration(&self) -> &Duration {
        self.state.estimated_duration()
    }

    fn priority(&self) -> TaskPriority {
        self.state.priority()
    }

    fn dependencies(&self) -> &BTreeSet<String> {
        self.state.dependencies()
    }

    fn timeout(&self) -> Duration {
        self.state.timeout()
    }

    async fn cleanup(&self) {
        self.state.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fails_until_configured_attempt() {
        let task = FailingTask::new("flaky", Duration::of_millis(10), 3);

        assert!(task.execute().await.is_err());
        assert!(task.execute().await.is_err());
        assert!(!task.is_completed());

        task.execute().await.unwrap();
        assert!(task.is_completed());
        assert_eq!(task.attempts(), 3);
    }

    #[tokio::test]
    async fn test_succeed_on_first_attempt() {
        let task = FailingTask::new("steady", Duration::of_millis(10), 1);
        task.execute().await.unwrap();
        assert!(task.is_completed());
    }

    #[tokio::test]
    async fn test_failure_reason_names_task() {
        let task = FailingTask::new("flaky", Duration::of_millis(10), 2).with_priority(TaskPriority::High);
        let failure = task.execute().await.unwrap_err();
        assert_eq!(failure.task_id(), "flaky");
        assert_eq!(task.priority(), TaskPriority::High);
    }
}
