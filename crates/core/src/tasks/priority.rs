use std::collections::BTreeSet;

use async_trait::async_trait;

use super::TaskState;
use crate::duration::Duration;
use crate::traits::{Task, TaskPriority};
use crate::TaskFailure;

/// 带优先级的任务
#[derive(Debug)]
pub struct PriorityTask {
    state: TaskState,
}

impl PriorityTask {
    pub fn new<S: Into<String>>(id: S, estimated_duration: Duration, priority: TaskPriority) -> Self {
        Self {
            state: TaskState::new(id, estimated_duration).with_priority(priority),
        }
    }

    pub fn with_timeout<S: Into<String>>(
        id: S,
        estimated_duration: Duration,
        timeout: Duration,
        priority: TaskPriority,
    ) -> Self {
        Self {
            state: TaskState::new(id, estimated_duration)
                .with_timeout(timeout)
                .with_priority(priority),
        }
    }

    pub fn cleanup_count(&self) -> u32 {
        self.state.cleanup_count()
    }
}

#[async_trait]
impl Task for PriorityTask {
    fn id(&self) -> &str {
        self.state.id()
    }

    async fn execute(&self) -> Result<(), TaskFailure> {
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
