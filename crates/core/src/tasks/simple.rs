use std::collections::BTreeSet;

use async_trait::async_trait;

use super::TaskState;
use crate::duration::Duration;
use crate::traits::{Task, TaskPriority};
use crate::TaskFailure;

/// 简单任务：无依赖，优先级为 `Medium`
#[derive(Debug)]
pub struct SimpleTask {
    state: TaskState,
}

impl SimpleTask {
    /// 超时时间默认为预计执行时间的2倍
    pub fn new<S: Into<String>>(id: S, estimated_duration: Duration) -> Self {
        Self {
            state: TaskState::new(id, estimated_duration),
        }
    }

    pub fn with_timeout<S: Into<String>>(id: S, estimated_duration: Duration, timeout: Duration) -> Self {
        Self {
            state: TaskState::new(id, estimated_duration).with_timeout(timeout),
        }
    }

    /// Number of times `cleanup` has run
    pub fn cleanup_count(&self) -> u32 {
        self.state.cleanup_count()
    }
}

#[async_trait]
impl Task for SimpleTask {
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
        TaskPriority::Medium
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
