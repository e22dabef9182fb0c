use std::collections::BTreeSet;

use async_trait::async_trait;

use super::TaskState;
use crate::duration::Duration;
use crate::traits::{Task, TaskPriority};
use crate::TaskFailure;

/// 带依赖的任务
///
/// 依赖集合在构造后不可变，调度器在准入时检查所有依赖是否已完成。
#[derive(Debug)]
pub struct DependentTask {
    state: TaskState,
}

impl DependentTask {
    pub fn new<S, I, D>(id: S, priority: TaskPriority, estimated_duration: Duration, dependencies: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self {
            state: TaskState::new(id, estimated_duration)
                .with_priority(priority)
                .with_dependencies(dependencies),
        }
    }

    pub fn with_timeout<S, I, D>(
        id: S,
        priority: TaskPriority,
        estimated_duration: Duration,
        timeout: Duration,
        dependencies: I,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self {
            state: TaskState::new(id, estimated_duration)
                .with_priority(priority)
                .with_timeout(timeout)
                .with_dependencies(dependencies),
        }
    }
}

#[async_trait]
impl Task for DependentTask {
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
