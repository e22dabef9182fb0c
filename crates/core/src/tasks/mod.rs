//! 内置任务类型
//!
//! - [`SimpleTask`]：无依赖，优先级为 `Medium`
//! - [`PriorityTask`]：指定优先级
//! - [`DependentTask`]：指定优先级和不可变的依赖集合
//! - [`FailingTask`]：在指定的尝试次数之前确定性地失败，用于测试重试逻辑

mod dependent;
mod failing;
mod priority;
mod simple;

pub use dependent::DependentTask;
pub use failing::FailingTask;
pub use priority::PriorityTask;
pub use simple::SimpleTask;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tracing::debug;

use crate::duration::Duration;
use crate::traits::TaskPriority;

/// State shared by all built-in task types.
#[derive(Debug)]
pub(crate) struct TaskState {
    id: String,
    estimated_duration: Duration,
    timeout: Option<Duration>,
    priority: TaskPriority,
    dependencies: BTreeSet<String>,
    completed: AtomicBool,
    cleanups: AtomicU32,
}

impl TaskState {
    pub(crate) fn new<S: Into<String>>(id: S, estimated_duration: Duration) -> Self {
        Self {
            id: id.into(),
            estimated_duration,
            timeout: None,
            priority: TaskPriority::Medium,
            dependencies: BTreeSet::new(),
            completed: AtomicBool::new(false),
            cleanups: AtomicU32::new(0),
        }
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub(crate) fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn estimated_duration(&self) -> &Duration {
        &self.estimated_duration
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
            .clone()
            .unwrap_or_else(|| self.estimated_duration.times(2))
    }

    pub(crate) fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub(crate) fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    pub(crate) fn cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::Relaxed);
        debug!("清理任务资源: {}", self.id);
    }

    pub(crate) fn cleanup_count(&self) -> u32 {
        self.cleanups.load(Ordering::Relaxed)
    }
}
