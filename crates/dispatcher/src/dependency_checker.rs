use std::collections::HashSet;

use tracing::debug;

use scheduler_core::{SchedulerError, SchedulerResult, Task};

/// 依赖检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheckResult {
    pub can_execute: bool,
    /// 尚未完成的依赖，按ID排序
    pub missing: Vec<String>,
}

/// 依赖检查器
///
/// 只在准入时检查：依赖必须是已完成集合的子集。
#[derive(Debug, Default, Clone)]
pub struct DependencyChecker;

impl DependencyChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, task: &dyn Task, completed: &HashSet<String>) -> DependencyCheckResult {
        // dependencies 是 BTreeSet，结果天然有序
        let missing: Vec<String> = task
            .dependencies()
            .iter()
            .filter(|dep| !completed.contains(dep.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            debug!("任务 {} 的依赖未满足: {:?}", task.id(), missing);
        }

        DependencyCheckResult {
            can_execute: missing.is_empty(),
            missing,
        }
    }

    pub fn ensure(&self, task: &dyn Task, completed: &HashSet<String>) -> SchedulerResult<()> {
        let result = self.check(task, completed);
        if result.can_execute {
            Ok(())
        } else {
            Err(SchedulerError::UnmetDependencies {
                task_id: task.id().to_string(),
                missing: result.missing,
            })
        }
    }
}
