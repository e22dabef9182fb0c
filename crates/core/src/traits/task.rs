//! 任务执行契约
//!
//! 此模块定义了调度器与任务之间的核心抽象：
//! - 任务标识、优先级、依赖集合
//! - 预计执行时间与超时时间
//! - 执行行为与完成标记
//!
//! ## 核心概念
//!
//! ### Task
//! 任务以 `Arc<dyn Task>`（即 [`SharedTask`]）的形式在调度器、队列和Worker之间共享。
//! 完成标记使用内部可变性，只会由一次成功的 `execute()` 设置。
//!
//! ### TaskPriority
//! `High < Medium < Low`，排序时 `High` 排在最前。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scheduler_core::tasks::SimpleTask;
//! use scheduler_core::{Duration, SharedTask};
//!
//! let task: SharedTask = Arc::new(SimpleTask::new("report-1", Duration::of_millis(50)));
//! assert!(!task.is_completed());
//! task.execute().await?;
//! assert!(task.is_completed());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::TaskFailure;

/// 任务优先级
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPriority::High => "HIGH",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::Low => "LOW",
        };
        f.write_str(name)
    }
}

/// 任务执行接口
///
/// 所有任务类型都必须实现此trait。`execute()` 成功时必须将任务标记为已完成，
/// `cleanup()` 在成功或失败后都会被调用，必须是幂等的。
///
/// # 方法说明
///
/// * `id` - 任务标识，在一次会话内唯一（不强制）
/// * `execute` - 执行任务，返回 [`TaskFailure`] 表示失败
/// * `is_completed` - 是否已成功执行
/// * `estimated_duration` - 预计执行时间，用于负载计算和模拟执行
/// * `priority` - 优先级，默认 `Medium`
/// * `dependencies` - 必须先完成的任务ID集合
/// * `timeout` - 超时时间，默认是预计执行时间的2倍
#[async_trait]
pub trait Task: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    async fn execute(&self) -> Result<(), TaskFailure>;

    fn is_completed(&self) -> bool;

    fn estimated_duration(&self) -> &Duration;

    fn priority(&self) -> TaskPriority {
        TaskPriority::Medium
    }

    fn dependencies(&self) -> &BTreeSet<String>;

    fn timeout(&self) -> Duration {
        self.estimated_duration().times(2)
    }

    /// Timeout in milliseconds, saturating at `u64::MAX`
    fn timeout_millis(&self) -> u64 {
        self.timeout().millis_u64_saturating()
    }

    async fn cleanup(&self) {}
}

/// 共享任务句柄
pub type SharedTask = Arc<dyn Task>;

/// Serializable view of a task, used in worker snapshots and remote frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,
    pub priority: TaskPriority,
    pub estimated_duration: Duration,
    pub timeout: Duration,
    pub dependencies: Vec<String>,
}

impl TaskDescriptor {
    pub fn of(task: &dyn Task) -> Self {
        Self {
            id: task.id().to_string(),
            priority: task.priority(),
            estimated_duration: task.estimated_duration().clone(),
            timeout: task.timeout(),
            dependencies: task.dependencies().iter().cloned().collect(),
        }
    }
}
