//! Task dispatcher
//!
//! 调度器本体：优先级队列、放置策略、依赖检查、失败重试以及
//! 组合这些组件的 [`TaskScheduler`]。

pub mod dependency_checker;
pub mod queue;
pub mod report;
pub mod retry_service;
pub mod scheduler;
pub mod strategies;

pub use dependency_checker::{DependencyCheckResult, DependencyChecker};
pub use queue::{PriorityTaskQueue, QueueOrigin};
pub use report::{ExecutionReport, RoundSummary, WorkerSnapshot};
pub use retry_service::{RetryService, TaskRetryService};
pub use scheduler::{TaskScheduler, TaskSchedulerBuilder};
pub use strategies::*;
