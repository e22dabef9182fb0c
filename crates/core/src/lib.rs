pub mod circuit_breaker;
pub mod config;
pub mod duration;
pub mod models;
pub mod retry_policy;
pub mod tasks;
pub mod traits;

pub use circuit_breaker::*;
pub use config::AppConfig;
pub use duration::Duration;
pub use models::{WorkerKind, WorkerLoad, WorkerMetrics};
pub use retry_policy::RetryPolicy;
pub use traits::{SharedTask, Task, TaskDescriptor, TaskPriority};

pub use scheduler_errors::{SchedulerError, SchedulerResult, TaskFailure};
