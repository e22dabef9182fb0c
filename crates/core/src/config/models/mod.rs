pub mod app_config;
pub mod monitor_observability;
pub mod scheduler_worker;

pub use app_config::AppConfig;
pub use monitor_observability::{MonitorConfig, ObservabilityConfig};
pub use scheduler_worker::{SchedulerConfig, WorkerConfig};
