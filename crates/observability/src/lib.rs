pub mod alerting;
pub mod error_tracker;
pub mod event_sink;
pub mod telemetry_setup;

pub use alerting::{PerformanceAlert, PerformanceMonitor, PerformanceReport, WorkerStats};
pub use error_tracker::{ErrorCategory, ErrorTracker};
pub use event_sink::{AlertLevel, EventSink, NoopEventSink, TracingEventSink};
pub use telemetry_setup::{init_from_config, init_tracing, LogFormat};
