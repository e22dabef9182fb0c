//! Test data builders for tasks and workers

use std::sync::Arc;

use scheduler_core::tasks::{DependentTask, FailingTask, PriorityTask, SimpleTask};
use scheduler_core::{CircuitBreakerConfig, Duration, SharedTask, TaskPriority};
use scheduler_observability::{EventSink, NoopEventSink};
use scheduler_worker::{LocalWorker, RemoteWorker, RemoteWorkerConfig, Worker};

/// Builder for the built-in task types
///
/// Defaults to a 10ms estimate and a 1s timeout so that successful runs are not
/// racing their timer; call `with_default_timeout` for the 2x-estimate default.
/// Picks `FailingTask` when `failing_until` is set, `DependentTask` when
/// dependencies are given, `PriorityTask` when a priority is given, and
/// `SimpleTask` otherwise.
pub struct TaskBuilder {
    id: String,
    estimated_ms: u64,
    timeout_ms: Option<u64>,
    priority: Option<TaskPriority>,
    dependencies: Vec<String>,
    succeed_on_attempt: Option<u32>,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            estimated_ms: 10,
            timeout_ms: Some(1_000),
            priority: None,
            dependencies: Vec::new(),
            succeed_on_attempt: None,
        }
    }

    pub fn with_estimated_ms(mut self, estimated_ms: u64) -> Self {
        self.estimated_ms = estimated_ms;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_default_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Fail every execution before `attempt`, succeed on it
    pub fn failing_until(mut self, attempt: u32) -> Self {
        self.succeed_on_attempt = Some(attempt);
        self
    }

    pub fn build(self) -> SharedTask {
        let estimated = Duration::of_millis(self.estimated_ms);
        let timeout = self.timeout_ms.map(Duration::of_millis);
        let priority = self.priority.unwrap_or_default();

        if let Some(attempt) = self.succeed_on_attempt {
            let mut task = FailingTask::new(self.id, estimated, attempt).with_priority(priority);
            if let Some(timeout) = timeout {
                task = task.with_timeout(timeout);
            }
            return Arc::new(task);
        }

        if !self.dependencies.is_empty() {
            return match timeout {
                Some(timeout) => Arc::new(DependentTask::with_timeout(
                    self.id,
                    priority,
                    estimated,
                    timeout,
                    self.dependencies,
                )),
                None => Arc::new(DependentTask::new(self.id, priority, estimated, self.dependencies)),
            };
        }

        match (self.priority, timeout) {
            (Some(priority), Some(timeout)) => {
                Arc::new(PriorityTask::with_timeout(self.id, estimated, timeout, priority))
            }
            (Some(priority), None) => Arc::new(PriorityTask::new(self.id, estimated, priority)),
            (None, Some(timeout)) => Arc::new(SimpleTask::with_timeout(self.id, estimated, timeout)),
            (None, None) => Arc::new(SimpleTask::new(self.id, estimated)),
        }
    }
}

/// Builder for local and remote workers
pub struct WorkerBuilder {
    id: String,
    remote: bool,
    breaker: CircuitBreakerConfig,
    max_latency_ms: u64,
    events: Arc<dyn EventSink>,
}

impl WorkerBuilder {
    pub fn local(id: &str) -> Self {
        Self {
            id: id.to_string(),
            remote: false,
            breaker: CircuitBreakerConfig::default(),
            max_latency_ms: 0,
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn remote(id: &str) -> Self {
        Self {
            remote: true,
            ..Self::local(id)
        }
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.breaker.failure_threshold = threshold;
        self
    }

    pub fn with_breaker_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.breaker.recovery_timeout = std::time::Duration::from_millis(timeout_ms);
        self
    }

    pub fn with_max_latency_ms(mut self, max_latency_ms: u64) -> Self {
        self.max_latency_ms = max_latency_ms;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Remote workers spawn their processor, so this must run inside a tokio runtime
    pub fn build(self) -> Worker {
        if self.remote {
            RemoteWorker::new(
                self.id,
                RemoteWorkerConfig {
                    breaker: self.breaker,
                    max_latency_ms: self.max_latency_ms,
                },
                self.events,
            )
            .into()
        } else {
            LocalWorker::new(self.id, self.events).into()
        }
    }
}
