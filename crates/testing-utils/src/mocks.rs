//! Test doubles for the event sink and the task contract

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scheduler_core::{Duration, Task, TaskFailure, TaskPriority};
use scheduler_observability::EventSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Info(String),
    Warning(String),
    Error(String),
}

/// Event sink that keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.filter(|e| match e {
            RecordedEvent::Info(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.filter(|e| match e {
            RecordedEvent::Warning(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.filter(|e| match e {
            RecordedEvent::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors().iter().any(|m| m.contains(needle))
    }

    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings().iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn filter<F>(&self, f: F) -> Vec<String>
    where
        F: Fn(&RecordedEvent) -> Option<String>,
    {
        self.events.lock().unwrap().iter().filter_map(f).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn record_info(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::Info(message.to_string()));
    }

    fn record_warning(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::Warning(message.to_string()));
    }

    fn record_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::Error(message.to_string()));
    }
}

/// How a [`MockTask`] answers `execute()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Succeed,
    AlwaysFail,
    /// Returns `Ok` without marking the task completed
    SucceedWithoutCompleting,
}

/// Task with a fixed behavior that counts executions and cleanups
///
/// The timeout defaults to 1s.
#[derive(Debug)]
pub struct MockTask {
    id: String,
    priority: TaskPriority,
    estimated_duration: Duration,
    timeout: Duration,
    dependencies: BTreeSet<String>,
    behavior: MockBehavior,
    completed: AtomicBool,
    executions: AtomicU32,
    cleanups: AtomicU32,
}

impl MockTask {
    pub fn new(id: &str, estimated_ms: u64, behavior: MockBehavior) -> Self {
        Self {
            id: id.to_string(),
            priority: TaskPriority::Medium,
            estimated_duration: Duration::of_millis(estimated_ms),
            timeout: Duration::of_millis(1_000),
            dependencies: BTreeSet::new(),
            behavior,
            completed: AtomicBool::new(false),
            executions: AtomicU32::new(0),
            cleanups: AtomicU32::new(0),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::of_millis(timeout_ms);
        self
    }

    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> u32 {
        self.cleanups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Task for MockTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self) -> Result<(), TaskFailure> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Succeed => {
                self.completed.store(true, Ordering::SeqCst);
                Ok(())
            }
            MockBehavior::AlwaysFail => Err(TaskFailure::execution(&self.id, "mock failure")),
            MockBehavior::SucceedWithoutCompleting => Ok(()),
        }
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    fn estimated_duration(&self) -> &Duration {
        &self.estimated_duration
    }

    fn priority(&self) -> TaskPriority {
        self.priority
    }

    fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    fn timeout(&self) -> Duration {
        self.timeout.clone()
    }

    async fn cleanup(&self) {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}
