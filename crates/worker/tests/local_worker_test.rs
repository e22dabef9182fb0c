use std::sync::Arc;

use scheduler_core::WorkerKind;
use scheduler_testing_utils::{task_ids, RecordingEventSink, TaskBuilder, WorkerBuilder};

#[tokio::test]
async fn test_execute_all_returns_completed_tasks() {
    let mut worker = WorkerBuilder::local("local-1").build();
    worker.enqueue(TaskBuilder::new("a").with_estimated_ms(5).build());
    worker.enqueue(TaskBuilder::new("b").with_estimated_ms(5).build());

    assert_eq!(worker.kind(), WorkerKind::Local);
    assert_eq!(worker.pending_tasks().len(), 2);

    let completed = worker.execute_all().await;

    assert_eq!(task_ids(&completed), vec!["a", "b"]);
    assert!(worker.pending_tasks().is_empty());
    assert!(worker.failed_tasks().is_empty());
    assert_eq!(worker.metrics().tasks_executed, 2);
    assert_eq!(worker.metrics().tasks_completed, 2);
    assert!(worker.is_responsive().await);
}

#[tokio::test]
async fn test_timed_out_task_moves_to_failed_list() {
    let events = RecordingEventSink::new();
    let mut worker = WorkerBuilder::local("local-1")
        .with_events(Arc::new(events.clone()))
        .build();
    worker.enqueue(
        TaskBuilder::new("slow")
            .with_estimated_ms(100)
            .with_timeout_ms(10)
            .build(),
    );
    worker.enqueue(TaskBuilder::new("fast").with_estimated_ms(5).build());

    let completed = worker.execute_all().await;

    assert_eq!(task_ids(&completed), vec!["fast"]);
    assert_eq!(task_ids(worker.failed_tasks()), vec!["slow"]);
    assert!(!worker.failed_tasks()[0].is_completed());
    assert_eq!(worker.metrics().tasks_failed, 1);
    assert!(events.has_error_containing("slow"));

    let drained = worker.drain_failed();
    assert_eq!(drained.len(), 1);
    assert!(worker.failed_tasks().is_empty());
}

#[tokio::test]
async fn test_failing_task_is_recorded_failed() {
    let mut worker = WorkerBuilder::local("local-1").build();
    worker.enqueue(TaskBuilder::new("flaky").failing_until(2).build());

    let completed = worker.execute_all().await;

    assert!(completed.is_empty());
    assert_eq!(worker.failed_tasks().len(), 1);
    assert_eq!(worker.metrics().tasks_executed, 1);
}

#[tokio::test]
async fn test_drain_pending() {
    let mut worker = WorkerBuilder::local("local-1").build();
    worker.enqueue(TaskBuilder::new("a").build());

    let drained = worker.drain_pending();
    assert_eq!(task_ids(&drained), vec!["a"]);
    assert!(worker.pending_tasks().is_empty());
    assert!(worker.execute_all().await.is_empty());
}
