use std::sync::Arc;
use std::time::{Duration, Instant};

use scheduler_core::{CircuitState, WorkerKind};
use scheduler_testing_utils::{
    task_ids, MockBehavior, MockTask, RecordingEventSink, TaskBuilder, WorkerBuilder,
};
use scheduler_worker::Worker;

fn breaker_state_worker(worker: &Worker) -> &scheduler_worker::RemoteWorker {
    match worker {
        Worker::Remote(remote) => remote,
        Worker::Local(_) => panic!("expected a remote worker"),
    }
}

#[tokio::test]
async fn test_remote_round_trip_completes_tasks() {
    let mut worker = WorkerBuilder::remote("remote-1").with_max_latency_ms(20).build();
    worker.enqueue(TaskBuilder::new("a").with_estimated_ms(5).build());
    worker.enqueue(TaskBuilder::new("b").with_estimated_ms(5).build());

    assert_eq!(worker.kind(), WorkerKind::Remote);
    let completed = worker.execute_all().await;

    assert_eq!(task_ids(&completed), vec!["a", "b"]);
    assert_eq!(worker.metrics().tasks_completed, 2);
    assert!(worker.is_responsive().await);
}

#[tokio::test]
async fn test_breaker_opens_and_refuses_until_timeout() {
    let events = RecordingEventSink::new();
    let mut worker = WorkerBuilder::remote("remote-1")
        .with_failure_threshold(2)
        .with_breaker_timeout_ms(150)
        .with_events(Arc::new(events.clone()))
        .build();

    for id in ["f1", "f2"] {
        worker.enqueue(Arc::new(MockTask::new(id, 1, MockBehavior::AlwaysFail)));
    }
    let refused = Arc::new(MockTask::new("refused", 1, MockBehavior::Succeed));
    worker.enqueue(refused.clone());

    let started = Instant::now();
    let completed = worker.execute_all().await;

    assert!(completed.is_empty());
    // 第三个任务没有到达处理器，而是等待熔断器超时后失败
    assert_eq!(refused.executions(), 0);
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(worker.failed_tasks().len(), 3);
    assert!(events.has_error_containing("熔断器已打开"));

    let remote = breaker_state_worker(&worker);
    assert_eq!(remote.circuit_breaker().state().await, CircuitState::Open);
    assert!(!worker.is_responsive().await);

    tokio::time::sleep(Duration::from_millis(170)).await;
    assert!(worker.is_responsive().await);

    worker.enqueue(TaskBuilder::new("after").with_estimated_ms(1).build());
    let completed = worker.execute_all().await;
    assert_eq!(task_ids(&completed), vec!["after"]);
}

#[tokio::test]
async fn test_timeout_on_remote_reports_to_breaker() {
    let mut worker = WorkerBuilder::remote("remote-1")
        .with_failure_threshold(1)
        .with_breaker_timeout_ms(10_000)
        .build();
    worker.enqueue(
        TaskBuilder::new("slow")
            .with_estimated_ms(100)
            .with_timeout_ms(10)
            .build(),
    );

    let completed = worker.execute_all().await;

    assert!(completed.is_empty());
    let remote = breaker_state_worker(&worker);
    assert_eq!(remote.circuit_breaker().stats().await.total_failures, 1);
    assert!(!worker.is_responsive().await);
}

#[tokio::test]
async fn test_stopped_worker_fails_with_transport_error() {
    let events = RecordingEventSink::new();
    let mut worker = WorkerBuilder::remote("remote-1")
        .with_failure_threshold(5)
        .with_events(Arc::new(events.clone()))
        .build();

    worker.shutdown();
    assert!(!worker.is_responsive().await);

    worker.enqueue(TaskBuilder::new("late").build());
    let completed = worker.execute_all().await;

    assert!(completed.is_empty());
    assert_eq!(task_ids(worker.failed_tasks()), vec!["late"]);
    assert!(events.has_error_containing("远程处理器已停止"));
}
