use std::sync::Arc;

use scheduler_core::{SharedTask, Task};
use scheduler_testing_utils::{MockBehavior, MockTask, RecordingEventSink, TaskBuilder};
use scheduler_worker::{ExecutionOutcome, TaskExecutionManager};

fn manager(events: &RecordingEventSink) -> TaskExecutionManager {
    TaskExecutionManager::new("local-1", Arc::new(events.clone()))
}

#[tokio::test]
async fn test_run_completes_task() {
    let events = RecordingEventSink::new();
    let task = TaskBuilder::new("ok").with_estimated_ms(10).build();

    let outcome = manager(&events).run(task.clone()).await;

    assert!(outcome.is_completed());
    assert!(task.is_completed());
    assert!(events.errors().is_empty());
}

#[tokio::test]
async fn test_run_times_out_and_cleans_up() {
    let events = RecordingEventSink::new();
    let mock = Arc::new(MockTask::new("slow", 200, MockBehavior::Succeed).with_timeout_ms(20));
    let task: SharedTask = mock.clone();

    let outcome = manager(&events).run(task).await;

    match outcome {
        ExecutionOutcome::Failed { reason, .. } => {
            assert!(reason.is_timeout());
            assert_eq!(reason.task_id(), "slow");
        }
        ExecutionOutcome::Completed(_) => panic!("task should have timed out"),
    }
    assert!(!mock.is_completed());
    assert_eq!(mock.cleanups(), 1);

    // 工作负载已被中止，不会在超时之后再执行
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    assert_eq!(mock.executions(), 0);
    assert!(events.has_error_containing("slow"));
}

#[tokio::test]
async fn test_run_records_execution_failure() {
    let events = RecordingEventSink::new();
    let mock = Arc::new(MockTask::new("broken", 5, MockBehavior::AlwaysFail));

    let outcome = manager(&events).run(mock.clone()).await;

    assert!(!outcome.is_completed());
    assert_eq!(outcome.task().id(), "broken");
    assert_eq!(mock.executions(), 1);
    assert_eq!(mock.cleanups(), 1);
}

#[tokio::test]
async fn test_ok_without_completion_is_failure() {
    let events = RecordingEventSink::new();
    let mock = Arc::new(MockTask::new("lazy", 5, MockBehavior::SucceedWithoutCompleting));

    let outcome = manager(&events).run(mock.clone()).await;

    assert!(!outcome.is_completed());
    assert_eq!(mock.cleanups(), 1);
}
