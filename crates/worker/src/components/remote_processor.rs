//! 远程任务处理器
//!
//! 在进程内模拟一次网络往返：客户端把任务描述编码为JSON帧，经由通道发送给后台的
//! 处理器任务；处理器解码后通过 [`TaskExecutionManager`] 执行任务，再把编码后的执行报告
//! 通过一次性通道发回。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use scheduler_core::{SharedTask, TaskDescriptor, TaskFailure};

use super::task_execution::{ExecutionOutcome, TaskExecutionManager};

const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// 发送给处理器的请求帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFrame {
    pub worker_id: String,
    pub task: TaskDescriptor,
}

/// 处理器返回的执行报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteReport {
    pub task_id: String,
    pub completed: bool,
    pub failure: Option<TaskFailure>,
}

impl RemoteReport {
    fn from_outcome(outcome: &ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Completed(task) => RemoteReport {
                task_id: task.id().to_string(),
                completed: true,
                failure: None,
            },
            ExecutionOutcome::Failed { task, reason } => RemoteReport {
                task_id: task.id().to_string(),
                completed: false,
                failure: Some(reason.clone()),
            },
        }
    }

    fn rejected(task_id: &str, message: String) -> Self {
        RemoteReport {
            task_id: task_id.to_string(),
            completed: false,
            failure: Some(TaskFailure::transport(task_id, message)),
        }
    }
}

/// 一次远程调用：编码后的帧、任务句柄以及回复通道
pub struct RemoteRequest {
    pub frame: Vec<u8>,
    pub task: SharedTask,
    pub reply: oneshot::Sender<Vec<u8>>,
}

/// 后台处理器句柄
pub struct RemoteProcessor {
    sender: Option<mpsc::Sender<RemoteRequest>>,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl RemoteProcessor {
    /// 启动处理器任务
    pub fn spawn(executor: TaskExecutionManager) -> Self {
        let (sender, receiver) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(listen(executor, receiver, Arc::clone(&running)));

        Self {
            sender: Some(sender),
            running,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.handle.is_finished()
    }

    pub fn sender(&self) -> Option<&mpsc::Sender<RemoteRequest>> {
        self.sender.as_ref()
    }

    /// 关闭请求通道；已接收的请求会处理完毕
    pub fn stop(&mut self) {
        if self.sender.take().is_some() {
            self.running.store(false, Ordering::Release);
        }
    }
}

impl Drop for RemoteProcessor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn listen(
    executor: TaskExecutionManager,
    mut receiver: mpsc::Receiver<RemoteRequest>,
    running: Arc<AtomicBool>,
) {
    info!("远程任务处理器已启动: {}", executor.worker_id());

    while let Some(request) = receiver.recv().await {
        let report = handle_request(&executor, request.frame, request.task).await;
        let encoded = match serde_json::to_vec(&report) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("编码执行报告失败: {}", e);
                continue;
            }
        };
        if request.reply.send(encoded).is_err() {
            debug!("客户端已放弃等待任务 {} 的结果", report.task_id);
        }
    }

    running.store(false, Ordering::Release);
    info!("远程任务处理器已停止: {}", executor.worker_id());
}

async fn handle_request(executor: &TaskExecutionManager, frame: Vec<u8>, task: SharedTask) -> RemoteReport {
    let frame: RemoteFrame = match serde_json::from_slice(&frame) {
        Ok(frame) => frame,
        Err(e) => return RemoteReport::rejected(task.id(), format!("无法解码请求帧: {e}")),
    };

    if frame.task.id != task.id() {
        return RemoteReport::rejected(
            task.id(),
            format!("请求帧与任务不匹配: {} != {}", frame.task.id, task.id()),
        );
    }

    debug!("处理器收到任务 {} (来自 {})", frame.task.id, frame.worker_id);
    let outcome = executor.run(task).await;
    RemoteReport::from_outcome(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_core::tasks::SimpleTask;
    use scheduler_core::Duration;
    use scheduler_observability::NoopEventSink;

    fn executor() -> TaskExecutionManager {
        TaskExecutionManager::new("remote-test", Arc::new(NoopEventSink))
    }

    fn frame_for(task: &SharedTask) -> Vec<u8> {
        serde_json::to_vec(&RemoteFrame {
            worker_id: "remote-test".to_string(),
            task: TaskDescriptor::of(task.as_ref()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_handle_request_runs_task() {
        let task: SharedTask = Arc::new(SimpleTask::with_timeout(
            "t-1",
            Duration::of_millis(1),
            Duration::of_millis(1_000),
        ));
        let report = handle_request(&executor(), frame_for(&task), task.clone()).await;

        assert!(report.completed);
        assert_eq!(report.failure, None);
        assert!(task.is_completed());
    }

    #[tokio::test]
    async fn test_handle_request_rejects_garbage_frame() {
        let task: SharedTask = Arc::new(SimpleTask::new("t-1", Duration::of_millis(1)));
        let report = handle_request(&executor(), b"not json".to_vec(), task.clone()).await;

        assert!(!report.completed);
        assert!(matches!(report.failure, Some(TaskFailure::Transport { .. })));
        assert!(!task.is_completed());
    }

    #[tokio::test]
    async fn test_handle_request_rejects_mismatched_frame() {
        let other: SharedTask = Arc::new(SimpleTask::new("other", Duration::of_millis(1)));
        let task: SharedTask = Arc::new(SimpleTask::new("t-1", Duration::of_millis(1)));
        let report = handle_request(&executor(), frame_for(&other), task.clone()).await;

        assert!(!report.completed);
        assert!(!task.is_completed());
    }

    #[tokio::test]
    async fn test_processor_stop() {
        let mut processor = RemoteProcessor::spawn(executor());
        assert!(processor.is_running());
        assert!(processor.sender().is_some());

        processor.stop();
        assert!(!processor.is_running());
        assert!(processor.sender().is_none());
    }

    #[test]
    fn test_report_roundtrip() {
        let report = RemoteReport {
            task_id: "t-1".to_string(),
            completed: false,
            failure: Some(TaskFailure::Timeout {
                task_id: "t-1".to_string(),
                timeout_ms: 20,
            }),
        };
        let bytes = serde_json::to_vec(&report).unwrap();
        let decoded: RemoteReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, report);
    }
}
