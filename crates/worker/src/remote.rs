use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use scheduler_core::{
    CircuitBreaker, CircuitBreakerConfig, SharedTask, TaskDescriptor, TaskFailure,
};
use scheduler_observability::EventSink;

use crate::components::{
    ExecutionOutcome, RemoteFrame, RemoteProcessor, RemoteReport, RemoteRequest,
    TaskExecutionManager,
};
use crate::state::{elapsed_since, WorkerState};

/// 模拟远程Worker的配置
#[derive(Debug, Clone)]
pub struct RemoteWorkerConfig {
    pub breaker: CircuitBreakerConfig,
    /// 模拟网络延迟上限（毫秒，不含），为0时不模拟延迟
    pub max_latency_ms: u64,
}

impl Default for RemoteWorkerConfig {
    fn default() -> Self {
        Self {
            breaker: CircuitBreakerConfig::default(),
            max_latency_ms: 100,
        }
    }
}

/// 模拟远程Worker
///
/// 每次执行前先检查熔断器；请求经过后台处理器完成一次模拟往返。
/// 任何执行失败、超时或传输失败都会上报给熔断器。
pub struct RemoteWorker {
    id: String,
    state: WorkerState,
    breaker: Arc<CircuitBreaker>,
    processor: RemoteProcessor,
    max_latency_ms: u64,
    events: Arc<dyn EventSink>,
}

impl RemoteWorker {
    /// 创建Worker并启动后台处理器，必须在tokio运行时内调用
    pub fn new<S: Into<String>>(id: S, config: RemoteWorkerConfig, events: Arc<dyn EventSink>) -> Self {
        let id = id.into();
        let processor = RemoteProcessor::spawn(TaskExecutionManager::new(
            format!("{id}/processor"),
            Arc::clone(&events),
        ));
        info!("已连接远程Worker {}", id);

        Self {
            breaker: Arc::new(CircuitBreaker::new(id.clone(), config.breaker)),
            id,
            state: WorkerState::default(),
            processor,
            max_latency_ms: config.max_latency_ms,
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorkerState {
        &mut self.state
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// 熔断器允许请求且处理器仍在运行
    pub async fn is_responsive(&self) -> bool {
        self.breaker.can_send_request().await && self.processor.is_running()
    }

    /// 停止后台处理器，之后的任务都会以传输错误失败
    pub fn stop(&mut self) {
        self.processor.stop();
        self.events
            .record_info(&format!("Disconnected from remote worker {}", self.id));
    }

    pub async fn execute_all(&mut self) -> Vec<SharedTask> {
        let pending = self.state.take_pending();
        debug!("远程Worker {} 开始执行 {} 个任务", self.id, pending.len());

        let mut completed = Vec::with_capacity(pending.len());
        for task in pending {
            let started = Instant::now();
            let outcome = self.process(task).await;
            let elapsed = elapsed_since(started);

            metrics::counter!("scheduler_tasks_executed_total", "worker" => self.id.clone())
                .increment(1);
            match outcome {
                ExecutionOutcome::Completed(task) => {
                    self.breaker.report_success().await;
                    self.state.record_completed(&elapsed);
                    metrics::counter!("scheduler_tasks_completed_total", "worker" => self.id.clone())
                        .increment(1);
                    completed.push(task);
                }
                ExecutionOutcome::Failed { task, .. } => {
                    self.breaker.report_failure().await;
                    self.state.record_failed(task, &elapsed);
                    metrics::counter!("scheduler_tasks_failed_total", "worker" => self.id.clone())
                        .increment(1);
                }
            }
        }

        completed
    }

    async fn process(&self, task: SharedTask) -> ExecutionOutcome {
        if !self.breaker.can_send_request().await {
            let wait = self.breaker.timeout();
            tokio::time::sleep(wait).await;
            let reason = TaskFailure::CircuitOpen {
                task_id: task.id().to_string(),
                worker_id: self.id.clone(),
                waited_ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            };
            return self.fail(task, reason).await;
        }

        match self.round_trip(&task).await {
            Ok(report) if report.completed && task.is_completed() => {
                ExecutionOutcome::Completed(task)
            }
            Ok(report) => {
                let reason = report
                    .failure
                    .unwrap_or_else(|| TaskFailure::execution(task.id(), "远程执行未完成"));
                error!("远程Worker {} 上的任务 {} 失败: {}", self.id, task.id(), reason);
                ExecutionOutcome::Failed { task, reason }
            }
            Err(reason) => self.fail(task, reason).await,
        }
    }

    async fn round_trip(&self, task: &SharedTask) -> Result<RemoteReport, TaskFailure> {
        let sender = self
            .processor
            .sender()
            .ok_or_else(|| TaskFailure::transport(task.id(), "远程处理器已停止"))?;

        let frame = serde_json::to_vec(&RemoteFrame {
            worker_id: self.id.clone(),
            task: TaskDescriptor::of(task.as_ref()),
        })
        .map_err(|e| TaskFailure::transport(task.id(), format!("编码请求帧失败: {e}")))?;

        let (reply, response) = oneshot::channel();
        sender
            .send(RemoteRequest {
                frame,
                task: Arc::clone(task),
                reply,
            })
            .await
            .map_err(|_| TaskFailure::transport(task.id(), "远程处理器连接已关闭"))?;

        let latency = self.simulated_latency();
        debug!("等待 {}ms 模拟网络延迟: 任务 {}", latency, task.id());
        tokio::time::sleep(std::time::Duration::from_millis(latency)).await;

        let bytes = response
            .await
            .map_err(|_| TaskFailure::transport(task.id(), "远程处理器未返回结果"))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TaskFailure::transport(task.id(), format!("解码执行报告失败: {e}")))
    }

    fn simulated_latency(&self) -> u64 {
        if self.max_latency_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..self.max_latency_ms)
        }
    }

    async fn fail(&self, task: SharedTask, reason: TaskFailure) -> ExecutionOutcome {
        task.cleanup().await;
        error!("远程Worker {} 上的任务 {} 失败: {}", self.id, task.id(), reason);
        self.events.record_error(&format!(
            "[REMOTE WORKER {}] {}",
            self.id, reason
        ));
        ExecutionOutcome::Failed { task, reason }
    }
}
