use serde::{Deserialize, Serialize};
use thiserror::Error;


/// 调度器错误类型定义
///
/// 准入类错误在任何状态变更之前返回；`SchedulerFull` 表示分发时没有可用容量，
/// 与准入阶段的 `NoWorkersRegistered` 区分开。
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("无效的Worker: {reason}")]
    InvalidWorker { reason: String },
    #[error("Worker已注册: {id}")]
    DuplicateWorker { id: String },
    #[error("无效的任务: {reason}")]
    InvalidTask { reason: String },
    #[error("没有已注册的Worker")]
    NoWorkersRegistered,
    #[error("任务 {task_id} 的依赖未满足: {missing:?}")]
    UnmetDependencies {
        task_id: String,
        missing: Vec<String>,
    },
    #[error("调度器已满: {0}")]
    SchedulerFull(String),
    #[error("任务 {task_id} 在Worker {worker_id} 上重试 {attempts} 次后仍然失败")]
    RetryExhausted {
        task_id: String,
        worker_id: String,
        attempts: u32,
    },
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl SchedulerError {
    pub fn invalid_worker<S: Into<String>>(reason: S) -> Self {
        Self::InvalidWorker {
            reason: reason.into(),
        }
    }
    pub fn invalid_task<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTask {
            reason: reason.into(),
        }
    }
    pub fn scheduler_full<S: Into<String>>(msg: S) -> Self {
        Self::SchedulerFull(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    /// Rejected before the task or worker entered scheduler state.
    pub fn is_admission(&self) -> bool {
        matches!(
            self,
            SchedulerError::InvalidWorker { .. }
                | SchedulerError::DuplicateWorker { .. }
                | SchedulerError::InvalidTask { .. }
                | SchedulerError::NoWorkersRegistered
                | SchedulerError::UnmetDependencies { .. }
        )
    }
    pub fn is_capacity(&self) -> bool {
        matches!(self, SchedulerError::SchedulerFull(_))
    }
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, SchedulerError::RetryExhausted { .. })
    }
    pub fn user_message(&self) -> &str {
        match self {
            SchedulerError::InvalidWorker { .. } | SchedulerError::DuplicateWorker { .. } => {
                "Worker配置有误"
            }
            SchedulerError::InvalidTask { .. } => "任务参数配置有误",
            SchedulerError::NoWorkersRegistered => "请先注册至少一个Worker",
            SchedulerError::UnmetDependencies { .. } => "任务依赖尚未完成",
            SchedulerError::SchedulerFull(_) => "系统资源不足，请稍后重试",
            SchedulerError::RetryExhausted { .. } => "任务多次重试后仍然失败",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::Internal(err.to_string())
    }
}

/// 单个任务执行失败的原因
///
/// 任务级失败只在Worker内部记账，不会作为错误跨组件传播。
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskFailure {
    #[error("任务 {task_id} 执行失败: {message}")]
    Execution { task_id: String, message: String },
    #[error("任务 {task_id} 执行超时 ({timeout_ms}ms)")]
    Timeout { task_id: String, timeout_ms: u64 },
    #[error("Worker {worker_id} 熔断器已打开，任务 {task_id} 等待 {waited_ms}ms 后失败")]
    CircuitOpen {
        task_id: String,
        worker_id: String,
        waited_ms: u64,
    },
    #[error("任务 {task_id} 远程传输失败: {message}")]
    Transport { task_id: String, message: String },
    #[error("任务 {task_id} 的执行单元被中止")]
    Aborted { task_id: String },
}

impl TaskFailure {
    pub fn execution<S: Into<String>, M: Into<String>>(task_id: S, message: M) -> Self {
        Self::Execution {
            task_id: task_id.into(),
            message: message.into(),
        }
    }
    pub fn transport<S: Into<String>, M: Into<String>>(task_id: S, message: M) -> Self {
        Self::Transport {
            task_id: task_id.into(),
            message: message.into(),
        }
    }
    pub fn task_id(&self) -> &str {
        match self {
            TaskFailure::Execution { task_id, .. }
            | TaskFailure::Timeout { task_id, .. }
            | TaskFailure::CircuitOpen { task_id, .. }
            | TaskFailure::Transport { task_id, .. }
            | TaskFailure::Aborted { task_id } => task_id,
        }
    }
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskFailure::Timeout { .. })
    }
}
