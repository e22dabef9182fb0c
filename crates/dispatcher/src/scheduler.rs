use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scheduler_core::config::MonitorConfig;
use scheduler_core::{
    AppConfig, Duration, RetryPolicy, SchedulerError, SchedulerResult, SharedTask, WorkerLoad,
};
use scheduler_observability::{
    AlertLevel, ErrorTracker, EventSink, PerformanceMonitor, PerformanceReport, TracingEventSink,
    WorkerStats,
};
use scheduler_worker::Worker;

use crate::dependency_checker::DependencyChecker;
use crate::queue::PriorityTaskQueue;
use crate::report::{ExecutionReport, WorkerSnapshot};
use crate::retry_service::{RetryService, TaskRetryService};
use crate::strategies::{strategy_from_name, LeastLoadedStrategy, PlacementStrategy, WorkerCandidate};

struct RegisteredWorker {
    worker: Worker,
    load: WorkerLoad,
}

#[derive(Default)]
struct SchedulerState {
    /// 按注册顺序
    workers: Vec<RegisteredWorker>,
    queue: PriorityTaskQueue,
    completed: HashSet<String>,
}

impl SchedulerState {
    fn find(&self, worker_id: &str) -> Option<&RegisteredWorker> {
        self.workers.iter().find(|r| r.worker.id() == worker_id)
    }
}

/// 任务调度器
///
/// 所有状态由一把异步锁保护：准入、分发和重试驱动互斥执行，
/// 各Worker的任务队列在 `execute_all` 中并发执行。
pub struct TaskScheduler {
    state: Mutex<SchedulerState>,
    strategy: Box<dyn PlacementStrategy>,
    dependency_checker: DependencyChecker,
    retry_service: Arc<dyn RetryService>,
    events: Arc<dyn EventSink>,
    monitor: PerformanceMonitor,
}

impl TaskScheduler {
    /// 默认配置：最小负载策略、默认重试策略、tracing 事件输出
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TaskSchedulerBuilder {
        TaskSchedulerBuilder::default()
    }

    /// 按应用配置创建调度器（不包含Worker）
    pub fn from_config(config: &AppConfig, events: Arc<dyn EventSink>) -> SchedulerResult<Self> {
        let strategy = strategy_from_name(&config.scheduler.placement_strategy)?;
        Ok(Self::builder()
            .retry_policy(config.scheduler.retry_policy())
            .strategy(strategy)
            .monitor_config(config.monitor.clone())
            .events(events)
            .build())
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn error_tracker(&self) -> &Arc<ErrorTracker> {
        self.monitor.error_tracker()
    }

    /// 注册Worker，初始负载为0
    pub async fn add_worker(&self, worker: impl Into<Worker>) -> SchedulerResult<()> {
        let worker = worker.into();
        if worker.id().trim().is_empty() {
            return Err(SchedulerError::invalid_worker("Worker ID不能为空"));
        }

        let mut state = self.state.lock().await;
        if state.find(worker.id()).is_some() {
            return Err(SchedulerError::DuplicateWorker {
                id: worker.id().to_string(),
            });
        }

        info!("注册Worker: {} ({:?})", worker.id(), worker.kind());
        self.events
            .record_info(&format!("Worker {} registered", worker.id()));
        state.workers.push(RegisteredWorker {
            worker,
            load: WorkerLoad::default(),
        });
        Ok(())
    }

    /// 提交任务
    ///
    /// 依赖必须已全部完成，否则任务被拒绝且不会进入任何队列。
    /// 通过准入后立即重新分发。
    pub async fn schedule_task(&self, task: SharedTask) -> SchedulerResult<()> {
        if task.id().trim().is_empty() {
            return Err(SchedulerError::invalid_task("任务ID不能为空"));
        }

        let mut state = self.state.lock().await;
        if state.workers.is_empty() {
            return Err(SchedulerError::NoWorkersRegistered);
        }
        if let Err(error) = self.dependency_checker.ensure(task.as_ref(), &state.completed) {
            self.events.record_info(&format!(
                "Task {} will not be scheduled due to unmet dependencies",
                task.id()
            ));
            return Err(error);
        }

        debug!("任务 {} 已加入调度队列 (优先级: {})", task.id(), task.priority());
        state.queue.push_fresh(task);
        self.distribute_locked(&mut state)?;
        Ok(())
    }

    /// 回收所有未执行的任务并重新分配
    pub async fn distribute(&self) -> SchedulerResult<usize> {
        let mut state = self.state.lock().await;
        self.distribute_locked(&mut state)
    }

    fn distribute_locked(&self, state: &mut SchedulerState) -> SchedulerResult<usize> {
        for registered in state.workers.iter_mut() {
            for task in registered.worker.drain_pending() {
                if task.is_completed() {
                    state.queue.forget(task.id());
                } else {
                    state.queue.push_requeued(task);
                }
            }
            registered.load.reset();
        }

        let mut assigned = 0;
        while let Some(task) = state.queue.pop() {
            let selected = {
                let candidates: Vec<WorkerCandidate<'_>> = state
                    .workers
                    .iter()
                    .map(|r| WorkerCandidate {
                        worker_id: r.worker.id(),
                        load: &r.load,
                    })
                    .collect();
                self.strategy.select_worker(task.as_ref(), &candidates)
            };

            let Some(registered) = selected.and_then(|index| state.workers.get_mut(index)) else {
                warn!("没有可用的Worker，任务 {} 留在队列中", task.id());
                state.queue.push_requeued(task);
                return Err(SchedulerError::scheduler_full("No workers available"));
            };

            registered.load.assign(task.estimated_duration());
            debug!(
                "任务 {} 分配到Worker {} (负载: {})",
                task.id(),
                registered.worker.id(),
                registered.load.score()
            );
            registered.worker.enqueue(task);
            assigned += 1;
        }

        metrics::gauge!("scheduler_queue_length").set(state.queue.len() as f64);
        Ok(assigned)
    }

    /// 执行所有Worker上的任务
    ///
    /// 先重新分发，然后并发执行各Worker的队列，再对失败任务按重试策略重试。
    /// 重试耗尽的任务记录在报告中，不影响其他任务。
    pub async fn execute_all(&self) -> SchedulerResult<ExecutionReport> {
        let mut state = self.state.lock().await;
        self.distribute_locked(&mut state)?;
        if state.workers.is_empty() {
            let error = SchedulerError::scheduler_full("No workers available");
            self.error_tracker()
                .record_scheduler_error(&error, self.events.as_ref());
            return Err(error);
        }

        let round_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("开始执行任务轮次 {} ({} 个Worker)", round_id, state.workers.len());

        let first_pass = join_all(
            state
                .workers
                .iter_mut()
                .map(|registered| registered.worker.execute_all()),
        )
        .await;

        let mut completed: HashMap<String, Vec<SharedTask>> = HashMap::new();
        for (registered, tasks) in state.workers.iter_mut().zip(first_pass) {
            // 本轮结束后Worker队列为空
            registered.load.reset();
            completed.insert(registered.worker.id().to_string(), tasks);
        }

        let retry_service = &self.retry_service;
        let retry_rounds = join_all(state.workers.iter_mut().map(|registered| {
            let worker_id = registered.worker.id().to_string();
            let failed = registered.worker.drain_failed();
            async move {
                let mut recovered = Vec::new();
                let mut exhausted = Vec::new();
                for task in failed {
                    match retry_service.retry_failed_task(&task, &worker_id).await {
                        Ok(_) => recovered.push(task),
                        Err(error) => exhausted.push((task, error)),
                    }
                }
                (worker_id, recovered, exhausted)
            }
        }))
        .await;

        let mut exhausted = Vec::new();
        let mut abandoned = Vec::new();
        for (worker_id, recovered, failed) in retry_rounds {
            completed.entry(worker_id).or_default().extend(recovered);
            for (task, error) in failed {
                abandoned.push(task);
                exhausted.push(error);
            }
        }

        for task in completed.values().flatten() {
            state.queue.forget(task.id());
            state.completed.insert(task.id().to_string());
        }
        for task in &abandoned {
            state.queue.forget(task.id());
        }

        let stats = Self::collect_stats(&state).await;
        let performance = self.monitor.evaluate(&stats);
        self.error_tracker().display_all_metrics(self.events.as_ref());
        let alerts = self.monitor.check_alerts(&performance);

        let report = ExecutionReport {
            round_id,
            started_at,
            finished_at: Utc::now(),
            completed,
            exhausted,
            abandoned,
            performance,
            alerts,
        };
        info!(
            "任务轮次 {} 完成: {} 个任务完成, {} 个任务重试耗尽",
            round_id,
            report.total_completed(),
            report.exhausted.len()
        );
        Ok(report)
    }

    async fn collect_stats(state: &SchedulerState) -> Vec<WorkerStats> {
        let mut stats = Vec::with_capacity(state.workers.len());
        for registered in &state.workers {
            stats.push(registered.worker.stats().await);
        }
        stats
    }

    pub async fn workers(&self) -> Vec<WorkerSnapshot> {
        let state = self.state.lock().await;
        let mut snapshots = Vec::with_capacity(state.workers.len());
        for registered in &state.workers {
            let worker = &registered.worker;
            snapshots.push(WorkerSnapshot {
                worker_id: worker.id().to_string(),
                kind: worker.kind(),
                pending: worker.pending_tasks().iter().map(|t| t.id().to_string()).collect(),
                failed: worker.failed_tasks().iter().map(|t| t.id().to_string()).collect(),
                metrics: worker.metrics().clone(),
                load: registered.load.clone(),
                responsive: worker.is_responsive().await,
            });
        }
        snapshots
    }

    pub async fn worker_count(&self) -> usize {
        self.state.lock().await.workers.len()
    }

    /// 负载分数（任务数 + 预计执行时间）
    pub async fn worker_load(&self, worker_id: &str) -> Option<Duration> {
        let state = self.state.lock().await;
        state.find(worker_id).map(|r| r.load.score())
    }

    /// 已分配任务的预计执行时间总和
    pub async fn worker_duration_load(&self, worker_id: &str) -> Option<Duration> {
        let state = self.state.lock().await;
        state.find(worker_id).map(|r| r.load.total_duration.clone())
    }

    pub async fn pending_task_ids(&self, worker_id: &str) -> Option<Vec<String>> {
        let state = self.state.lock().await;
        state.find(worker_id).map(|r| {
            r.worker
                .pending_tasks()
                .iter()
                .map(|t| t.id().to_string())
                .collect()
        })
    }

    /// 已完成的任务ID，已排序
    pub async fn completed_task_ids(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state.completed.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn is_task_completed(&self, task_id: &str) -> bool {
        self.state.lock().await.completed.contains(task_id)
    }

    pub async fn queued_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// 按当前Worker统计计算性能指标，不触发告警
    pub async fn performance_report(&self) -> PerformanceReport {
        let state = self.state.lock().await;
        let stats = Self::collect_stats(&state).await;
        self.monitor.evaluate(&stats)
    }

    /// 停止所有远程Worker的处理器
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        for registered in state.workers.iter_mut() {
            registered.worker.shutdown();
        }
        info!("调度器已关闭");
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// [`TaskScheduler`] 构建器
#[derive(Default)]
pub struct TaskSchedulerBuilder {
    retry_policy: RetryPolicy,
    strategy: Option<Box<dyn PlacementStrategy>>,
    events: Option<Arc<dyn EventSink>>,
    monitor_config: MonitorConfig,
    error_tracker: Option<Arc<ErrorTracker>>,
    retry_service: Option<Arc<dyn RetryService>>,
}

impl TaskSchedulerBuilder {
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn strategy(mut self, strategy: Box<dyn PlacementStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn monitor_config(mut self, config: MonitorConfig) -> Self {
        self.monitor_config = config;
        self
    }

    pub fn error_tracker(mut self, errors: Arc<ErrorTracker>) -> Self {
        self.error_tracker = Some(errors);
        self
    }

    /// 替换重试服务；设置后 `retry_policy` 不再生效
    pub fn retry_service(mut self, service: Arc<dyn RetryService>) -> Self {
        self.retry_service = Some(service);
        self
    }

    pub fn build(self) -> TaskScheduler {
        let TaskSchedulerBuilder {
            retry_policy,
            strategy,
            events,
            monitor_config,
            error_tracker,
            retry_service,
        } = self;

        let events: Arc<dyn EventSink> =
            events.unwrap_or_else(|| Arc::new(TracingEventSink::new(AlertLevel::default())));
        let errors = error_tracker.unwrap_or_else(|| Arc::new(ErrorTracker::new()));
        let retry_service = retry_service.unwrap_or_else(|| {
            Arc::new(TaskRetryService::new(
                retry_policy,
                events.clone(),
                errors.clone(),
            ))
        });

        TaskScheduler {
            state: Mutex::new(SchedulerState::default()),
            strategy: strategy.unwrap_or_else(|| Box::new(LeastLoadedStrategy::new())),
            dependency_checker: DependencyChecker::new(),
            retry_service,
            monitor: PerformanceMonitor::new(monitor_config, events.clone(), errors),
            events,
        }
    }
}
