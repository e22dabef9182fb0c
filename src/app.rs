use std::sync::Arc;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};

use scheduler_core::tasks::{DependentTask, FailingTask, PriorityTask, SimpleTask};
use scheduler_core::{AppConfig, Duration, SharedTask, TaskPriority};
use scheduler_dispatcher::{RoundSummary, TaskScheduler};
use scheduler_observability::{AlertLevel, EventSink, TracingEventSink};
use scheduler_worker::{LocalWorker, RemoteWorker, RemoteWorkerConfig};

/// 演示任务的预计执行时间范围（毫秒）
const DEMO_ESTIMATE_RANGE_MS: std::ops::Range<u64> = 5..40;

/// 主应用程序：按配置创建Worker，调度并执行一批演示任务
pub struct Application {
    config: AppConfig,
    scheduler: TaskScheduler,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let alert_level: AlertLevel = config.observability.alert_level.parse()?;
        let events: Arc<dyn EventSink> = Arc::new(TracingEventSink::new(alert_level));
        let scheduler = TaskScheduler::from_config(&config, events.clone())
            .context("创建调度器失败")?;

        for i in 1..=config.worker.local_workers {
            let worker = LocalWorker::new(format!("local-{i}"), events.clone());
            scheduler.add_worker(worker).await?;
        }
        for i in 1..=config.worker.remote_workers {
            let worker = RemoteWorker::new(
                format!("remote-{i}"),
                RemoteWorkerConfig {
                    breaker: config.worker.breaker_config(),
                    max_latency_ms: config.worker.max_latency_ms,
                },
                events.clone(),
            );
            scheduler.add_worker(worker).await?;
        }

        info!(
            "初始化应用程序: {} 个本地Worker, {} 个远程Worker, 策略 {}",
            config.worker.local_workers,
            config.worker.remote_workers,
            scheduler.strategy_name()
        );

        Ok(Self { config, scheduler })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// 执行两轮演示
    ///
    /// 第一轮是独立任务，第二轮的任务依赖第一轮完成的任务。
    pub async fn run(&self, task_count: usize) -> Result<Vec<RoundSummary>> {
        let mut summaries = Vec::new();

        let tasks = demo_tasks(task_count, &mut rand::rng());
        for task in tasks {
            self.scheduler.schedule_task(task).await?;
        }
        let report = self.scheduler.execute_all().await?;
        summaries.push(report.summary());

        let completed = report.completed_ids();
        let followups = followup_tasks(&completed, &mut rand::rng());
        if followups.is_empty() {
            return Ok(summaries);
        }

        for task in followups {
            if let Err(e) = self.scheduler.schedule_task(task).await {
                warn!("跳过后续任务: {e}");
            }
        }
        let report = self.scheduler.execute_all().await?;
        summaries.push(report.summary());

        Ok(summaries)
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

/// 生成一批优先级混合的独立任务，每5个任务中有一个首次执行会失败
pub fn demo_tasks<R: Rng>(count: usize, rng: &mut R) -> Vec<SharedTask> {
    (0..count)
        .map(|i| {
            let id = format!("task-{i}");
            let estimated = Duration::of_millis(rng.random_range(DEMO_ESTIMATE_RANGE_MS));
            let priority = match i % 3 {
                0 => TaskPriority::High,
                1 => TaskPriority::Medium,
                _ => TaskPriority::Low,
            };

            let task: SharedTask = match i % 5 {
                4 => Arc::new(FailingTask::new(id, estimated, 2).with_priority(priority)),
                1 => Arc::new(SimpleTask::new(id, estimated)),
                _ => Arc::new(PriorityTask::new(id, estimated, priority)),
            };
            task
        })
        .collect()
}

/// 每两个已完成的任务生成一个依赖它们的汇总任务
pub fn followup_tasks<R: Rng>(completed: &[String], rng: &mut R) -> Vec<SharedTask> {
    completed
        .chunks(2)
        .enumerate()
        .map(|(i, deps)| {
            let estimated = Duration::of_millis(rng.random_range(DEMO_ESTIMATE_RANGE_MS));
            Arc::new(DependentTask::new(
                format!("summary-{i}"),
                TaskPriority::Medium,
                estimated,
                deps.iter().cloned(),
            )) as SharedTask
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.scheduler.retry_base_delay_ms = 1;
        config.worker.local_workers = 2;
        config.worker.remote_workers = 1;
        config.worker.max_latency_ms = 5;
        config.observability.alert_level = "none".to_string();
        config
    }

    #[test]
    fn test_demo_tasks_mix() {
        let tasks = demo_tasks(10, &mut rand::rng());
        assert_eq!(tasks.len(), 10);
        assert_eq!(tasks[0].priority(), TaskPriority::High);
        assert_eq!(tasks[2].priority(), TaskPriority::Low);
        assert!(tasks.iter().all(|t| t.dependencies().is_empty()));
        assert!(tasks.iter().all(|t| DEMO_ESTIMATE_RANGE_MS
            .contains(&t.estimated_duration().millis_u64_saturating())));
    }

    #[test]
    fn test_followup_tasks_depend_on_completed() {
        let completed = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let followups = followup_tasks(&completed, &mut rand::rng());

        assert_eq!(followups.len(), 2);
        assert_eq!(followups[0].dependencies().len(), 2);
        assert!(followups[1].dependencies().contains("c"));
    }

    #[tokio::test]
    async fn test_application_builds_configured_workers() {
        let app = Application::new(test_config()).await.unwrap();
        let workers = app.scheduler().workers().await;
        let ids: Vec<&str> = workers.iter().map(|w| w.worker_id.as_str()).collect();

        assert_eq!(ids, vec!["local-1", "local-2", "remote-1"]);
        assert_eq!(app.scheduler().strategy_name(), "LeastLoaded");
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_config() {
        let mut config = test_config();
        config.observability.alert_level = "loud".to_string();
        assert!(Application::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_run_completes_demo_batch() {
        let mut config = test_config();
        config.worker.remote_workers = 0;
        let app = Application::new(config).await.unwrap();

        let summaries = app.run(6).await.unwrap();

        assert_eq!(summaries.len(), 2);
        let first: usize = summaries[0].completed.values().map(Vec::len).sum();
        assert_eq!(first, 6);
        assert!(summaries[0].exhausted.is_empty());
        let second: usize = summaries[1].completed.values().map(Vec::len).sum();
        assert_eq!(second, 3);
        app.shutdown().await;
    }
}
