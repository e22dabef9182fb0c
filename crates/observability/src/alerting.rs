use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use scheduler_core::config::MonitorConfig;
use scheduler_core::{WorkerKind, WorkerMetrics};

use crate::error_tracker::ErrorTracker;
use crate::event_sink::EventSink;

/// 单个Worker的统计快照，作为性能监控的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: String,
    pub kind: WorkerKind,
    pub metrics: WorkerMetrics,
    pub responsive: bool,
}

/// 性能指标汇总
///
/// 比率均为百分比并保留两位小数；`distribution_balance` 是各Worker执行任务数的
/// 变异系数（百分比），Worker数不超过1或平均值为0时为0。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_executed: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub average_execution_ms: f64,
    pub distribution_balance: f64,
    pub unresponsive_workers: Vec<String>,
}

/// 触发的告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformanceAlert {
    LowSuccessRate { actual: f64, threshold: f64 },
    HighFailureRate { actual: f64, threshold: f64 },
    SlowExecution { actual_ms: f64, threshold_ms: f64 },
    ImbalancedDistribution { actual: f64, threshold: f64 },
    UnresponsiveWorker { worker_id: String },
}

impl PerformanceAlert {
    pub fn message(&self) -> String {
        match self {
            PerformanceAlert::LowSuccessRate { actual, threshold } => {
                format!("Success rate is below threshold of {threshold}% at {actual}%")
            }
            PerformanceAlert::HighFailureRate { actual, threshold } => {
                format!("Failure rate is above threshold of {threshold}% at {actual}%")
            }
            PerformanceAlert::SlowExecution {
                actual_ms,
                threshold_ms,
            } => format!(
                "Average execution time is above threshold of {threshold_ms}ms at {actual_ms}ms"
            ),
            PerformanceAlert::ImbalancedDistribution { actual, threshold } => format!(
                "Task distribution is imbalanced: deviation {actual}% exceeds {threshold}%"
            ),
            PerformanceAlert::UnresponsiveWorker { worker_id } => {
                format!("Worker {worker_id} is unresponsive!")
            }
        }
    }
}

/// 性能监控：计算指标并按阈值告警
pub struct PerformanceMonitor {
    thresholds: MonitorConfig,
    sink: Arc<dyn EventSink>,
    errors: Arc<ErrorTracker>,
}

impl PerformanceMonitor {
    pub fn new(thresholds: MonitorConfig, sink: Arc<dyn EventSink>, errors: Arc<ErrorTracker>) -> Self {
        Self {
            thresholds,
            sink,
            errors,
        }
    }

    pub fn thresholds(&self) -> &MonitorConfig {
        &self.thresholds
    }

    pub fn error_tracker(&self) -> &Arc<ErrorTracker> {
        &self.errors
    }

    pub fn evaluate(&self, workers: &[WorkerStats]) -> PerformanceReport {
        let total_executed: u64 = workers.iter().map(|w| w.metrics.tasks_executed).sum();
        let total_completed: u64 = workers.iter().map(|w| w.metrics.tasks_completed).sum();
        let total_failed: u64 = workers.iter().map(|w| w.metrics.tasks_failed).sum();
        let total_time_ms: f64 = workers
            .iter()
            .map(|w| w.metrics.total_execution_time.millis_u64_saturating() as f64)
            .sum();

        let report = PerformanceReport {
            total_executed,
            total_completed,
            total_failed,
            success_rate: percentage(total_completed, total_executed),
            failure_rate: percentage(total_failed, total_executed),
            average_execution_ms: if total_executed > 0 {
                round2(total_time_ms / total_executed as f64)
            } else {
                0.0
            },
            distribution_balance: distribution_balance(workers),
            unresponsive_workers: workers
                .iter()
                .filter(|w| w.kind == WorkerKind::Remote && !w.responsive)
                .map(|w| w.worker_id.clone())
                .collect(),
        };

        metrics::gauge!("scheduler_success_rate_percent").set(report.success_rate);
        metrics::gauge!("scheduler_failure_rate_percent").set(report.failure_rate);
        metrics::gauge!("scheduler_average_execution_ms").set(report.average_execution_ms);
        metrics::gauge!("scheduler_distribution_balance_percent").set(report.distribution_balance);

        report
    }

    /// 检查阈值并上报告警
    ///
    /// 每个超出的阈值上报一个警告，每个无响应的远程Worker上报一个错误。
    /// 只要有告警，就额外上报一个性能警告并输出错误统计。
    pub fn check_alerts(&self, report: &PerformanceReport) -> Vec<PerformanceAlert> {
        self.log_metrics(report);

        let thresholds = &self.thresholds;
        let mut alerts = Vec::new();

        if report.success_rate < thresholds.success_rate_threshold {
            alerts.push(PerformanceAlert::LowSuccessRate {
                actual: report.success_rate,
                threshold: thresholds.success_rate_threshold,
            });
        }
        if report.failure_rate > thresholds.failure_rate_threshold {
            alerts.push(PerformanceAlert::HighFailureRate {
                actual: report.failure_rate,
                threshold: thresholds.failure_rate_threshold,
            });
        }
        if report.average_execution_ms > thresholds.average_time_threshold_ms {
            alerts.push(PerformanceAlert::SlowExecution {
                actual_ms: report.average_execution_ms,
                threshold_ms: thresholds.average_time_threshold_ms,
            });
        }
        if report.distribution_balance > thresholds.distribution_balance_threshold {
            alerts.push(PerformanceAlert::ImbalancedDistribution {
                actual: report.distribution_balance,
                threshold: thresholds.distribution_balance_threshold,
            });
        }
        for worker_id in &report.unresponsive_workers {
            alerts.push(PerformanceAlert::UnresponsiveWorker {
                worker_id: worker_id.clone(),
            });
        }

        for alert in &alerts {
            match alert {
                PerformanceAlert::UnresponsiveWorker { .. } => self.sink.record_error(&alert.message()),
                _ => self.sink.record_warning(&alert.message()),
            }
        }

        if !alerts.is_empty() {
            self.errors.record_performance_warning(
                "Unacceptable performance metrics detected! Printing error metrics.",
                self.sink.as_ref(),
            );
            self.errors.display_all_metrics(self.sink.as_ref());
        }

        alerts
    }

    fn log_metrics(&self, report: &PerformanceReport) {
        debug!(
            success_rate = report.success_rate,
            failure_rate = report.failure_rate,
            average_execution_ms = report.average_execution_ms,
            distribution_balance = report.distribution_balance,
            "性能指标"
        );
        self.sink
            .record_info(&format!("Success rate: {}%", report.success_rate));
        self.sink
            .record_info(&format!("Failure rate: {}%", report.failure_rate));
        self.sink.record_info(&format!(
            "Distribution deviation: {}%",
            report.distribution_balance
        ));
        self.sink.record_info(&format!(
            "Average execution time: {}ms",
            report.average_execution_ms
        ));
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

fn distribution_balance(workers: &[WorkerStats]) -> f64 {
    if workers.len() <= 1 {
        return 0.0;
    }
    let counts: Vec<f64> = workers
        .iter()
        .map(|w| w.metrics.tasks_executed as f64)
        .collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    round2(variance.sqrt() / mean * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_tracker::ErrorCategory;
    use crate::event_sink::NoopEventSink;
    use scheduler_core::Duration;

    fn stats(id: &str, kind: WorkerKind, executed: u64, completed: u64, total_ms: u64) -> WorkerStats {
        WorkerStats {
            worker_id: id.to_string(),
            kind,
            metrics: WorkerMetrics {
                tasks_executed: executed,
                tasks_completed: completed,
                tasks_failed: executed - completed,
                total_execution_time: Duration::of_millis(total_ms),
            },
            responsive: true,
        }
    }

    fn monitor() -> PerformanceMonitor {
        PerformanceMonitor::new(
            MonitorConfig::default(),
            Arc::new(NoopEventSink),
            Arc::new(ErrorTracker::new()),
        )
    }

    #[test]
    fn test_evaluate_rates() {
        let report = monitor().evaluate(&[
            stats("a", WorkerKind::Local, 2, 2, 40),
            stats("b", WorkerKind::Local, 1, 0, 20),
        ]);

        assert_eq!(report.total_executed, 3);
        assert_eq!(report.success_rate, 66.67);
        assert_eq!(report.failure_rate, 33.33);
        assert_eq!(report.average_execution_ms, 20.0);
    }

    #[test]
    fn test_evaluate_empty() {
        let report = monitor().evaluate(&[]);
        assert_eq!(report, PerformanceReport::default());
    }

    #[test]
    fn test_distribution_balance() {
        let monitor = monitor();

        let single = monitor.evaluate(&[stats("a", WorkerKind::Local, 5, 5, 10)]);
        assert_eq!(single.distribution_balance, 0.0);

        let even = monitor.evaluate(&[
            stats("a", WorkerKind::Local, 2, 2, 10),
            stats("b", WorkerKind::Local, 2, 2, 10),
        ]);
        assert_eq!(even.distribution_balance, 0.0);

        // counts 3 and 1: mean 2, std dev 1
        let uneven = monitor.evaluate(&[
            stats("a", WorkerKind::Local, 3, 3, 10),
            stats("b", WorkerKind::Local, 1, 1, 10),
        ]);
        assert_eq!(uneven.distribution_balance, 50.0);
    }

    #[test]
    fn test_check_alerts_healthy() {
        let monitor = monitor();
        let report = monitor.evaluate(&[
            stats("a", WorkerKind::Local, 2, 2, 40),
            stats("b", WorkerKind::Local, 2, 2, 40),
        ]);

        assert!(monitor.check_alerts(&report).is_empty());
        assert_eq!(monitor.error_tracker().count(ErrorCategory::Performance), 0);
    }

    #[test]
    fn test_check_alerts_breaches() {
        let monitor = monitor();
        let mut remote = stats("r", WorkerKind::Remote, 1, 0, 500);
        remote.responsive = false;
        let report = monitor.evaluate(&[stats("a", WorkerKind::Local, 1, 1, 10), remote]);

        let alerts = monitor.check_alerts(&report);

        assert!(alerts.iter().any(|a| matches!(a, PerformanceAlert::LowSuccessRate { .. })));
        assert!(alerts.iter().any(|a| matches!(a, PerformanceAlert::HighFailureRate { .. })));
        assert!(alerts.iter().any(|a| matches!(a, PerformanceAlert::SlowExecution { .. })));
        assert!(alerts.contains(&PerformanceAlert::UnresponsiveWorker {
            worker_id: "r".to_string()
        }));
        assert_eq!(monitor.error_tracker().count(ErrorCategory::Performance), 1);
    }
}
