use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use scheduler_core::{SchedulerError, SchedulerResult, Task, WorkerLoad};

/// 参与选择的Worker，按注册顺序排列
#[derive(Debug, Clone, Copy)]
pub struct WorkerCandidate<'a> {
    pub worker_id: &'a str,
    pub load: &'a WorkerLoad,
}

/// 任务放置策略
///
/// 返回候选列表中被选中Worker的下标，没有候选时返回 `None`。
pub trait PlacementStrategy: Send + Sync {
    fn select_worker(&self, task: &dyn Task, candidates: &[WorkerCandidate<'_>]) -> Option<usize>;

    fn name(&self) -> &str;
}

/// 最小负载策略：负载分数最低者胜出，分数相同时取最早注册的Worker
#[derive(Debug, Default)]
pub struct LeastLoadedStrategy;

impl LeastLoadedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl PlacementStrategy for LeastLoadedStrategy {
    fn select_worker(&self, task: &dyn Task, candidates: &[WorkerCandidate<'_>]) -> Option<usize> {
        if candidates.is_empty() {
            debug!("没有可用的Worker节点");
            return None;
        }
        // min_by_key 在相等时返回第一个元素
        let (index, selected) = candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, candidate)| candidate.load.score())?;

        debug!(
            "负载均衡策略为任务 {} 选择Worker: {} (负载: {})",
            task.id(),
            selected.worker_id,
            selected.load.score()
        );
        Some(index)
    }

    fn name(&self) -> &str {
        "LeastLoaded"
    }
}

/// 轮询策略
#[derive(Debug)]
pub struct RoundRobinStrategy {
    counter: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementStrategy for RoundRobinStrategy {
    fn select_worker(&self, task: &dyn Task, candidates: &[WorkerCandidate<'_>]) -> Option<usize> {
        if candidates.is_empty() {
            debug!("没有可用的Worker节点");
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % candidates.len();

        debug!(
            "轮询策略为任务 {} 选择Worker: {} (索引: {}/{})",
            task.id(),
            candidates[index].worker_id,
            index,
            candidates.len()
        );
        Some(index)
    }

    fn name(&self) -> &str {
        "RoundRobin"
    }
}

/// 按配置名称创建策略
pub fn strategy_from_name(name: &str) -> SchedulerResult<Box<dyn PlacementStrategy>> {
    match name {
        "least_loaded" => Ok(Box::new(LeastLoadedStrategy::new())),
        "round_robin" => Ok(Box::new(RoundRobinStrategy::new())),
        other => Err(SchedulerError::config_error(format!(
            "未知的放置策略: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use scheduler_core::tasks::SimpleTask;
    use scheduler_core::Duration;

    use super::*;

    fn load(task_count: u64, total_ms: u64) -> WorkerLoad {
        WorkerLoad {
            task_count,
            total_duration: Duration::of_millis(total_ms),
        }
    }

    fn task() -> SimpleTask {
        SimpleTask::new("t", Duration::of_millis(10))
    }

    #[test]
    fn test_least_loaded_picks_minimum_score() {
        let loads = [load(2, 100), load(1, 20), load(3, 30)];
        let candidates: Vec<_> = ["a", "b", "c"]
            .iter()
            .zip(loads.iter())
            .map(|(id, load)| WorkerCandidate { worker_id: *id, load })
            .collect();

        assert_eq!(LeastLoadedStrategy::new().select_worker(&task(), &candidates), Some(1));
    }

    #[test]
    fn test_least_loaded_tie_goes_to_first_registered() {
        let loads = [load(1, 10), load(0, 0), load(0, 0)];
        let candidates: Vec<_> = ["a", "b", "c"]
            .iter()
            .zip(loads.iter())
            .map(|(id, load)| WorkerCandidate { worker_id: *id, load })
            .collect();

        assert_eq!(LeastLoadedStrategy::new().select_worker(&task(), &candidates), Some(1));
    }

    #[test]
    fn test_score_counts_tasks_and_duration_equally() {
        // 10 个 1ms 任务 (20) 与 1 个 15ms 任务 (16)
        let loads = [load(10, 10), load(1, 15)];
        let candidates: Vec<_> = ["many", "one"]
            .iter()
            .zip(loads.iter())
            .map(|(id, load)| WorkerCandidate { worker_id: *id, load })
            .collect();

        assert_eq!(LeastLoadedStrategy::new().select_worker(&task(), &candidates), Some(1));
    }

    #[test]
    fn test_round_robin_cycles() {
        let loads = [load(0, 0), load(0, 0)];
        let candidates: Vec<_> = ["a", "b"]
            .iter()
            .zip(loads.iter())
            .map(|(id, load)| WorkerCandidate { worker_id: *id, load })
            .collect();
        let strategy = RoundRobinStrategy::new();

        let picks: Vec<_> = (0..4)
            .filter_map(|_| strategy.select_worker(&task(), &candidates))
            .collect();
        assert_eq!(picks, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(LeastLoadedStrategy::new().select_worker(&task(), &[]), None);
        assert_eq!(RoundRobinStrategy::new().select_worker(&task(), &[]), None);
    }

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(strategy_from_name("least_loaded").unwrap().name(), "LeastLoaded");
        assert_eq!(strategy_from_name("round_robin").unwrap().name(), "RoundRobin");
        assert!(strategy_from_name("random").is_err());
    }
}
