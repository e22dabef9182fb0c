use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::duration::Duration;
use crate::retry_policy::RetryPolicy;

pub const PLACEMENT_STRATEGIES: [&str; 2] = ["least_loaded", "round_robin"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub exponential_backoff: bool,
    pub placement_strategy: String, // "least_loaded", "round_robin"
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1000,
            exponential_backoff: true,
            placement_strategy: "least_loaded".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !PLACEMENT_STRATEGIES.contains(&self.placement_strategy.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的分配策略: {}，支持的策略: {:?}",
                self.placement_strategy,
                PLACEMENT_STRATEGIES
            ));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::of_millis(self.retry_base_delay_ms),
            self.exponential_backoff,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub local_workers: usize,
    pub remote_workers: usize,
    pub failure_threshold: u32,
    pub breaker_timeout_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            local_workers: 2,
            remote_workers: 1,
            failure_threshold: 1,
            breaker_timeout_ms: 100,
            max_latency_ms: 100,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.local_workers + self.remote_workers == 0 {
            return Err(anyhow::anyhow!("至少需要配置一个Worker"));
        }

        if self.failure_threshold == 0 {
            return Err(anyhow::anyhow!("熔断失败阈值必须大于0"));
        }

        if self.breaker_timeout_ms == 0 {
            return Err(anyhow::anyhow!("熔断恢复时间必须大于0"));
        }

        Ok(())
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: StdDuration::from_millis(self.breaker_timeout_ms),
        }
    }
}
