use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// 闭合：允许请求
    Closed,
    /// 断开：超时之前拒绝请求
    Open,
}

/// 熔断器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// 连续失败多少次后断开
    pub failure_threshold: u32,
    /// 距最后一次失败超过该时间后，断开的熔断器重新闭合
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(100),
        }
    }
}

/// 熔断器统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub times_opened: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    total_failures: u64,
    times_opened: u64,
    last_failure: Option<Instant>,
}

/// 单个Worker的熔断器
///
/// 检查并重置与记录失败共用一把锁，并发的 `report_failure` 不会与闭合切换交错。
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new<S: Into<String>>(name: S, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                total_failures: 0,
                times_opened: 0,
                last_failure: None,
            }),
        }
    }

    pub fn with_threshold<S: Into<String>>(name: S, failure_threshold: u32, timeout: Duration) -> Self {
        Self::new(
            name,
            CircuitBreakerConfig {
                failure_threshold,
                recovery_timeout: timeout,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 恢复超时，也是拒绝请求前的等待时间
    pub fn timeout(&self) -> Duration {
        self.config.recovery_timeout
    }

    pub fn failure_threshold(&self) -> u32 {
        self.config.failure_threshold
    }

    /// 检查是否允许发送请求
    ///
    /// 断开状态下若距最后一次失败已超过超时时间，则在此闭合并清零失败计数。
    pub async fn can_send_request(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed > self.config.recovery_timeout {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    info!("熔断器 {} 已关闭，恢复请求", self.name);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// 记录一次失败
    pub async fn report_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.total_failures += 1;
        inner.last_failure = Some(Instant::now());

        if inner.state == CircuitState::Closed
            && inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            inner.times_opened += 1;
            warn!(
                "熔断器 {} 已打开: 连续失败 {} 次",
                self.name, inner.consecutive_failures
            );
            metrics::counter!("scheduler_circuit_breaker_opened_total").increment(1);
        }
    }

    /// 记录一次成功，闭合状态下清零连续失败计数
    pub async fn report_success(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == CircuitState::Closed {
            inner.consecutive_failures = 0;
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock().await;
        CircuitBreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_failures: inner.total_failures,
            times_opened: inner.times_opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_circuit_breaker_closed_state() {
        let cb = CircuitBreaker::with_threshold("remote-1", 3, Duration::from_millis(100));

        assert_eq!(cb.state().await, CircuitState::Closed);
        assert!(cb.can_send_request().await);

        cb.report_failure().await;
        cb.report_failure().await;
        assert_eq!(cb.state().await, CircuitState::Closed);
        assert!(cb.can_send_request().await);
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_exactly_at_threshold() {
        let cb = CircuitBreaker::with_threshold("remote-1", 3, Duration::from_secs(60));

        for _ in 0..2 {
            cb.report_failure().await;
        }
        assert!(cb.can_send_request().await);

        cb.report_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);
        assert!(!cb.can_send_request().await);

        let stats = cb.stats().await;
        assert_eq!(stats.consecutive_failures, 3);
        assert_eq!(stats.total_failures, 3);
        assert_eq!(stats.times_opened, 1);
    }

    #[tokio::test]
    async fn test_circuit_breaker_recovery() {
        let cb = CircuitBreaker::with_threshold("remote-1", 2, Duration::from_millis(100));

        cb.report_failure().await;
        cb.report_failure().await;
        assert!(!cb.can_send_request().await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!cb.can_send_request().await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cb.can_send_request().await);
        assert_eq!(cb.state().await, CircuitState::Closed);
        assert_eq!(cb.stats().await.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_failure_while_open_extends_wait() {
        let cb = CircuitBreaker::with_threshold("remote-1", 1, Duration::from_millis(100));

        cb.report_failure().await;
        tokio::time::sleep(Duration::from_millis(70)).await;
        cb.report_failure().await;
        tokio::time::sleep(Duration::from_millis(70)).await;

        // 距第一次失败140ms，距最后一次失败只有70ms
        assert!(!cb.can_send_request().await);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let cb = CircuitBreaker::with_threshold("remote-1", 2, Duration::from_secs(60));

        cb.report_failure().await;
        cb.report_success().await;
        cb.report_failure().await;

        assert_eq!(cb.state().await, CircuitState::Closed);
        let stats = cb.stats().await;
        assert_eq!(stats.consecutive_failures, 1);
        assert_eq!(stats.total_failures, 2);
    }

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 1);
        assert_eq!(config.recovery_timeout, Duration::from_millis(100));
    }
}
