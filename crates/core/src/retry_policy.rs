use serde::{Deserialize, Serialize};

use crate::duration::Duration;

/// 退避指数上限
const MAX_BACKOFF_EXPONENT: u32 = 1024;

/// 重试策略
///
/// 不可变：最大重试次数、基础延迟以及是否使用指数退避。
/// 尝试次数从1开始计数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::of_millis(1000), true)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, exponential_backoff: bool) -> Self {
        Self {
            max_retries,
            base_delay,
            exponential_backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> &Duration {
        &self.base_delay
    }

    pub fn exponential_backoff(&self) -> bool {
        self.exponential_backoff
    }

    /// 是否允许第 `attempt` 次尝试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// 第 `attempt` 次失败后的等待时间
    ///
    /// 固定延迟时返回 `base_delay`，否则返回 `base_delay * 2^(attempt-1)`。
    /// attempt 为0时按1处理，指数超过上限时取上限。
    pub fn delay(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.base_delay.clone();
        }
        let exponent = (attempt.max(1) - 1).min(MAX_BACKOFF_EXPONENT);
        let factor = num_bigint::BigUint::from(1u32) << exponent as usize;
        Duration::from_big(self.base_delay.as_millis() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::new(3, Duration::of_millis(100), true);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_exponential_delay() {
        let policy = RetryPolicy::new(5, Duration::of_millis(100), true);
        assert_eq!(policy.delay(1), Duration::of_millis(100));
        assert_eq!(policy.delay(2), Duration::of_millis(200));
        assert_eq!(policy.delay(3), Duration::of_millis(400));
        assert_eq!(policy.delay(4), Duration::of_millis(800));
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::new(5, Duration::of_millis(250), false);
        for attempt in 1..=5 {
            assert_eq!(policy.delay(attempt), Duration::of_millis(250));
        }
    }

    #[test]
    fn test_attempt_zero_is_treated_as_first() {
        let policy = RetryPolicy::new(3, Duration::of_millis(100), true);
        assert_eq!(policy.delay(0), Duration::of_millis(100));
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let policy = RetryPolicy::new(u32::MAX, Duration::of_millis(1), true);
        let delay = policy.delay(100);
        assert_eq!(delay.millis_u64_saturating(), u64::MAX);
        assert_eq!(
            delay.as_millis(),
            &(num_bigint::BigUint::from(1u32) << 99usize)
        );
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.base_delay(), &Duration::of_millis(1000));
        assert!(policy.exponential_backoff());
    }
}
