//! 任意精度的时间间隔
//!
//! 以毫秒为单位的非负整数，内部使用 `BigUint` 表示，加减运算不会溢出也不会丢失精度。
//! 用于任务的预计执行时间、超时时间以及Worker的负载统计。

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// 毫秒时间间隔（不可变）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Duration {
    millis: BigUint,
}

impl Duration {
    /// 从毫秒数创建
    pub fn of_millis(millis: u64) -> Self {
        Self {
            millis: BigUint::from(millis),
        }
    }

    pub fn from_big(millis: BigUint) -> Self {
        Self { millis }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// 返回新的实例，原值不变
    pub fn plus(&self, other: &Duration) -> Duration {
        Duration {
            millis: &self.millis + &other.millis,
        }
    }

    /// 结果非负：减去更大的值得到0
    pub fn subtract(&self, other: &Duration) -> Duration {
        self.checked_sub(other).unwrap_or_default()
    }

    pub fn checked_sub(&self, other: &Duration) -> Option<Duration> {
        if self.millis >= other.millis {
            Some(Duration {
                millis: &self.millis - &other.millis,
            })
        } else {
            None
        }
    }

    /// 乘以整数倍，默认超时为预计时间的2倍
    pub fn times(&self, factor: u32) -> Duration {
        Duration {
            millis: &self.millis * BigUint::from(factor),
        }
    }

    pub fn compare(&self, other: &Duration) -> Ordering {
        self.millis.cmp(&other.millis)
    }

    pub fn as_millis(&self) -> &BigUint {
        &self.millis
    }

    pub fn is_zero(&self) -> bool {
        self.millis.is_zero()
    }

    /// 超出 `u64` 范围时取 `u64::MAX`
    pub fn millis_u64_saturating(&self) -> u64 {
        self.millis.to_u64().unwrap_or(u64::MAX)
    }

    /// 转换为标准库的 Duration，用于 sleep / timeout
    pub fn to_std(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.millis_u64_saturating())
    }
}

impl From<u64> for Duration {
    fn from(millis: u64) -> Self {
        Duration::of_millis(millis)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration {
            millis: self.millis + rhs.millis,
        }
    }
}

impl<'a> Add<&'a Duration> for &'a Duration {
    type Output = Duration;

    fn add(self, rhs: &'a Duration) -> Duration {
        self.plus(rhs)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        self.subtract(&rhs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}
