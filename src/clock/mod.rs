//! 时间源
//!
//! 生成器通过 [`TimeSource`] 拿到当前的时间桶 (bucket)，
//! 桶 = (当前时间 - epoch)，按 [`TimeUnit`] 取整后截断到41位。
//!
//! - [`SystemClock`]: 每次都直接读系统时钟
//! - [`CachedClock`]: 后台线程每1毫秒刷新一次缓存，调用方只做原子读
//! - [`ManualClock`]: 手动设置的时钟，测试用

pub mod cached;
pub mod manual;
pub mod system;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::layout::MAX_TIME_BUCKET;

pub use cached::CachedClock;
pub use manual::ManualClock;
pub use system::SystemClock;

/// 时间桶的单位，同一批消费者只能用同一种单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
}

impl TimeUnit {
    /// unix 时间，时钟早于 1970 时返回0
    pub fn read(self, now: SystemTime) -> i64 {
        let elapsed = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        match self {
            TimeUnit::Seconds => elapsed.as_secs() as i64,
            TimeUnit::Milliseconds => elapsed.as_millis() as i64,
        }
    }

    /// 一个时间桶的长度，序号用完后至少要等这么久
    pub fn tick(self) -> Duration {
        self.duration_of(1)
    }

    pub fn duration_of(self, units: i64) -> Duration {
        let units = units.max(0) as u64;
        match self {
            TimeUnit::Seconds => Duration::from_secs(units),
            TimeUnit::Milliseconds => Duration::from_millis(units),
        }
    }
}

pub(crate) fn bucket_of(now: SystemTime, unit: TimeUnit, epoch: i64) -> i64 {
    unit.read(now).saturating_sub(epoch).max(0) & MAX_TIME_BUCKET
}

/// 提供当前时间桶
///
/// 带后台任务的实现需要在使用前 `start`，退役时 `stop`；
/// 其余实现的生命周期方法都是空操作。
pub trait TimeSource: Send + Sync {
    fn current_bucket(&self) -> i64;

    fn unit(&self) -> TimeUnit;

    fn epoch(&self) -> i64;

    /// 是否依赖 `start` 启动的后台任务刷新时间
    fn needs_start(&self) -> bool {
        false
    }

    /// 返回 true 表示这次调用真正启动了后台任务
    fn start(&self) -> bool {
        false
    }

    fn stop(&self) {}

    fn is_running(&self) -> bool {
        false
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn current_bucket(&self) -> i64 {
        (**self).current_bucket()
    }

    fn unit(&self) -> TimeUnit {
        (**self).unit()
    }

    fn epoch(&self) -> i64 {
        (**self).epoch()
    }

    fn needs_start(&self) -> bool {
        (**self).needs_start()
    }

    fn start(&self) -> bool {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}
