use std::time::SystemTime;

use super::{bucket_of, TimeSource, TimeUnit};

/// 同步时钟，每次调用都读一次系统时间
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    unit: TimeUnit,
    epoch: i64,
}

impl SystemClock {
    pub fn new(unit: TimeUnit, epoch: i64) -> Self {
        Self { unit, epoch }
    }
}

impl TimeSource for SystemClock {
    fn current_bucket(&self) -> i64 {
        bucket_of(SystemTime::now(), self.unit, self.epoch)
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn epoch(&self) -> i64 {
        self.epoch
    }
}
