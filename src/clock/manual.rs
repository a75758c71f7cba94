use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::{TimeSource, TimeUnit};
use crate::layout::MAX_TIME_BUCKET;

/// 手动拨动的时钟，clone 出来的副本共享同一个时间
#[derive(Debug, Clone)]
pub struct ManualClock {
    unit: TimeUnit,
    bucket: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(unit: TimeUnit, bucket: i64) -> Self {
        Self {
            unit,
            bucket: Arc::new(AtomicI64::new(bucket & MAX_TIME_BUCKET)),
        }
    }

    pub fn set(&self, bucket: i64) {
        self.bucket.store(bucket & MAX_TIME_BUCKET, Ordering::Release);
    }

    pub fn advance(&self, units: i64) {
        let next = self.bucket.load(Ordering::Acquire) + units;
        self.set(next);
    }
}

impl TimeSource for ManualClock {
    fn current_bucket(&self) -> i64 {
        self.bucket.load(Ordering::Acquire)
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn epoch(&self) -> i64 {
        0
    }
}
