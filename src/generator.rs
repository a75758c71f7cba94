//! 雪花ID生成器
//!
//! 一个实例对应一个机器编号，实例内部用互斥锁串行化 `next_id`；
//! 不同机器编号的实例之间不需要任何协调。

use std::sync::{Mutex, PoisonError};

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::clock::{CachedClock, SystemClock, TimeSource, TimeUnit};
use crate::errors::{IdError, IdResult};
use crate::layout::{self, DecodedId, MAX_MACHINE_ID, MAX_RANDOM, MAX_SEQUENCE};

#[derive(Debug, Default)]
struct State {
    /// 上一次发号时的时间桶，还没发过号时为 None
    time_bucket: Option<i64>,
    /// 当前桶内下一个要用的序号
    sequence: i64,
}

pub struct Generator<T: TimeSource> {
    machine_id: i64,
    source: T,
    state: Mutex<State>,
}

impl Generator<SystemClock> {
    pub fn system(machine_id: i64, epoch: i64, unit: TimeUnit) -> IdResult<Self> {
        Self::new(machine_id, SystemClock::new(unit, epoch))
    }
}

impl Generator<CachedClock> {
    /// 使用前需要调用 [`Generator::start`]
    pub fn cached(machine_id: i64, epoch: i64, unit: TimeUnit) -> IdResult<Self> {
        Self::new(machine_id, CachedClock::new(unit, epoch))
    }
}

impl<T: TimeSource> Generator<T> {
    pub fn new(machine_id: i64, source: T) -> IdResult<Self> {
        if !(0..=MAX_MACHINE_ID).contains(&machine_id) {
            return Err(IdError::InvalidMachineId(machine_id));
        }
        Ok(Self {
            machine_id,
            source,
            state: Mutex::new(State::default()),
        })
    }

    /// 生成下一个ID
    ///
    /// 同一个时间桶内最多发 `MAX_SEQUENCE + 1` 个号，用完后返回
    /// [`IdError::SequenceExhausted`] 且不改变任何状态，调用方应等待
    /// 至少一个时间单位后重试。
    ///
    /// 时钟回拨不做修正：拿到的桶和上一次不同就视为新桶、序号归零。
    ///
    /// 需要 `start` 的时间源没有启动时照常发号，用的是缓存里的旧时间
    /// (从未启动过为0)，进入新桶时会打一条 `warn!`。
    pub fn next_id(&self) -> IdResult<i64> {
        // 锁内只有两个整数，每条语句之间都是一致的，中毒了也可以继续用
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = self.source.current_bucket();

        match state.time_bucket {
            Some(last) if last == bucket => {
                if state.sequence > MAX_SEQUENCE {
                    debug!(machine_id = self.machine_id, bucket, "序号已用完");
                    return Err(IdError::SequenceExhausted { time_bucket: bucket });
                }
            }
            last => {
                if let Some(last) = last.filter(|last| bucket < *last) {
                    warn!(machine_id = self.machine_id, last, bucket, "时钟回拨");
                }
                if self.source.needs_start() && !self.source.is_running() {
                    warn!(machine_id = self.machine_id, bucket, "时间源未启动, 使用的是缓存的旧时间");
                }
                trace!(machine_id = self.machine_id, bucket, "进入新的时间桶");
                state.time_bucket = Some(bucket);
                state.sequence = 0;
            }
        }

        let random = rand::rng().random_range(0..=MAX_RANDOM);
        let id = layout::compose(bucket, self.machine_id, random, state.sequence);
        state.sequence += 1;
        Ok(id)
    }

    /// 启动时间源的后台任务，重复调用是空操作
    pub fn start(&self) -> bool {
        self.source.start()
    }

    pub fn stop(&self) {
        self.source.stop()
    }

    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }

    pub fn machine_id(&self) -> i64 {
        self.machine_id
    }

    pub fn unit(&self) -> TimeUnit {
        self.source.unit()
    }

    pub fn epoch(&self) -> i64 {
        self.source.epoch()
    }

    pub fn time_source(&self) -> &T {
        &self.source
    }

    pub fn decode(&self, id: i64) -> DecodedId {
        layout::decode(id)
    }
}
