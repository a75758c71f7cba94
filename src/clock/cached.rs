use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime};

use crossbeam::utils::CachePadded;
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use tracing::{debug, error};

use super::{bucket_of, TimeSource, TimeUnit};

pub const REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// 一次 start 对应的后台线程，每次启动都用新的 stop 通道
struct Runner {
    stop_tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
}

/// 后台线程定时刷新的缓存时钟
///
/// `current_bucket` 只做一次原子读，最多落后 [`REFRESH_INTERVAL`]。
/// 使用前先 `start`，`start` 会先同步刷新一次缓存，之后由后台线程接管。
/// 未启动时读到的是上一次缓存的值 (从未启动过则为0)。
pub struct CachedClock {
    unit: TimeUnit,
    epoch: i64,
    /// 单写多读，写者只有当前的后台线程
    bucket: Arc<CachePadded<AtomicI64>>,
    runner: Mutex<Option<Runner>>,
}

impl CachedClock {
    pub fn new(unit: TimeUnit, epoch: i64) -> Self {
        Self {
            unit,
            epoch,
            bucket: Arc::new(CachePadded::new(AtomicI64::new(0))),
            runner: Mutex::new(None),
        }
    }

    fn runner(&self) -> MutexGuard<'_, Option<Runner>> {
        self.runner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh(bucket: &AtomicI64, unit: TimeUnit, epoch: i64) {
        bucket.store(bucket_of(SystemTime::now(), unit, epoch), Ordering::Release);
    }

    fn run(
        bucket: Arc<CachePadded<AtomicI64>>,
        stop_rx: Receiver<()>,
        cancelled: Arc<AtomicBool>,
        unit: TimeUnit,
        epoch: i64,
    ) {
        let ticker = tick(REFRESH_INTERVAL);
        loop {
            select! {
                // 收到信号或 Sender 被丢弃都退出
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    // stop 之后可能已经有新线程在写，旧线程不再写
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    Self::refresh(&bucket, unit, epoch);
                }
            }
        }
        debug!("缓存时钟刷新线程退出");
    }
}

impl TimeSource for CachedClock {
    fn current_bucket(&self) -> i64 {
        self.bucket.load(Ordering::Acquire)
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn epoch(&self) -> i64 {
        self.epoch
    }

    fn needs_start(&self) -> bool {
        true
    }

    fn start(&self) -> bool {
        let mut runner = self.runner();
        // 已运行
        if runner.is_some() {
            return false;
        }

        Self::refresh(&self.bucket, self.unit, self.epoch);

        // 容量为1，stop 用 try_send，不会阻塞
        let (stop_tx, stop_rx) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let bucket = Arc::clone(&self.bucket);
        let thread_cancelled = Arc::clone(&cancelled);
        let (unit, epoch) = (self.unit, self.epoch);
        let spawned = thread::Builder::new()
            .name("snowflake-clock".into())
            .spawn(move || Self::run(bucket, stop_rx, thread_cancelled, unit, epoch));

        match spawned {
            Ok(_) => {
                debug!(?unit, epoch, "缓存时钟刷新线程启动");
                *runner = Some(Runner { stop_tx, cancelled });
                true
            }
            Err(e) => {
                error!("缓存时钟刷新线程启动失败: {e}");
                false
            }
        }
    }

    /// 不等待后台线程退出；没有在运行时是空操作
    fn stop(&self) {
        if let Some(runner) = self.runner().take() {
            runner.cancelled.store(true, Ordering::Release);
            let _ = runner.stop_tx.try_send(());
        }
    }

    fn is_running(&self) -> bool {
        self.runner().is_some()
    }
}

impl Drop for CachedClock {
    fn drop(&mut self) {
        self.stop();
    }
}
