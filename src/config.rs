use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::clock::{CachedClock, SystemClock, TimeSource, TimeUnit};
use crate::errors::{IdError, IdResult};
use crate::generator::Generator;

/// 取时间的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClockStrategy {
    /// 每次都读系统时钟
    #[default]
    System,
    /// 后台线程每1毫秒刷新一次
    Cached,
}

/// 生成器配置, 缺省字段取默认值
///
/// ```json
/// { "machine_id": 3, "epoch": 1700000000000, "unit": "milliseconds", "clock": "cached" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub machine_id: i64,
    /// 与 `unit` 同单位的 unix 时间
    pub epoch: i64,
    pub unit: TimeUnit,
    pub clock: ClockStrategy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            machine_id: 0,
            epoch: 0,
            unit: TimeUnit::Milliseconds,
            clock: ClockStrategy::System,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(content: &str) -> IdResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> IdResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// epoch 在未来时所有ID都会落在0号桶，很快就发不出号
    pub fn validate(&self) -> IdResult<()> {
        if self.epoch < 0 {
            return Err(IdError::Config(format!("epoch不能为负数: {}", self.epoch)));
        }
        let now = self.unit.read(SystemTime::now());
        if self.epoch > now {
            return Err(IdError::Config(format!(
                "epoch {} 晚于当前时间 {now} ({:?})",
                self.epoch, self.unit
            )));
        }
        Ok(())
    }

    /// 按配置创建生成器, cached 时钟需要调用方自己 start
    pub fn build(&self) -> IdResult<Generator<Box<dyn TimeSource>>> {
        self.validate()?;
        let source: Box<dyn TimeSource> = match self.clock {
            ClockStrategy::System => Box::new(SystemClock::new(self.unit, self.epoch)),
            ClockStrategy::Cached => Box::new(CachedClock::new(self.unit, self.epoch)),
        };
        Generator::new(self.machine_id, source)
    }
}
