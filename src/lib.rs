//! 分布式雪花ID生成器
//!
//! 每个生产者带一个 4 位的机器编号，生成 63 位、可排序、全局唯一的整数ID，
//! 发号时不需要和其他生产者协调。机器编号的分配由调用方负责。
//!
//! ```no_run
//! use tz_snowflake::{Generator, TimeUnit};
//!
//! let generator = Generator::system(5, 0, TimeUnit::Milliseconds).unwrap();
//! let id = generator.next_id().unwrap();
//! assert_eq!(generator.decode(id).machine_id, 5);
//! ```

pub mod clock;
pub mod config;
pub mod errors;
pub mod generator;
pub mod layout;

pub use clock::{CachedClock, ManualClock, SystemClock, TimeSource, TimeUnit};
pub use config::{ClockStrategy, GeneratorConfig};
pub use errors::{IdError, IdResult};
pub use generator::Generator;
pub use layout::{compose, decode, DecodedId};
