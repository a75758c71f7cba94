//! ID 的位布局
//!
//! 1位0, 41位时间, 4位随机数, 4位机器编号, 14位序号 (从高到低)

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::clock::TimeUnit;

pub const SEQUENCE_BITS: u32 = 14;
pub const MACHINE_ID_BITS: u32 = 4;
pub const RANDOM_BITS: u32 = 4;
pub const TIME_BITS: u32 = 41;

pub const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_MACHINE_ID: i64 = (1 << MACHINE_ID_BITS) - 1;
pub const MAX_RANDOM: i64 = (1 << RANDOM_BITS) - 1;
pub const MAX_TIME_BUCKET: i64 = (1 << TIME_BITS) - 1;

pub const MACHINE_ID_SHIFT: u32 = SEQUENCE_BITS;
pub const RANDOM_SHIFT: u32 = MACHINE_ID_SHIFT + MACHINE_ID_BITS;
pub const TIME_SHIFT: u32 = RANDOM_SHIFT + RANDOM_BITS;

/// 每个字段先按位宽截断再拼接，结果最高位恒为0
pub fn compose(time_bucket: i64, machine_id: i64, random: i64, sequence: i64) -> i64 {
    (sequence & MAX_SEQUENCE)
        | ((machine_id & MAX_MACHINE_ID) << MACHINE_ID_SHIFT)
        | ((random & MAX_RANDOM) << RANDOM_SHIFT)
        | ((time_bucket & MAX_TIME_BUCKET) << TIME_SHIFT)
}

pub fn decode(id: i64) -> DecodedId {
    DecodedId {
        time_bucket: (id >> TIME_SHIFT) & MAX_TIME_BUCKET,
        random: (id >> RANDOM_SHIFT) & MAX_RANDOM,
        machine_id: (id >> MACHINE_ID_SHIFT) & MAX_MACHINE_ID,
        sequence: id & MAX_SEQUENCE,
    }
}

/// 拆开后的各个字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedId {
    pub time_bucket: i64,
    pub random: i64,
    pub machine_id: i64,
    pub sequence: i64,
}

impl DecodedId {
    /// 还原成 unix 时间, 单位与生成时的 `unit` 一致
    ///
    /// 时间字段只有41位，超过 2^41 个单位后会回绕，这里不做处理。
    pub fn unix_time(&self, epoch: i64) -> i64 {
        self.time_bucket + epoch
    }

    pub fn system_time(&self, unit: TimeUnit, epoch: i64) -> SystemTime {
        UNIX_EPOCH + unit.duration_of(self.unix_time(epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fills_63_bits() {
        assert_eq!(TIME_SHIFT + TIME_BITS, 63);
        assert_eq!(MAX_SEQUENCE, 16383);
        assert_eq!(MAX_MACHINE_ID, 15);
    }

    #[test]
    fn compose_places_fields() {
        let id = compose(3, 5, 9, 17);
        assert_eq!(id, 17 | (5 << 14) | (9 << 18) | (3 << 22));

        let fields = decode(id);
        assert_eq!(fields.time_bucket, 3);
        assert_eq!(fields.random, 9);
        assert_eq!(fields.machine_id, 5);
        assert_eq!(fields.sequence, 17);
    }

    #[test]
    fn compose_masks_overflowing_fields() {
        // 超宽的值只保留低位，不会串到相邻字段
        let id = compose(MAX_TIME_BUCKET + 2, 0x1F, 0x13, MAX_SEQUENCE + 3);
        let fields = decode(id);
        assert_eq!(fields.time_bucket, 1);
        assert_eq!(fields.machine_id, 0xF);
        assert_eq!(fields.random, 0x3);
        assert_eq!(fields.sequence, 2);
    }

    #[test]
    fn max_fields_stay_non_negative() {
        let id = compose(MAX_TIME_BUCKET, MAX_MACHINE_ID, MAX_RANDOM, MAX_SEQUENCE);
        assert!(id > 0);
        assert_eq!(id, i64::MAX);
    }

    #[test]
    fn unix_time_adds_epoch_back() {
        let fields = decode(compose(1_000, 1, 0, 0));
        assert_eq!(fields.unix_time(1_600_000_000), 1_600_001_000);
        assert_eq!(
            fields.system_time(TimeUnit::Seconds, 1_600_000_000),
            UNIX_EPOCH + std::time::Duration::from_secs(1_600_001_000)
        );
    }
}
