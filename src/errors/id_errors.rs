///
/// IdError 实现了：
/// 1：Debug        -> 用来支持显示
/// 2：Display      -> 用来支持显示
/// 3：std::error::Error -> 说明自己是个Error类型
///
/// 只有 SequenceExhausted 会由 next_id 返回，其余都出现在构造或读取配置时。
use thiserror::Error;

pub type IdResult<T> = std::result::Result<T, IdError>;

#[derive(Error, Debug)]
pub enum IdError {
    #[error("超出了序列号范围,请稍候重试 (time_bucket: {time_bucket})")]
    SequenceExhausted { time_bucket: i64 },
    #[error("机器编号{0}超出范围, 必须在[0, 16)之内")]
    InvalidMachineId(i64),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("读取配置失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置不是合法的json: {0}")]
    Json(#[from] serde_json::Error),
}

impl IdError {
    /// 等待一个时间单位后重试是否可能成功
    pub fn is_retryable(&self) -> bool {
        matches!(self, IdError::SequenceExhausted { .. })
    }
}
