//! Status codes and error types for collective I/O
//!
//! 集合 I/O 的状态码与错误类型

use std::fmt;
use std::io;

/// Completion code of one record transfer or one collective call
///
/// 单次记录传输或单次集合调用的完成码
///
/// `0` is success; any other value is an implementation-defined failure
/// reported by the record I/O primitive and passed through unchanged.
///
/// `0` 表示成功；其他值是记录 I/O 原语报告的失败码，原样透传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IoStatus(i32);

impl IoStatus {
    /// Successful completion
    ///
    /// 成功完成
    pub const SUCCESS: IoStatus = IoStatus(0);

    /// A read ran past the end of the record stream
    ///
    /// 读取越过记录流末尾
    pub const END_OF_FILE: IoStatus = IoStatus(-1);

    /// A write did not fit in the record stream
    ///
    /// 写入超出记录流容量
    pub const RECORD_OVERFLOW: IoStatus = IoStatus(1);

    /// The caller's buffer cannot hold the requested elements
    ///
    /// 调用者缓冲区容纳不下所请求的元素
    pub const SHORT_BUFFER: IoStatus = IoStatus(2);

    /// Wrap a raw status code
    ///
    /// 包装原始状态码
    #[inline]
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Get the raw status code
    ///
    /// 获取原始状态码
    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_failure(self) -> bool {
        self.0 != 0
    }
}

impl From<i32> for IoStatus {
    #[inline]
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<IoStatus> for i32 {
    #[inline]
    fn from(status: IoStatus) -> Self {
        status.0
    }
}

impl fmt::Display for IoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IoStatus::SUCCESS => write!(f, "success"),
            IoStatus::END_OF_FILE => write!(f, "end of file ({})", self.0),
            IoStatus::RECORD_OVERFLOW => write!(f, "record overflow ({})", self.0),
            IoStatus::SHORT_BUFFER => write!(f, "short buffer ({})", self.0),
            IoStatus(code) => write!(f, "I/O status {}", code),
        }
    }
}

/// Error type for conditions under which a collective exchange cannot proceed
///
/// 集合交换无法继续时的错误类型
///
/// Record I/O failures are not errors: they travel as [`IoStatus`] values.
///
/// 记录 I/O 失败不是错误：它们以 [`IoStatus`] 的形式传递。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Empty file cannot be mapped
    ///
    /// 空文件无法映射
    #[error("Cannot map empty record file / 无法映射空记录文件")]
    EmptyFile,

    /// A resolved local address does not fit in local storage
    ///
    /// 解析出的本地地址超出本地存储
    #[error("Local address {offset} with span {span} exceeds local storage of {len} bytes")]
    AddressOutOfBounds { offset: isize, span: usize, len: usize },

    /// The configured I/O coordinator is not a member of the group
    ///
    /// 配置的 I/O 协调者不在参与者组内
    #[error("I/O coordinator {io_rank} is outside a group of {num_ranks} participants")]
    InvalidCoordinator { io_rank: usize, num_ranks: usize },

    /// A transport call addressed a nonexistent participant
    ///
    /// 传输调用指向不存在的参与者
    #[error("Participant {peer} is outside a group of {num_ranks} participants")]
    PeerOutOfRange { peer: usize, num_ranks: usize },

    /// A point-to-point call addressed the calling participant itself
    ///
    /// 点对点调用指向调用者自身
    #[error("Participant {rank} cannot message itself")]
    SelfMessage { rank: usize },

    /// The peer's channel endpoint has been dropped
    ///
    /// 对端通道已关闭
    #[error("Participant {peer} disconnected")]
    Disconnected { peer: usize },

    /// A received message does not match the expected run layout
    ///
    /// 收到的消息与预期的运行布局不符
    #[error("Message of {actual} bytes does not match expected {expected} bytes")]
    MessageSize { expected: usize, actual: usize },

    /// A configuration override could not be parsed
    ///
    /// 配置覆盖值无法解析
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::Disconnected { .. } => {
                io::Error::new(io::ErrorKind::BrokenPipe, err.to_string())
            }
            Error::MessageSize { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, err.to_string())
            }
            _ => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(IoStatus::SUCCESS.is_success());
        assert!(IoStatus::END_OF_FILE.is_failure());
        assert!(IoStatus::from_code(42).is_failure());
        assert_eq!(IoStatus::default(), IoStatus::SUCCESS);
    }

    #[test]
    fn test_status_code_passes_through() {
        let status = IoStatus::from(-17);
        assert_eq!(status.code(), -17);
        assert_eq!(i32::from(status), -17);
        assert_eq!(status.to_string(), "I/O status -17");
    }

    #[test]
    fn test_error_into_io_error() {
        let err: io::Error = Error::Disconnected { peer: 3 }.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err: io::Error = Error::MessageSize { expected: 8, actual: 4 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = Error::EmptyFile.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
