//! Participant configuration
//!
//! 参与者配置

use super::error::{Error, Result};

/// Environment variable naming the I/O coordinator
///
/// 指定 I/O 协调者的环境变量
pub const IO_RANK_ENV: &str = "COLLECTIVE_IO_RANK";

/// Environment variable enabling single-participant mode
///
/// 启用单参与者模式的环境变量
pub const LOCAL_MODE_ENV: &str = "COLLECTIVE_IO_LOCAL";

/// How one participant takes part in collective I/O
///
/// 单个参与者参与集合 I/O 的方式
///
/// # Examples
///
/// ```
/// use collective_io::CollectiveConfig;
///
/// let config = CollectiveConfig::new().with_io_rank(2);
/// assert!(config.validate(4).is_ok());
/// assert!(config.validate(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollectiveConfig {
    /// The single participant allowed to touch the file
    ///
    /// 唯一允许访问文件的参与者
    pub io_rank: usize,

    /// Every participant performs its own I/O; nothing is exchanged
    ///
    /// 每个参与者各自执行 I/O；不做任何交换
    pub local_mode: bool,
}

impl CollectiveConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_io_rank(mut self, io_rank: usize) -> Self {
        self.io_rank = io_rank;
        self
    }

    #[inline]
    pub fn with_local_mode(mut self, local_mode: bool) -> Self {
        self.local_mode = local_mode;
        self
    }

    /// Read overrides from [`IO_RANK_ENV`] and [`LOCAL_MODE_ENV`]
    ///
    /// 从 [`IO_RANK_ENV`] 和 [`LOCAL_MODE_ENV`] 读取覆盖值
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup
    ///
    /// 通过任意键查找函数读取覆盖值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(IO_RANK_ENV) {
            config.io_rank = value.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{}={:?} is not a participant id", IO_RANK_ENV, value))
            })?;
        }

        if let Some(value) = lookup(LOCAL_MODE_ENV) {
            config.local_mode = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "{}={:?} is not a boolean",
                        LOCAL_MODE_ENV, value
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Check the configuration against a group of `num_ranks` participants
    ///
    /// 针对 `num_ranks` 个参与者的组校验配置
    pub fn validate(&self, num_ranks: usize) -> Result<()> {
        if self.io_rank >= num_ranks {
            return Err(Error::InvalidCoordinator {
                io_rank: self.io_rank,
                num_ranks,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CollectiveConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CollectiveConfig::default());
        assert_eq!(config.io_rank, 0);
        assert!(!config.local_mode);
    }

    #[test]
    fn test_overrides() {
        let pairs = [(IO_RANK_ENV, " 3 "), (LOCAL_MODE_ENV, "Yes")];
        let config = CollectiveConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.io_rank, 3);
        assert!(config.local_mode);
    }

    #[test]
    fn test_malformed_overrides() {
        assert!(matches!(
            CollectiveConfig::from_lookup(lookup(&[(IO_RANK_ENV, "-1")])),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            CollectiveConfig::from_lookup(lookup(&[(LOCAL_MODE_ENV, "maybe")])),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate() {
        let config = CollectiveConfig::new().with_io_rank(1).with_local_mode(true);
        assert!(config.validate(2).is_ok());
        assert!(matches!(
            config.validate(1),
            Err(Error::InvalidCoordinator { io_rank: 1, num_ranks: 1 })
        ));
    }
}
