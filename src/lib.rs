//! Collective I/O of distributed arrays
//!
//! 分布式数组的集合 I/O
//!
//! This library moves the elements of an array that is spread over many
//! cooperating participants to and from a sequential record stream that only
//! one participant, the I/O coordinator, may touch. It also ships a small
//! sparse-set utility for bookkeeping over dense integer ids.
//!
//! 本库在分布于多个协作参与者上的数组与仅允许 I/O 协调者访问的顺序记录流之间
//! 搬运元素。同时提供一个用于稠密整数编号簿记的小型稀疏集合工具。
//!
//! # Features
//!
//! - **Deterministic run iteration**: every participant walks the same runs in the same order
//! - **Centralized reads**: the coordinator reads each run once and sends it to every replica owner
//! - **Decentralized writes**: each participant writes only what it holds, with no messages
//! - **Deadlock-free failure handling**: a failed record transfer never skips a delivery
//! - **Pluggable pieces**: [`Distribution`], [`Transport`] and [`RecordIo`] are traits
//!
//! # 特性
//!
//! - **确定性的运行段迭代**：每个参与者以相同顺序遍历相同的运行段
//! - **中心化读取**：协调者对每个运行段只读一次，并发送给每个副本归属者
//! - **去中心化写入**：每个参与者只写自己持有的部分，无需消息
//! - **无死锁的失败处理**：记录传输失败不会跳过任何投递
//! - **可插拔组件**：[`Distribution`]、[`Transport`] 和 [`RecordIo`] 均为 trait
//!
//! # Quick Start
//!
//! Write a block-distributed array into a memory-mapped record file:
//!
//! 将块分布数组写入内存映射记录文件：
//!
//! ```
//! use collective_io::{
//!     ArrayDescriptor, BlockDistribution, CollectiveConfig, CollectiveIo, Dimension,
//!     ElementKind, IoMode, IoStatus, LocalTransport, RecordFile, Result,
//! };
//! use std::sync::Arc;
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("array.bin");
//! # use std::num::NonZeroU64;
//!
//! // A 4 x 2 array of i32 held by a single participant
//! // 由单个参与者持有的 4 x 2 i32 数组
//! let dims = [Dimension::new(1, 4), Dimension::new(1, 2)];
//! let dist = BlockDistribution::new(&dims, 0, 1, 0);
//! let desc = ArrayDescriptor::array(ElementKind::Int4, &dims, Arc::new(dist));
//!
//! let mut local: Vec<u8> = (1..=8i32).flat_map(i32::to_ne_bytes).collect();
//! let mut file = RecordFile::create(&path, NonZeroU64::new(32).unwrap())?;
//!
//! let engine = CollectiveIo::new(LocalTransport, CollectiveConfig::new())?;
//! let status = engine.run(&mut local, &desc, IoMode::Write, &mut file)?;
//!
//! assert_eq!(status, IoStatus::SUCCESS);
//! assert_eq!(file.remaining(), 0);
//! file.sync_all()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`CollectiveIo`]: Collective read/write engine of one participant
//! - [`ArrayDescriptor`]: Scalar or distributed array being transferred
//! - [`Distribution`]: Ownership and local address resolution
//! - [`Transport`]: Point-to-point and broadcast primitives
//! - [`RecordIo`]: Sequential record I/O invoked once per run
//! - [`FastSet`]: Constant-time sparse set of small integers
//!
//! # 主要类型
//!
//! - [`CollectiveIo`]: 单个参与者的集合读写引擎
//! - [`ArrayDescriptor`]: 被传输的标量或分布式数组
//! - [`Distribution`]: 归属与本地地址解析
//! - [`Transport`]: 点对点与广播原语
//! - [`RecordIo`]: 每个运行段调用一次的顺序记录 I/O
//! - [`FastSet`]: 常数时间的小整数稀疏集合

mod collective;
mod fastset;

pub use collective::{
    ArrayDescriptor, BlockDistribution, ChannelTransport, CollectiveConfig, CollectiveIo,
    DescriptorTag, Dimension, DistributedLayout, Distribution, ElementKind, Error, IO_RANK_ENV,
    IoMode, IoStatus, LOCAL_MODE_ENV, LocalTransport, RecordFile, RecordIo, ReplicaAxis,
    ReplicaCursor, Replication, Result, Run, RunLayout, RunWalker, Transport, record_fn,
};
pub use fastset::FastSet;
