//! Collective I/O of distributed arrays
//!
//! 分布式数组的集合 I/O
//!
//! Array elements are spread over many participants, but only one of them,
//! the I/O coordinator, may touch the file. This module keeps sequential
//! file semantics while the data lives in disjoint memories:
//!
//! 1. [`RunWalker`] cuts the global index space into contiguous runs, the
//!    same sequence on every participant
//! 2. [`Distribution`] answers who owns a run and where it lives locally
//! 3. [`CollectiveIo`] moves each run: writes go straight from the holder
//!    to its [`RecordIo`]; reads are performed by the coordinator and sent
//!    to every replica owner over a [`Transport`]
//!
//! 数组元素分布在许多参与者上，但只有 I/O 协调者可以访问文件。
//! 本模块在数据位于互不相交的内存中时保持顺序文件语义：
//!
//! 1. [`RunWalker`] 将全局下标空间切分为连续运行段，各参与者序列一致
//! 2. [`Distribution`] 回答运行段归谁所有、位于本地何处
//! 3. [`CollectiveIo`] 搬运每个运行段：写入由持有者直接交给 [`RecordIo`]；
//!    读取由协调者完成，并通过 [`Transport`] 发送给每个副本归属者
//!
//! # Status propagation
//!
//! A failed record transfer is recorded, not raised. Later runs skip their
//! record I/O, yet a read still delivers every run so that no receiver
//! blocks forever. The coordinator's status is broadcast at the end of a
//! read; a write returns each participant's own status.
//!
//! # 状态传播
//!
//! 记录传输失败只被记录而不抛出。后续运行段跳过记录 I/O，但读取仍会投递
//! 每个运行段，避免接收方永久阻塞。读取结束时广播协调者的状态；
//! 写入则返回各参与者自己的状态。
//!
//! ```
//! # use collective_io::{
//! #     ArrayDescriptor, BlockDistribution, ChannelTransport, CollectiveConfig, CollectiveIo,
//! #     Dimension, ElementKind, IoMode, IoStatus, Transport, record_fn,
//! # };
//! # use std::sync::Arc;
//! let dims = [Dimension::from_extent(6)];
//!
//! // Three participants, two elements each
//! // 三个参与者，每个持有两个元素
//! std::thread::scope(|s| {
//!     for transport in ChannelTransport::group(3) {
//!         s.spawn(move || {
//!             let me = transport.rank();
//!             let dist = BlockDistribution::new(&dims, 0, 3, me);
//!             let mut local = vec![0u8; dist.local_len()];
//!             let desc = ArrayDescriptor::array(ElementKind::Int1, &dims, Arc::new(dist));
//!             let engine = CollectiveIo::new(transport, CollectiveConfig::new()).unwrap();
//!
//!             let mut next = 10u8;
//!             let mut io = record_fn(|_kind, count, stride, buf: &mut [u8], _len| {
//!                 for i in 0..count {
//!                     buf[i * stride] = next;
//!                     next += 1;
//!                 }
//!                 IoStatus::SUCCESS
//!             });
//!             let status = engine.run(&mut local, &desc, IoMode::Read, &mut io).unwrap();
//!
//!             assert_eq!(status, IoStatus::SUCCESS);
//!             assert_eq!(local, vec![10 + 2 * me as u8, 11 + 2 * me as u8]);
//!         });
//!     }
//! });
//! ```

mod config;
mod descriptor;
mod distribution;
mod engine;
mod error;
mod record;
mod run;
mod transport;


// Re-export public API
// 重新导出公共 API
pub use config::{CollectiveConfig, IO_RANK_ENV, LOCAL_MODE_ENV};
pub use descriptor::{ArrayDescriptor, DescriptorTag, Dimension, DistributedLayout, ElementKind};
pub use distribution::{BlockDistribution, Distribution, ReplicaAxis, ReplicaCursor, Replication};
pub use engine::{CollectiveIo, IoMode};
pub use error::{Error, IoStatus, Result};
pub use record::{RecordFile, RecordIo, record_fn};
pub use run::{Run, RunWalker};
pub use transport::{ChannelTransport, LocalTransport, RunLayout, Transport};
