//! Point-to-point and broadcast transport between participants
//!
//! 参与者之间的点对点与广播传输
//!
//! Provides the [`Transport`] abstraction plus two implementations:
//! - [`LocalTransport`]: a single participant, nothing ever leaves the process
//! - [`ChannelTransport`]: an in-process SPMD group, one endpoint per thread
//!
//! 提供 [`Transport`] 抽象及两种实现：
//! - [`LocalTransport`]：单参与者，数据从不离开本进程
//! - [`ChannelTransport`]：进程内 SPMD 组，每个线程一个端点

use super::descriptor::ElementKind;
use super::error::{Error, Result};
use std::ops::Range;

/// Shape of a strided run inside a byte buffer
///
/// 字节缓冲区内带跨度运行段的形状
///
/// Element `i` occupies bytes `[i * stride * elem_len, i * stride * elem_len + elem_len)`.
/// On the wire the elements are packed back to back.
///
/// 第 `i` 个元素占据字节 `[i * stride * elem_len, i * stride * elem_len + elem_len)`。
/// 传输时元素紧密排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLayout {
    pub count: usize,
    pub stride: usize,
    pub kind: ElementKind,
    pub elem_len: usize,
}

impl RunLayout {
    #[inline]
    pub fn new(count: usize, stride: usize, kind: ElementKind, elem_len: usize) -> Self {
        Self {
            count,
            stride,
            kind,
            elem_len,
        }
    }

    /// Bytes of a packed message
    ///
    /// 紧密排列后的消息字节数
    #[inline]
    pub fn message_len(&self) -> usize {
        self.count * self.elem_len
    }

    /// Bytes spanned in a strided buffer
    ///
    /// 带跨度缓冲区中跨越的字节数
    #[inline]
    pub fn span(&self) -> usize {
        match self.count {
            0 => 0,
            count => ((count - 1) * self.stride + 1) * self.elem_len,
        }
    }

    fn elements(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count).map(move |i| {
            let start = i * self.stride * self.elem_len;
            start..start + self.elem_len
        })
    }

    fn check_buffer(&self, len: usize) -> Result<()> {
        if self.span() > len {
            return Err(Error::AddressOutOfBounds {
                offset: 0,
                span: self.span(),
                len,
            });
        }
        Ok(())
    }

    /// Gather the strided elements of `buf` into a packed message
    ///
    /// 将 `buf` 中带跨度的元素收集为紧密消息
    pub fn pack(&self, buf: &[u8]) -> Result<Vec<u8>> {
        self.check_buffer(buf.len())?;
        if self.stride == 1 {
            return Ok(buf[..self.message_len()].to_vec());
        }
        let mut message = Vec::with_capacity(self.message_len());
        for element in self.elements() {
            message.extend_from_slice(&buf[element]);
        }
        Ok(message)
    }

    /// Scatter a packed message into the strided elements of `buf`
    ///
    /// 将紧密消息分散写入 `buf` 中带跨度的元素
    pub fn unpack(&self, message: &[u8], buf: &mut [u8]) -> Result<()> {
        if message.len() != self.message_len() {
            return Err(Error::MessageSize {
                expected: self.message_len(),
                actual: message.len(),
            });
        }
        self.check_buffer(buf.len())?;
        for (element, chunk) in self.elements().zip(message.chunks_exact(self.elem_len.max(1))) {
            buf[element].copy_from_slice(chunk);
        }
        Ok(())
    }
}

/// Blocking transport primitives of one participant
///
/// 单个参与者的阻塞式传输原语
///
/// Implementations: [`LocalTransport`] (single participant) and
/// [`ChannelTransport`] (in-process group).
///
/// 实现：[`LocalTransport`]（单参与者）与 [`ChannelTransport`]（进程内组）。
pub trait Transport {
    /// This participant's id
    ///
    /// 本参与者编号
    fn rank(&self) -> usize;

    /// Number of participants in the group
    ///
    /// 组内参与者总数
    fn num_ranks(&self) -> usize;

    /// Send the strided run in `buf` to `dest`
    ///
    /// 将 `buf` 中带跨度的运行段发送给 `dest`
    fn send(&self, dest: usize, buf: &[u8], layout: &RunLayout) -> Result<()>;

    /// Block until the run from `src` arrives, then scatter it into `buf`
    ///
    /// 阻塞直到来自 `src` 的运行段到达，然后分散写入 `buf`
    fn recv(&self, src: usize, buf: &mut [u8], layout: &RunLayout) -> Result<()>;

    /// Copy the run in `root`'s `buf` into every other participant's `buf`
    ///
    /// 将 `root` 的 `buf` 中的运行段复制到其他所有参与者的 `buf`
    fn broadcast(&self, root: usize, buf: &mut [u8], layout: &RunLayout) -> Result<()>;
}

fn check_peer(rank: usize, num_ranks: usize, peer: usize) -> Result<()> {
    if peer >= num_ranks {
        return Err(Error::PeerOutOfRange { peer, num_ranks });
    }
    if peer == rank {
        return Err(Error::SelfMessage { rank });
    }
    Ok(())
}

/// Transport of a group with exactly one participant
///
/// 仅含一个参与者的组的传输
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn send(&self, dest: usize, _buf: &[u8], _layout: &RunLayout) -> Result<()> {
        check_peer(0, 1, dest)
    }

    fn recv(&self, src: usize, _buf: &mut [u8], _layout: &RunLayout) -> Result<()> {
        check_peer(0, 1, src)
    }

    fn broadcast(&self, root: usize, _buf: &mut [u8], _layout: &RunLayout) -> Result<()> {
        if root != 0 {
            return Err(Error::PeerOutOfRange { peer: root, num_ranks: 1 });
        }
        // Single participant: the root already holds the data
        Ok(())
    }
}

/// One endpoint of an in-process participant group
///
/// 进程内参与者组的一个端点
///
/// Every ordered pair of participants has its own unbounded FIFO channel,
/// so messages between two participants are never reordered and a send
/// never blocks.
///
/// 每个有序参与者对拥有独立的无界 FIFO 通道，
/// 因此两个参与者之间的消息不会乱序，发送也永不阻塞。
///
/// # Examples
///
/// ```
/// use collective_io::{ChannelTransport, ElementKind, RunLayout, Transport};
///
/// let mut group = ChannelTransport::group(2);
/// let second = group.pop().unwrap();
/// let first = group.pop().unwrap();
/// let layout = RunLayout::new(2, 1, ElementKind::Int1, 1);
///
/// std::thread::scope(|s| {
///     s.spawn(|| first.send(1, &[7, 9], &layout).unwrap());
///     s.spawn(|| {
///         let mut buf = [0u8; 2];
///         second.recv(0, &mut buf, &layout).unwrap();
///         assert_eq!(buf, [7, 9]);
///     });
/// });
/// ```
#[derive(Debug)]
pub struct ChannelTransport {
    rank: usize,
    /// Indexed by destination
    ///
    /// 按目标编号索引
    outboxes: Vec<flume::Sender<Vec<u8>>>,
    /// Indexed by source
    ///
    /// 按来源编号索引
    inboxes: Vec<flume::Receiver<Vec<u8>>>,
}

impl ChannelTransport {
    /// Create a group of `num_ranks` connected endpoints, ordered by rank
    ///
    /// 创建 `num_ranks` 个互联端点组成的组，按编号排序
    pub fn group(num_ranks: usize) -> Vec<ChannelTransport> {
        fn endpoints<T>(num_ranks: usize) -> Vec<Vec<T>> {
            (0..num_ranks).map(|_| Vec::with_capacity(num_ranks)).collect()
        }
        let mut outboxes: Vec<Vec<flume::Sender<Vec<u8>>>> = endpoints(num_ranks);
        let mut inboxes: Vec<Vec<flume::Receiver<Vec<u8>>>> = endpoints(num_ranks);

        for src in 0..num_ranks {
            for dest in 0..num_ranks {
                let (tx, rx) = flume::unbounded();
                outboxes[src].push(tx);
                inboxes[dest].push(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ChannelTransport {
                rank,
                outboxes,
                inboxes,
            })
            .collect()
    }

    fn post(&self, dest: usize, message: Vec<u8>) -> Result<()> {
        self.outboxes[dest]
            .send(message)
            .map_err(|_| Error::Disconnected { peer: dest })
    }

    fn take(&self, src: usize) -> Result<Vec<u8>> {
        self.inboxes[src]
            .recv()
            .map_err(|_| Error::Disconnected { peer: src })
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: usize, buf: &[u8], layout: &RunLayout) -> Result<()> {
        check_peer(self.rank, self.num_ranks(), dest)?;
        let message = layout.pack(buf)?;
        tracing::trace!(rank = self.rank, dest, bytes = message.len(), "send");
        self.post(dest, message)
    }

    fn recv(&self, src: usize, buf: &mut [u8], layout: &RunLayout) -> Result<()> {
        check_peer(self.rank, self.num_ranks(), src)?;
        let message = self.take(src)?;
        tracing::trace!(rank = self.rank, src, bytes = message.len(), "recv");
        layout.unpack(&message, buf)
    }

    fn broadcast(&self, root: usize, buf: &mut [u8], layout: &RunLayout) -> Result<()> {
        let num_ranks = self.num_ranks();
        if root >= num_ranks {
            return Err(Error::PeerOutOfRange { peer: root, num_ranks });
        }
        if self.rank == root {
            let message = layout.pack(buf)?;
            for dest in (0..num_ranks).filter(|&dest| dest != root) {
                self.post(dest, message.clone())?;
            }
            Ok(())
        } else {
            let message = self.take(root)?;
            layout.unpack(&message, buf)
        }
    }
}
