//! Collective read/write of distributed arrays
//!
//! 分布式数组的集合读写
//!
//! Writes are decentralized: each participant writes the runs it holds.
//! Reads are centralized: the I/O coordinator reads every run and sends it
//! to each owner, then the coordinator's status is broadcast to everyone.
//!
//! 写入是去中心化的：每个参与者写自己持有的运行段。
//! 读取是中心化的：I/O 协调者读取每个运行段并发送给各归属者，
//! 随后将协调者的状态广播给所有人。

use super::config::CollectiveConfig;
use super::descriptor::{ArrayDescriptor, DistributedLayout, ElementKind};
use super::distribution::Replication;
use super::error::{Error, IoStatus, Result};
use super::record::RecordIo;
use super::run::{Run, RunWalker};
use super::transport::{RunLayout, Transport};
use std::ops::Range;

/// Direction of a collective transfer
///
/// 集合传输的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IoMode {
    Read,
    Write,
}

/// Collective I/O engine of one participant
///
/// 单个参与者的集合 I/O 引擎
///
/// Every participant of the group calls [`run`](CollectiveIo::run) with
/// its own local storage and its own view of the same descriptor.
///
/// 组内每个参与者都用自己的本地存储和同一描述符的本地视图调用
/// [`run`](CollectiveIo::run)。
///
/// # Examples
///
/// ```
/// use collective_io::{
///     record_fn, ArrayDescriptor, BlockDistribution, CollectiveConfig, CollectiveIo,
///     Dimension, ElementKind, IoMode, IoStatus, LocalTransport,
/// };
/// use std::sync::Arc;
///
/// let dims = [Dimension::from_extent(4)];
/// let dist = BlockDistribution::new(&dims, 0, 1, 0);
/// let desc = ArrayDescriptor::array(ElementKind::Int1, &dims, Arc::new(dist));
/// let engine = CollectiveIo::new(LocalTransport, CollectiveConfig::new())?;
///
/// let mut data = [0u8; 4];
/// let mut io = record_fn(|_kind, count, _stride, buf: &mut [u8], _len| {
///     buf[..count].copy_from_slice(&[1, 2, 3, 4][..count]);
///     IoStatus::SUCCESS
/// });
/// let status = engine.run(&mut data, &desc, IoMode::Read, &mut io)?;
///
/// assert_eq!(status, IoStatus::SUCCESS);
/// assert_eq!(data, [1, 2, 3, 4]);
/// # Ok::<(), collective_io::Error>(())
/// ```
#[derive(Debug)]
pub struct CollectiveIo<T> {
    transport: T,
    config: CollectiveConfig,
}

impl<T: Transport> CollectiveIo<T> {
    /// Create an engine over `transport`
    ///
    /// 在 `transport` 之上创建引擎
    ///
    /// # Errors
    /// Returns `InvalidCoordinator` if `config.io_rank` is not in the group
    ///
    /// # Errors
    /// `config.io_rank` 不在组内时返回 `InvalidCoordinator`
    pub fn new(transport: T, config: CollectiveConfig) -> Result<Self> {
        config.validate(transport.num_ranks())?;
        Ok(Self { transport, config })
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn config(&self) -> &CollectiveConfig {
        &self.config
    }

    #[inline]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Whether this participant is the I/O coordinator
    ///
    /// 本参与者是否为 I/O 协调者
    #[inline]
    pub fn is_coordinator(&self) -> bool {
        self.transport.rank() == self.config.io_rank
    }

    /// Read or write one scalar or array as a collective operation
    ///
    /// 以集合操作读或写一个标量或数组
    ///
    /// `base` is this participant's local storage. The returned status is
    /// identical on every participant after a read outside local mode; after
    /// a write each participant reports only its own runs.
    ///
    /// `base` 是本参与者的本地存储。非本地模式下读取完成后，所有参与者返回
    /// 相同的状态；写入后每个参与者只报告自己运行段的结果。
    ///
    /// # Errors
    /// Transport failures and local addresses outside `base`. Record I/O
    /// failures are reported through the returned [`IoStatus`] instead.
    ///
    /// # Errors
    /// 传输失败以及超出 `base` 的本地地址。记录 I/O 失败通过返回的
    /// [`IoStatus`] 报告。
    pub fn run<R: RecordIo + ?Sized>(
        &self,
        base: &mut [u8],
        descriptor: &ArrayDescriptor,
        mode: IoMode,
        io: &mut R,
    ) -> Result<IoStatus> {
        let _span = tracing::debug_span!(
            "collective_io",
            ?mode,
            rank = self.transport.rank(),
            io_rank = self.config.io_rank,
            tag = ?descriptor.tag(),
        )
        .entered();

        let Some(layout) = descriptor.as_distributed() else {
            return self.run_scalar(base, descriptor, mode, io);
        };

        if descriptor.global_size() <= 0 {
            tracing::trace!("zero-size array, nothing to transfer");
            return Ok(IoStatus::SUCCESS);
        }

        let replication = if self.is_global_read(mode) {
            layout.distribution().describe_replication()
        } else {
            Replication::none()
        };

        let mut request = TransferRequest {
            base,
            base_offset: layout.base_offset() * descriptor.elem_len() as isize,
            kind: descriptor.kind(),
            elem_len: descriptor.elem_len(),
            layout,
            mode,
            io,
            transport: &self.transport,
            config: &self.config,
            replication,
            status: IoStatus::SUCCESS,
        };

        if descriptor.rank() > 0 {
            for run in RunWalker::new(layout.dims(), layout.distribution()) {
                request.transfer(&run)?;
            }
        } else {
            request.transfer(&Run::scalar())?;
        }

        let status = request.status;
        self.finish(mode, status)
    }

    fn run_scalar<R: RecordIo + ?Sized>(
        &self,
        base: &mut [u8],
        descriptor: &ArrayDescriptor,
        mode: IoMode,
        io: &mut R,
    ) -> Result<IoStatus> {
        let kind = descriptor.kind();
        debug_assert!(
            !kind.is_variable_length(),
            "character or derived type not handled on the scalar path"
        );
        let elem_len = kind.size_of().unwrap_or(descriptor.elem_len());
        let len = base.len();
        let element = base.get_mut(..elem_len).ok_or(Error::AddressOutOfBounds {
            offset: 0,
            span: elem_len,
            len,
        })?;

        let mut status = IoStatus::SUCCESS;
        if self.config.local_mode || self.is_coordinator() {
            status = io.transfer(kind, 1, elem_len, element, elem_len);
        }
        if self.is_global_read(mode) {
            let layout = RunLayout::new(1, 1, kind, elem_len);
            self.transport.broadcast(self.config.io_rank, element, &layout)?;
        }
        self.finish(mode, status)
    }

    #[inline]
    fn is_global_read(&self, mode: IoMode) -> bool {
        mode == IoMode::Read && !self.config.local_mode
    }

    /// Make the coordinator's status everyone's status after a global read
    ///
    /// 全局读取后让协调者的状态成为所有人的状态
    fn finish(&self, mode: IoMode, status: IoStatus) -> Result<IoStatus> {
        if !self.is_global_read(mode) {
            return Ok(status);
        }
        let mut bytes = status.code().to_ne_bytes();
        let layout = RunLayout::new(1, 1, ElementKind::Int4, bytes.len());
        self.transport.broadcast(self.config.io_rank, &mut bytes, &layout)?;
        let status = IoStatus::from_code(i32::from_ne_bytes(bytes));
        if status.is_failure() {
            tracing::debug!(status = status.code(), "collective transfer failed");
        }
        Ok(status)
    }
}

/// State of one collective call on one participant
///
/// 单个参与者上一次集合调用的状态
struct TransferRequest<'a, T: ?Sized, R: ?Sized> {
    base: &'a mut [u8],
    /// Byte offset of the local base-offset coefficient
    ///
    /// 本地基址偏移系数对应的字节偏移
    base_offset: isize,
    kind: ElementKind,
    elem_len: usize,
    layout: &'a DistributedLayout,
    mode: IoMode,
    io: &'a mut R,
    transport: &'a T,
    config: &'a CollectiveConfig,
    replication: Replication,
    status: IoStatus,
}

impl<T: Transport + ?Sized, R: RecordIo + ?Sized> TransferRequest<'_, T, R> {
    fn transfer(&mut self, run: &Run) -> Result<()> {
        match self.mode {
            IoMode::Read => self.read_run(run),
            IoMode::Write => self.write_run(run),
        }
    }

    /// Byte range of the run in local storage, or `None` if not held here
    ///
    /// 运行段在本地存储中的字节范围，本地未持有时返回 `None`
    fn local_address(&self, run: &Run) -> Result<Option<Range<usize>>> {
        let Some(offset) = self.layout.distribution().local_offset(run.index()) else {
            return Ok(None);
        };
        let start = self.base_offset + offset * self.elem_len as isize;
        let span = run.span() * self.elem_len;
        let len = self.base.len();
        match usize::try_from(start) {
            Ok(start) if start + span <= len => Ok(Some(start..start + span)),
            _ => Err(Error::AddressOutOfBounds { offset: start, span, len }),
        }
    }

    fn write_run(&mut self, run: &Run) -> Result<()> {
        let address = self.local_address(run)?;
        tracing::trace!(
            rank = self.transport.rank(),
            index = %run,
            count = run.count(),
            stride = run.stride(),
            address = ?address,
            "write run"
        );

        let Some(address) = address else {
            return Ok(());
        };
        if self.status.is_success() {
            self.status = self.io.transfer(
                self.kind,
                run.count(),
                run.stride() * self.elem_len,
                &mut self.base[address],
                self.elem_len,
            );
            trace_failure(self.status, run);
        }
        Ok(())
    }

    fn read_run(&mut self, run: &Run) -> Result<()> {
        let address = self.local_address(run)?;
        tracing::trace!(
            rank = self.transport.rank(),
            index = %run,
            count = run.count(),
            stride = run.stride(),
            address = ?address,
            "read run"
        );

        if self.config.local_mode {
            if let (Some(address), true) = (address, self.status.is_success()) {
                self.status = self.io.transfer(
                    self.kind,
                    run.count(),
                    run.stride() * self.elem_len,
                    &mut self.base[address],
                    self.elem_len,
                );
                trace_failure(self.status, run);
            }
            return Ok(());
        }

        let me = self.transport.rank();
        let io_rank = self.config.io_rank;

        if me != io_rank {
            if let Some(address) = address {
                let layout = RunLayout::new(run.count(), run.stride(), self.kind, self.elem_len);
                self.transport.recv(io_rank, &mut self.base[address], &layout)?;
            }
            return Ok(());
        }

        // The coordinator reads into scratch space when it holds none of the run
        let mut scratch = Vec::new();
        let (buf, stride): (&mut [u8], usize) = match address {
            Some(address) => (&mut self.base[address], run.stride()),
            None => {
                scratch.resize(run.count() * self.elem_len, 0u8);
                (&mut scratch[..], 1)
            }
        };

        if self.status.is_success() {
            self.status = self
                .io
                .transfer(self.kind, run.count(), stride * self.elem_len, buf, self.elem_len);
            trace_failure(self.status, run);
        }

        // Owners of a failed run still receive, so no participant waits forever
        let layout = RunLayout::new(run.count(), stride, self.kind, self.elem_len);
        let distribution = self.layout.distribution();
        let mut cursor = self.replication.cursor();
        let mut owner = Some(distribution.owner(run.index()));
        while let Some(dest) = owner {
            if dest != me {
                tracing::trace!(rank = me, dest, index = %run, "deliver run");
                self.transport.send(dest, buf, &layout)?;
            }
            owner = distribution.next_replica_owner(&self.replication, &mut cursor, dest);
        }
        Ok(())
    }
}

fn trace_failure(status: IoStatus, run: &Run) {
    if status.is_failure() {
        tracing::debug!(
            status = status.code(),
            index = %run,
            "record transfer failed, skipping further record I/O"
        );
    }
}
