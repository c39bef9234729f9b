//! Record I/O callback and a memory-mapped record stream
//!
//! 记录 I/O 回调与基于内存映射的记录流

use super::descriptor::ElementKind;
use super::engine::IoMode;
use super::error::{Error, IoStatus, Result};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use std::num::NonZeroU64;
use std::path::Path;

/// Sequential record I/O primitive invoked once per run
///
/// 每个运行段调用一次的顺序记录 I/O 原语
///
/// `buf` starts at the run's first element; element `i` lives at byte
/// `i * byte_stride` and is `elem_len` bytes long. A read fills those
/// elements, a write consumes them.
///
/// `buf` 从运行段首元素开始；第 `i` 个元素位于字节 `i * byte_stride`，
/// 长 `elem_len` 字节。读取时填充这些元素，写入时消费它们。
pub trait RecordIo {
    fn transfer(
        &mut self,
        kind: ElementKind,
        count: usize,
        byte_stride: usize,
        buf: &mut [u8],
        elem_len: usize,
    ) -> IoStatus;
}

impl<F> RecordIo for F
where
    F: FnMut(ElementKind, usize, usize, &mut [u8], usize) -> IoStatus,
{
    #[inline]
    fn transfer(
        &mut self,
        kind: ElementKind,
        count: usize,
        byte_stride: usize,
        buf: &mut [u8],
        elem_len: usize,
    ) -> IoStatus {
        self(kind, count, byte_stride, buf, elem_len)
    }
}

/// Pin a closure to the [`RecordIo`] signature
///
/// 将闭包固定为 [`RecordIo`] 签名
///
/// Lets the compiler infer the closure's argument types, including the
/// higher-ranked buffer lifetime.
///
/// 让编译器推断闭包参数类型，包括缓冲区的高阶生命周期。
///
/// # Examples
///
/// ```
/// use collective_io::{record_fn, ElementKind, IoStatus, RecordIo};
///
/// let mut calls = 0;
/// let mut io = record_fn(|_kind, count, _stride, _buf, _len| {
///     calls += count;
///     IoStatus::SUCCESS
/// });
/// io.transfer(ElementKind::Int4, 3, 4, &mut [0u8; 12], 4);
/// drop(io);
/// assert_eq!(calls, 3);
/// ```
#[inline]
pub fn record_fn<F>(f: F) -> F
where
    F: FnMut(ElementKind, usize, usize, &mut [u8], usize) -> IoStatus,
{
    f
}

/// Memory-mapped sequential record stream
///
/// 基于内存映射的顺序记录流
///
/// Elements are stored back to back in transfer order; a cursor advances
/// by `count * elem_len` bytes per transfer. Streams made with
/// [`create`](RecordFile::create) accept writes, streams made with
/// [`open`](RecordFile::open) serve reads.
///
/// 元素按传输顺序紧密存放；每次传输游标前进 `count * elem_len` 字节。
/// 由 [`create`](RecordFile::create) 创建的流接受写入，
/// 由 [`open`](RecordFile::open) 打开的流提供读取。
///
/// # Examples
///
/// ```
/// # use collective_io::{ElementKind, IoStatus, RecordFile, RecordIo, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("records.bin");
/// # use std::num::NonZeroU64;
/// let mut out = RecordFile::create(&path, NonZeroU64::new(8).unwrap())?;
/// let status = out.transfer(ElementKind::Int4, 2, 4, &mut [1, 0, 0, 0, 2, 0, 0, 0], 4);
/// assert_eq!(status, IoStatus::SUCCESS);
/// out.sync_all()?;
/// drop(out);
///
/// let mut input = RecordFile::open(&path)?;
/// let mut buf = [0u8; 4];
/// input.transfer(ElementKind::Int4, 1, 4, &mut buf, 4);
/// assert_eq!(buf, [1, 0, 0, 0]);
/// # Ok(())
/// # }
/// ```
pub struct RecordFile {
    mmap: MmapMut,
    size: NonZeroU64,
    position: u64,
    mode: IoMode,
}

impl RecordFile {
    /// Create a new stream for writing, pre-allocated to `size` bytes
    ///
    /// 创建用于写入的新流，预分配 `size` 字节
    ///
    /// If the file already exists, it will be truncated.
    ///
    /// 如果文件已存在会被截断。
    pub fn create(path: impl AsRef<Path>, size: NonZeroU64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        file.set_len(size.get())?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            mmap,
            size,
            position: 0,
            mode: IoMode::Write,
        })
    }

    /// Open an existing stream for reading
    ///
    /// 打开已存在的流用于读取
    ///
    /// # Errors
    /// Returns `EmptyFile` if the file has zero length
    ///
    /// # Errors
    /// 文件长度为 0 时返回 `EmptyFile`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        let size = NonZeroU64::new(file.metadata()?.len()).ok_or(Error::EmptyFile)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            mmap,
            size,
            position: 0,
            mode: IoMode::Read,
        })
    }

    #[inline]
    pub fn mode(&self) -> IoMode {
        self.mode
    }

    #[inline]
    pub fn size(&self) -> NonZeroU64 {
        self.size
    }

    /// Byte offset of the next transfer
    ///
    /// 下一次传输的字节偏移
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.size.get() - self.position
    }

    /// Move the cursor back to the start of the stream
    ///
    /// 将游标移回流的开头
    #[inline]
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Contents of the whole stream
    ///
    /// 整个流的内容
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Flush data to disk asynchronously
    ///
    /// 异步刷新数据到磁盘
    pub fn flush(&self) -> Result<()> {
        Ok(self.mmap.flush_async()?)
    }

    /// Flush data to disk synchronously
    ///
    /// 同步刷新数据到磁盘
    pub fn sync_all(&self) -> Result<()> {
        Ok(self.mmap.flush()?)
    }

    fn element_ranges(
        count: usize,
        byte_stride: usize,
        elem_len: usize,
    ) -> impl Iterator<Item = (std::ops::Range<usize>, usize)> {
        (0..count).map(move |i| {
            let start = i * byte_stride;
            (start..start + elem_len, i * elem_len)
        })
    }
}

impl RecordIo for RecordFile {
    fn transfer(
        &mut self,
        _kind: ElementKind,
        count: usize,
        byte_stride: usize,
        buf: &mut [u8],
        elem_len: usize,
    ) -> IoStatus {
        if count == 0 {
            return IoStatus::SUCCESS;
        }
        // 最后一个元素的结束位置，溢出视为缓冲区不足
        let span = (count - 1)
            .checked_mul(byte_stride)
            .and_then(|start| start.checked_add(elem_len));
        if span.is_none_or(|span| span > buf.len()) {
            return IoStatus::SHORT_BUFFER;
        }
        let bytes = match count.checked_mul(elem_len) {
            Some(bytes) if bytes as u64 <= self.remaining() => bytes as u64,
            _ => {
                return match self.mode {
                    IoMode::Read => IoStatus::END_OF_FILE,
                    IoMode::Write => IoStatus::RECORD_OVERFLOW,
                };
            }
        };

        let base = self.position as usize;
        for (element, record) in Self::element_ranges(count, byte_stride, elem_len) {
            let record = base + record..base + record + elem_len;
            match self.mode {
                IoMode::Read => buf[element].copy_from_slice(&self.mmap[record]),
                IoMode::Write => self.mmap[record].copy_from_slice(&buf[element]),
            }
        }
        self.position += bytes;
        IoStatus::SUCCESS
    }
}

impl std::fmt::Debug for RecordFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFile")
            .field("size", &self.size)
            .field("position", &self.position)
            .field("mode", &self.mode)
            .field("mmap", &"MmapMut")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_strided() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("strided.bin");

        // 以跨度 2 写入 3 个 2 字节元素
        let mut out = RecordFile::create(&path, NonZeroU64::new(6).unwrap()).unwrap();
        let mut src = [1u8, 1, 0, 0, 2, 2, 0, 0, 3, 3];
        assert_eq!(out.transfer(ElementKind::Int2, 3, 4, &mut src, 2), IoStatus::SUCCESS);
        assert_eq!(out.position(), 6);
        assert_eq!(out.as_bytes(), &[1, 1, 2, 2, 3, 3]);
        out.sync_all().unwrap();
        drop(out);

        let mut input = RecordFile::open(&path).unwrap();
        assert_eq!(input.mode(), IoMode::Read);
        let mut dst = [0u8; 6];
        assert_eq!(input.transfer(ElementKind::Int2, 3, 2, &mut dst, 2), IoStatus::SUCCESS);
        assert_eq!(dst, [1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_read_past_end_is_end_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eof.bin");
        drop(RecordFile::create(&path, NonZeroU64::new(4).unwrap()).unwrap());

        let mut input = RecordFile::open(&path).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(input.transfer(ElementKind::Int4, 2, 4, &mut buf, 4), IoStatus::END_OF_FILE);
        assert_eq!(input.position(), 0);

        assert_eq!(input.transfer(ElementKind::Int4, 1, 4, &mut buf, 4), IoStatus::SUCCESS);
        assert_eq!(input.transfer(ElementKind::Int4, 1, 4, &mut buf, 4), IoStatus::END_OF_FILE);
    }

    #[test]
    fn test_write_past_end_is_overflow() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overflow.bin");
        let mut out = RecordFile::create(&path, NonZeroU64::new(3).unwrap()).unwrap();

        let mut buf = [7u8; 4];
        assert_eq!(out.transfer(ElementKind::Int4, 1, 4, &mut buf, 4), IoStatus::RECORD_OVERFLOW);
    }

    #[test]
    fn test_short_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        let mut out = RecordFile::create(&path, NonZeroU64::new(64).unwrap()).unwrap();

        let mut buf = [0u8; 10];
        assert_eq!(out.transfer(ElementKind::Int4, 2, 8, &mut buf, 4), IoStatus::SHORT_BUFFER);
    }

    #[test]
    fn test_oversized_stride_is_short_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stride.bin");
        let mut out = RecordFile::create(&path, NonZeroU64::new(64).unwrap()).unwrap();

        // 跨度乘积或加上元素长度后溢出 usize，不能回绕成小值
        let mut buf = [0u8; 16];
        assert_eq!(
            out.transfer(ElementKind::Int4, 2, usize::MAX, &mut buf, 4),
            IoStatus::SHORT_BUFFER
        );
        assert_eq!(
            out.transfer(ElementKind::Int4, 3, usize::MAX / 2 + 1, &mut buf, 4),
            IoStatus::SHORT_BUFFER
        );
        assert_eq!(
            out.transfer(ElementKind::Int1, 2, usize::MAX - 1, &mut buf, 2),
            IoStatus::SHORT_BUFFER
        );
        assert_eq!(out.position(), 0);
    }

    #[test]
    fn test_oversized_element_count_is_overflow() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("count.bin");
        let mut out = RecordFile::create(&path, NonZeroU64::new(64).unwrap()).unwrap();

        // 跨度为 0 时缓冲区检查通过，但 count * elem_len 溢出
        let mut buf = [0u8; 8];
        assert_eq!(
            out.transfer(ElementKind::Int8, usize::MAX, 0, &mut buf, 8),
            IoStatus::RECORD_OVERFLOW
        );
        assert_eq!(out.position(), 0);
    }

    #[test]
    fn test_rewind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rewind.bin");
        let mut out = RecordFile::create(&path, NonZeroU64::new(2).unwrap()).unwrap();

        let mut buf = [5u8, 6];
        out.transfer(ElementKind::Int1, 2, 1, &mut buf, 1);
        assert_eq!(out.remaining(), 0);
        out.rewind();
        assert_eq!(out.remaining(), 2);
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        assert!(matches!(RecordFile::open(&path), Err(Error::EmptyFile)));
    }

    #[test]
    fn test_closure_record_io() {
        let mut seen = Vec::new();
        let mut io = record_fn(|kind, count, stride, buf: &mut [u8], len| {
            seen.push((kind, count, stride, buf.len(), len));
            IoStatus::from_code(9)
        });
        let status = io.transfer(ElementKind::Real8, 2, 16, &mut [0u8; 24], 8);
        drop(io);

        assert_eq!(status.code(), 9);
        assert_eq!(seen, vec![(ElementKind::Real8, 2, 16, 24, 8)]);
    }
}
