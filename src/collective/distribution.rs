//! Ownership and local address resolution
//!
//! 归属与本地地址解析
//!
//! The array-management layer decides which participant owns which index.
//! The I/O engine only asks questions through [`Distribution`]: where does
//! an element live in my memory, who owns it, and who else holds a replica.
//!
//! 数组管理层决定哪个参与者拥有哪个下标。I/O 引擎只通过 [`Distribution`]
//! 提问：元素在我的内存中的位置、归属者是谁、还有谁持有副本。

use super::descriptor::Dimension;
use std::fmt;

/// Distribution strategy of one participant's view of an array
///
/// 单个参与者视角下数组的分布策略
///
/// Every answer except [`local_offset`](Distribution::local_offset) and
/// [`local_stride`](Distribution::local_stride) must be identical on all
/// participants, since runs are iterated in lockstep.
///
/// 除 [`local_offset`](Distribution::local_offset) 和
/// [`local_stride`](Distribution::local_stride) 外，所有回答在各参与者上
/// 必须一致，因为运行段是同步迭代的。
pub trait Distribution: Send + Sync + fmt::Debug {
    /// Element offset of `index` in local storage, or `None` if not held here
    ///
    /// `index` 在本地存储中的元素偏移，本地未持有时返回 `None`
    fn local_offset(&self, index: &[i64]) -> Option<isize>;

    /// Element stride between neighbouring indices of `dim` in local storage
    ///
    /// 本地存储中第 `dim` 维相邻下标之间的元素跨度
    fn local_stride(&self, dim: usize) -> usize;

    /// Owning participant of `index` (the first replica when replicated)
    ///
    /// `index` 的归属参与者（有副本时为第一个副本）
    fn owner(&self, index: &[i64]) -> usize;

    /// Number of consecutive indices along `dim`, starting at `index`, that
    /// share one owner set and are contiguous in local storage
    ///
    /// 从 `index` 开始沿 `dim` 维、归属集合相同且本地存储连续的下标个数
    fn run_length(&self, index: &[i64], dim: usize) -> usize;

    /// Build the replication descriptor for this array
    ///
    /// 构建此数组的副本描述
    fn describe_replication(&self) -> Replication;

    /// Next replica owner after `previous`, or `None` when exhausted
    ///
    /// `previous` 之后的下一个副本归属者，遍历结束返回 `None`
    fn next_replica_owner(
        &self,
        replication: &Replication,
        cursor: &mut ReplicaCursor,
        previous: usize,
    ) -> Option<usize> {
        replication.next_owner(cursor, previous)
    }
}

/// One replicated axis of the participant grid
///
/// 参与者网格中的一个副本轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaAxis {
    /// Number of replicas along the axis
    ///
    /// 该轴上的副本个数
    pub count: usize,

    /// Participant id distance between neighbouring replicas
    ///
    /// 相邻副本之间的参与者编号间距
    pub stride: usize,
}

/// Replication descriptor
///
/// 副本描述
///
/// Enumerates every replica owner of an index exactly once, starting from
/// the owner reported by [`Distribution::owner`] and a zeroed cursor.
///
/// 从 [`Distribution::owner`] 给出的归属者和清零的游标开始，
/// 恰好一次地枚举某下标的每个副本归属者。
///
/// # Examples
///
/// ```
/// use collective_io::{ReplicaAxis, Replication};
///
/// let replication = Replication::new([ReplicaAxis { count: 3, stride: 2 }]);
/// let owners: Vec<usize> = replication.owners(1).collect();
/// assert_eq!(owners, vec![1, 3, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replication {
    axes: Vec<ReplicaAxis>,
}

impl Replication {
    /// No replication: every index has exactly one owner
    ///
    /// 无副本：每个下标恰有一个归属者
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(axes: impl IntoIterator<Item = ReplicaAxis>) -> Self {
        Self {
            axes: axes.into_iter().filter(|axis| axis.count > 1).collect(),
        }
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Total number of replicas per index
    ///
    /// 每个下标的副本总数
    pub fn replicas(&self) -> usize {
        self.axes.iter().map(|axis| axis.count).product()
    }

    /// Zeroed per-axis cursor
    ///
    /// 清零的逐轴游标
    #[inline]
    pub fn cursor(&self) -> ReplicaCursor {
        ReplicaCursor(vec![0; self.axes.len()])
    }

    /// Advance the cursor and return the next replica owner
    ///
    /// 推进游标并返回下一个副本归属者
    pub fn next_owner(&self, cursor: &mut ReplicaCursor, previous: usize) -> Option<usize> {
        let mut owner = previous;
        for (axis, position) in self.axes.iter().zip(cursor.0.iter_mut()) {
            if *position + 1 < axis.count {
                *position += 1;
                return Some(owner + axis.stride);
            }
            // Rewind this axis and carry into the next one
            owner -= *position * axis.stride;
            *position = 0;
        }
        None
    }

    /// Iterate all replica owners starting from `first`
    ///
    /// 从 `first` 开始遍历所有副本归属者
    pub fn owners(&self, first: usize) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.cursor();
        std::iter::successors(Some(first), move |&previous| self.next_owner(&mut cursor, previous))
    }
}

/// Per-axis position of a replica walk
///
/// 副本遍历的逐轴位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaCursor(Vec<usize>);

/// Block distribution of one axis, optionally replicated
///
/// 单轴块分布，可带副本
///
/// Global axis `axis` is cut into `nblocks` equal blocks (the last one may
/// be short). Replica `r` of block `b` lives on participant
/// `first_owner + b + r * nblocks`. Each holder stores its block
/// column-major with dimension 0 fastest.
///
/// 全局第 `axis` 维被切成 `nblocks` 个等长块（最后一块可能较短）。
/// 块 `b` 的第 `r` 个副本位于参与者 `first_owner + b + r * nblocks`。
/// 每个持有者按列主序（第 0 维最快）存储自己的块。
///
/// # Examples
///
/// ```
/// use collective_io::{BlockDistribution, Dimension, Distribution};
///
/// let dims = [Dimension::from_extent(10)];
/// // Participant 1 of 2 holds indices 5..10
/// // 参与者 1 持有下标 5..10
/// let dist = BlockDistribution::new(&dims, 0, 2, 1);
///
/// assert_eq!(dist.owner(&[7]), 1);
/// assert_eq!(dist.local_offset(&[7]), Some(2));
/// assert_eq!(dist.local_offset(&[3]), None);
/// assert_eq!(dist.local_len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct BlockDistribution {
    dims: Vec<Dimension>,
    axis: usize,
    nblocks: usize,
    block: i64,
    replicas: usize,
    first_owner: usize,
    me: usize,
    local_strides: Vec<usize>,
}

impl BlockDistribution {
    /// Create the view of participant `me`
    ///
    /// 创建参与者 `me` 的视图
    ///
    /// `axis` is ignored for rank-0 arrays. `nblocks` is raised to at least 1.
    ///
    /// 秩为 0 的数组忽略 `axis`。`nblocks` 至少为 1。
    pub fn new(dims: &[Dimension], axis: usize, nblocks: usize, me: usize) -> Self {
        let axis = if dims.is_empty() { 0 } else { axis.min(dims.len() - 1) };
        let nblocks = if dims.is_empty() { 1 } else { nblocks.max(1) };
        let block = match dims.get(axis) {
            Some(dim) => ((dim.extent() + nblocks as i64 - 1) / nblocks as i64).max(1),
            None => 1,
        };

        let mut local_strides = Vec::with_capacity(dims.len());
        let mut stride = 1usize;
        for (d, dim) in dims.iter().enumerate() {
            local_strides.push(stride);
            let extent = if d == axis { block } else { dim.extent() };
            stride *= extent.max(0) as usize;
        }

        Self {
            dims: dims.to_vec(),
            axis,
            nblocks,
            block,
            replicas: 1,
            first_owner: 0,
            me,
            local_strides,
        }
    }

    /// Replicate every block `replicas` times
    ///
    /// 每个块复制 `replicas` 份
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas.max(1);
        self
    }

    /// Shift all owner ids by `first_owner`
    ///
    /// 将所有归属者编号整体偏移 `first_owner`
    pub fn with_first_owner(mut self, first_owner: usize) -> Self {
        self.first_owner = first_owner;
        self
    }

    /// Number of elements of local storage this participant needs
    ///
    /// 本参与者所需的本地存储元素个数
    pub fn local_len(&self) -> usize {
        if self.my_block().is_none() {
            return 0;
        }
        self.dims
            .iter()
            .enumerate()
            .map(|(d, dim)| if d == self.axis { self.block } else { dim.extent() })
            .map(|extent| extent.max(0) as usize)
            .product()
    }

    /// Block number holding global `index`
    ///
    /// 持有全局 `index` 的块编号
    fn block_of(&self, index: &[i64]) -> usize {
        match (self.dims.get(self.axis), index.get(self.axis)) {
            (Some(dim), Some(&i)) => {
                ((i - dim.lbound()) / self.block).clamp(0, self.nblocks as i64 - 1) as usize
            }
            _ => 0,
        }
    }

    /// Block number stored by this participant
    ///
    /// 本参与者存储的块编号
    fn my_block(&self) -> Option<usize> {
        let relative = self.me.checked_sub(self.first_owner)?;
        (relative < self.nblocks * self.replicas).then_some(relative % self.nblocks)
    }
}

impl Distribution for BlockDistribution {
    fn local_offset(&self, index: &[i64]) -> Option<isize> {
        let block = self.my_block()?;
        if self.block_of(index) != block {
            return None;
        }
        let mut offset = 0isize;
        for (d, (dim, &i)) in self.dims.iter().zip(index).enumerate() {
            let mut local = i - dim.lbound();
            if d == self.axis {
                local -= block as i64 * self.block;
            }
            offset += local as isize * self.local_strides[d] as isize;
        }
        Some(offset)
    }

    fn local_stride(&self, dim: usize) -> usize {
        self.local_strides.get(dim).copied().unwrap_or(1)
    }

    fn owner(&self, index: &[i64]) -> usize {
        self.first_owner + self.block_of(index)
    }

    fn run_length(&self, index: &[i64], dim: usize) -> usize {
        let (Some(bounds), Some(&i)) = (self.dims.get(dim), index.get(dim)) else {
            return 1;
        };
        let remaining = bounds.ubound() - i + 1;
        let length = if dim == self.axis {
            let block_end = (self.block_of(index) as i64 + 1) * self.block + bounds.lbound();
            remaining.min(block_end - i)
        } else {
            remaining
        };
        length.max(1) as usize
    }

    fn describe_replication(&self) -> Replication {
        Replication::new([ReplicaAxis {
            count: self.replicas,
            stride: self.nblocks,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_none_yields_only_first() {
        let replication = Replication::none();
        let mut cursor = replication.cursor();
        assert_eq!(replication.next_owner(&mut cursor, 4), None);
        assert_eq!(replication.replicas(), 1);
    }

    #[test]
    fn test_replication_two_axes_visits_each_once() {
        let replication = Replication::new([
            ReplicaAxis { count: 2, stride: 1 },
            ReplicaAxis { count: 3, stride: 4 },
        ]);
        let owners: Vec<usize> = replication.owners(0).collect();
        assert_eq!(owners, vec![0, 1, 4, 5, 8, 9]);
        assert_eq!(replication.replicas(), 6);
    }

    #[test]
    fn test_replication_drops_trivial_axes() {
        let replication = Replication::new([ReplicaAxis { count: 1, stride: 7 }]);
        assert_eq!(replication.ndim(), 0);
    }

    #[test]
    fn test_block_ownership_and_offsets() {
        // 10 x 2 数组，第 0 维按 3 块分布：块长 4,4,2
        let dims = [Dimension::new(1, 10), Dimension::new(1, 2)];
        let dist = BlockDistribution::new(&dims, 0, 3, 2);

        assert_eq!(dist.owner(&[1, 1]), 0);
        assert_eq!(dist.owner(&[5, 2]), 1);
        assert_eq!(dist.owner(&[10, 1]), 2);

        assert_eq!(dist.local_offset(&[9, 1]), Some(0));
        assert_eq!(dist.local_offset(&[10, 2]), Some(1 + 4));
        assert_eq!(dist.local_offset(&[4, 1]), None);
        assert_eq!(dist.local_stride(0), 1);
        assert_eq!(dist.local_stride(1), 4);
        assert_eq!(dist.local_len(), 8);
    }

    #[test]
    fn test_block_run_lengths_stop_at_block_edges() {
        let dims = [Dimension::from_extent(10)];
        let dist = BlockDistribution::new(&dims, 0, 3, 0);

        assert_eq!(dist.run_length(&[0], 0), 4);
        assert_eq!(dist.run_length(&[2], 0), 2);
        assert_eq!(dist.run_length(&[4], 0), 4);
        assert_eq!(dist.run_length(&[8], 0), 2);
    }

    #[test]
    fn test_block_on_outer_axis() {
        let dims = [Dimension::from_extent(3), Dimension::from_extent(4)];
        let dist = BlockDistribution::new(&dims, 1, 2, 1);

        assert_eq!(dist.run_length(&[0, 2], 0), 3);
        assert_eq!(dist.owner(&[1, 3]), 1);
        assert_eq!(dist.local_offset(&[1, 3]), Some(1 + 3));
        assert_eq!(dist.local_offset(&[1, 1]), None);
    }

    #[test]
    fn test_replicated_blocks() {
        let dims = [Dimension::from_extent(6)];
        // 2 块 x 2 副本，参与者 3 持有块 1 的第二个副本
        let dist = BlockDistribution::new(&dims, 0, 2, 3).with_replicas(2);

        assert_eq!(dist.owner(&[4]), 1);
        assert_eq!(dist.local_offset(&[4]), Some(1));

        let replication = dist.describe_replication();
        let owners: Vec<usize> = replication.owners(dist.owner(&[4])).collect();
        assert_eq!(owners, vec![1, 3]);
    }

    #[test]
    fn test_first_owner_shift() {
        let dims = [Dimension::from_extent(4)];
        let dist = BlockDistribution::new(&dims, 0, 1, 0).with_first_owner(2);

        assert_eq!(dist.owner(&[0]), 2);
        assert_eq!(dist.local_offset(&[0]), None);
        assert_eq!(dist.local_len(), 0);
    }

    #[test]
    fn test_rank_zero() {
        let dist = BlockDistribution::new(&[], 5, 4, 0);
        assert_eq!(dist.owner(&[]), 0);
        assert_eq!(dist.local_offset(&[]), Some(0));
        assert_eq!(dist.local_len(), 1);
        assert_eq!(dist.run_length(&[], 0), 1);
    }
}
