//! Contiguous runs of array elements
//!
//! 数组元素的连续运行段

use super::descriptor::Dimension;
use super::distribution::Distribution;
use std::fmt;

/// A contiguous extent of elements along dimension 0
///
/// 沿第 0 维的连续元素段
///
/// `count` elements starting at global `index`, `stride` elements apart in
/// the local storage of whoever holds them.
///
/// 从全局 `index` 开始的 `count` 个元素，在持有者本地存储中相隔 `stride` 个元素。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Run {
    index: Vec<i64>,
    count: usize,
    stride: usize,
}

impl Run {
    #[inline]
    pub fn new(index: Vec<i64>, count: usize, stride: usize) -> Self {
        Self { index, count, stride }
    }

    /// The single run of a rank-0 array
    ///
    /// 秩为 0 的数组的唯一运行段
    #[inline]
    pub fn scalar() -> Self {
        Self::new(Vec::new(), 1, 1)
    }

    /// Global index tuple of the first element
    ///
    /// 首元素的全局下标元组
    #[inline]
    pub fn index(&self) -> &[i64] {
        &self.index
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of local elements spanned from the first to the last element
    ///
    /// 从首元素到末元素跨越的本地元素个数
    #[inline]
    pub fn span(&self) -> usize {
        match self.count {
            0 => 0,
            count => (count - 1) * self.stride + 1,
        }
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (n, i) in self.index.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", i)?;
        }
        write!(f, ")")
    }
}

/// Walks the global index space of an array as a sequence of runs
///
/// 将数组的全局下标空间遍历为一系列运行段
///
/// Indices are visited column-major (dimension 0 fastest). A run never
/// crosses a [`Distribution::run_length`] boundary, so all of its elements
/// share one owner set. The sequence depends only on global metadata and
/// is therefore identical on every participant.
///
/// 下标按列主序访问（第 0 维最快）。运行段从不跨越
/// [`Distribution::run_length`] 边界，因此其所有元素的归属集合相同。
/// 该序列只依赖全局元数据，因此在所有参与者上完全一致。
///
/// # Examples
///
/// ```
/// use collective_io::{BlockDistribution, Dimension, RunWalker};
///
/// let dims = [Dimension::from_extent(6), Dimension::from_extent(2)];
/// let dist = BlockDistribution::new(&dims, 0, 2, 0);
/// let runs: Vec<_> = RunWalker::new(&dims, &dist)
///     .map(|run| (run.index().to_vec(), run.count()))
///     .collect();
///
/// assert_eq!(runs, vec![
///     (vec![0, 0], 3),
///     (vec![3, 0], 3),
///     (vec![0, 1], 3),
///     (vec![3, 1], 3),
/// ]);
/// ```
pub struct RunWalker<'a> {
    dims: &'a [Dimension],
    distribution: &'a dyn Distribution,
    next: Option<Vec<i64>>,
}

impl<'a> RunWalker<'a> {
    pub fn new(dims: &'a [Dimension], distribution: &'a dyn Distribution) -> Self {
        let empty = dims.is_empty() || dims.iter().any(|dim| dim.extent() <= 0);
        let next = (!empty).then(|| dims.iter().map(Dimension::lbound).collect());
        Self {
            dims,
            distribution,
            next,
        }
    }

    /// Step `index` past a run of `count` elements; `None` when the walk ends
    ///
    /// 让 `index` 越过 `count` 个元素的运行段；遍历结束返回 `None`
    fn advance(&self, mut index: Vec<i64>, count: usize) -> Option<Vec<i64>> {
        index[0] += count as i64;
        if index[0] <= self.dims[0].ubound() {
            return Some(index);
        }
        index[0] = self.dims[0].lbound();
        for (i, dim) in index.iter_mut().zip(self.dims).skip(1) {
            *i += 1;
            if *i <= dim.ubound() {
                return Some(index);
            }
            *i = dim.lbound();
        }
        None
    }
}

impl Iterator for RunWalker<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let index = self.next.take()?;
        let remaining = (self.dims[0].ubound() - index[0] + 1) as usize;
        let count = self.distribution.run_length(&index, 0).clamp(1, remaining);
        let stride = self.distribution.local_stride(0);
        self.next = self.advance(index.clone(), count);
        Some(Run::new(index, count, stride))
    }
}
