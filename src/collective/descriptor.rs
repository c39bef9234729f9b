//! Distributed array descriptor
//!
//! 分布式数组描述符
//!
//! The descriptor is owned by the array-management layer and is read-only
//! for the duration of a collective call. This module models the parts the
//! I/O engine consumes: rank, global extents, element kind and length, the
//! local base-offset coefficient, and the [`Distribution`] strategy behind
//! which ownership and local addressing are resolved.
//!
//! 描述符由数组管理层拥有，在一次集合调用期间只读。本模块只描述 I/O 引擎
//! 需要的部分：秩、全局范围、元素类型与长度、本地基址偏移系数，以及负责
//! 解析归属与本地地址的 [`Distribution`] 策略。

use super::distribution::Distribution;
use std::fmt;
use std::sync::Arc;

/// Intrinsic element kind of an array
///
/// 数组元素的内建类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Logical1,
    Logical2,
    Logical4,
    Logical8,
    Int1,
    Int2,
    Int4,
    Int8,
    Real4,
    Real8,
    Real16,
    Complex8,
    Complex16,
    /// Character data; length comes from the descriptor
    ///
    /// 字符数据；长度由描述符给出
    Character,
    /// Derived (record) type; length comes from the descriptor
    ///
    /// 派生（记录）类型；长度由描述符给出
    Derived,
}

impl ElementKind {
    /// Natural byte size of the kind, or `None` for variable-length kinds
    ///
    /// 类型的固有字节大小，变长类型返回 `None`
    pub const fn size_of(self) -> Option<usize> {
        match self {
            ElementKind::Logical1 | ElementKind::Int1 => Some(1),
            ElementKind::Logical2 | ElementKind::Int2 => Some(2),
            ElementKind::Logical4 | ElementKind::Int4 | ElementKind::Real4 => Some(4),
            ElementKind::Logical8
            | ElementKind::Int8
            | ElementKind::Real8
            | ElementKind::Complex8 => Some(8),
            ElementKind::Real16 | ElementKind::Complex16 => Some(16),
            ElementKind::Character | ElementKind::Derived => None,
        }
    }

    /// Whether the kind needs variable-length marshaling
    ///
    /// 该类型是否需要变长编组
    #[inline]
    pub const fn is_variable_length(self) -> bool {
        matches!(self, ElementKind::Character | ElementKind::Derived)
    }
}

/// Global bounds of one array dimension
///
/// 数组某一维的全局边界
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    lbound: i64,
    extent: i64,
}

impl Dimension {
    /// Create a dimension from its lower bound and extent
    ///
    /// 由下界和范围创建维度
    ///
    /// A negative extent is clamped to zero.
    ///
    /// 负的范围会被截为零。
    #[inline]
    pub const fn new(lbound: i64, extent: i64) -> Self {
        Self {
            lbound,
            extent: if extent < 0 { 0 } else { extent },
        }
    }

    /// Create a zero-based dimension of the given extent
    ///
    /// 创建下界为 0 的维度
    #[inline]
    pub const fn from_extent(extent: i64) -> Self {
        Self::new(0, extent)
    }

    #[inline]
    pub const fn lbound(&self) -> i64 {
        self.lbound
    }

    /// Inclusive upper bound
    ///
    /// 上界（包含）
    #[inline]
    pub const fn ubound(&self) -> i64 {
        self.lbound + self.extent - 1
    }

    #[inline]
    pub const fn extent(&self) -> i64 {
        self.extent
    }

    #[inline]
    pub const fn contains(&self, index: i64) -> bool {
        index >= self.lbound && index <= self.ubound()
    }
}

/// Whether a descriptor describes a plain scalar or a distributed array
///
/// 描述符描述的是普通标量还是分布式数组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorTag {
    Scalar,
    Array,
}

/// Distribution metadata of an array descriptor
///
/// 数组描述符的分布元数据
#[derive(Clone)]
pub struct DistributedLayout {
    dims: Vec<Dimension>,
    base_offset: isize,
    distribution: Arc<dyn Distribution>,
}

impl DistributedLayout {
    #[inline]
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Local base-offset coefficient, in elements
    ///
    /// 本地基址偏移系数（以元素计）
    #[inline]
    pub fn base_offset(&self) -> isize {
        self.base_offset
    }

    #[inline]
    pub fn distribution(&self) -> &dyn Distribution {
        self.distribution.as_ref()
    }
}

impl fmt::Debug for DistributedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedLayout")
            .field("dims", &self.dims)
            .field("base_offset", &self.base_offset)
            .field("distribution", &self.distribution)
            .finish()
    }
}

/// Read-only descriptor of a scalar or distributed array
///
/// 标量或分布式数组的只读描述符
///
/// # Examples
///
/// ```
/// use collective_io::{ArrayDescriptor, BlockDistribution, Dimension, DescriptorTag, ElementKind};
/// use std::sync::Arc;
///
/// let dims = [Dimension::from_extent(8), Dimension::from_extent(3)];
/// let dist = BlockDistribution::new(&dims, 1, 3, 0);
/// let desc = ArrayDescriptor::array(ElementKind::Real8, &dims, Arc::new(dist));
///
/// assert_eq!(desc.tag(), DescriptorTag::Array);
/// assert_eq!(desc.rank(), 2);
/// assert_eq!(desc.global_size(), 24);
/// assert_eq!(desc.elem_len(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct ArrayDescriptor {
    kind: ElementKind,
    elem_len: usize,
    layout: Option<DistributedLayout>,
}

impl ArrayDescriptor {
    /// Describe a scalar of the given kind
    ///
    /// 描述给定类型的标量
    pub fn scalar(kind: ElementKind) -> Self {
        Self {
            kind,
            elem_len: kind.size_of().unwrap_or(0),
            layout: None,
        }
    }

    /// Describe a distributed array
    ///
    /// 描述分布式数组
    ///
    /// An empty `dims` slice describes a rank-0 distributed array.
    ///
    /// 空的 `dims` 表示秩为 0 的分布式数组。
    pub fn array(
        kind: ElementKind,
        dims: &[Dimension],
        distribution: Arc<dyn Distribution>,
    ) -> Self {
        Self {
            kind,
            elem_len: kind.size_of().unwrap_or(0),
            layout: Some(DistributedLayout {
                dims: dims.to_vec(),
                base_offset: 0,
                distribution,
            }),
        }
    }

    /// Override the element byte length (character and derived kinds)
    ///
    /// 覆盖元素字节长度（字符与派生类型）
    pub fn with_elem_len(mut self, elem_len: usize) -> Self {
        self.elem_len = elem_len;
        self
    }

    /// Set the local base-offset coefficient, in elements
    ///
    /// 设置本地基址偏移系数（以元素计）
    ///
    /// Has no effect on scalars.
    ///
    /// 对标量无效。
    pub fn with_base_offset(mut self, base_offset: isize) -> Self {
        if let Some(layout) = self.layout.as_mut() {
            layout.base_offset = base_offset;
        }
        self
    }

    #[inline]
    pub fn tag(&self) -> DescriptorTag {
        match self.layout {
            Some(_) => DescriptorTag::Array,
            None => DescriptorTag::Scalar,
        }
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn elem_len(&self) -> usize {
        self.elem_len
    }

    /// Number of dimensions; 0 for scalars and rank-0 arrays
    ///
    /// 维数；标量和秩为 0 的数组为 0
    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.as_ref().map_or(0, |layout| layout.dims.len())
    }

    /// Global element count
    ///
    /// 全局元素个数
    pub fn global_size(&self) -> i64 {
        match &self.layout {
            Some(layout) => layout.dims.iter().map(Dimension::extent).product(),
            None => 1,
        }
    }

    /// Distribution metadata, or `None` for a scalar
    ///
    /// 分布元数据，标量返回 `None`
    #[inline]
    pub fn as_distributed(&self) -> Option<&DistributedLayout> {
        self.layout.as_ref()
    }
}
