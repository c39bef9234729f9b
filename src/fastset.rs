//! Fast sets of small nonnegative integers
//!
//! 小非负整数快速集合
//!
//! Membership, removal and emptying are constant time. Adding is constant
//! time unless the backing arrays must grow. Union costs the size of the
//! second set; difference and intersection cost the size of the smaller set.
//!
//! 成员测试、删除和清空均为常数时间。添加在无需扩容时为常数时间。
//! 并集代价为第二个集合的大小；差集和交集代价为较小集合的大小。
//!
//! Memory grows with the largest value ever added, so values should stay
//! within a few thousand.
//!
//! 内存随曾经加入的最大值增长，因此值应保持在几千以内。

use std::fmt;
use std::iter::Copied;
use std::slice;

#[cfg(test)]
mod tests;

/// Sparse set over `0..limit`
///
/// `0..limit` 上的稀疏集合
///
/// Two arrays carry the set: `member` holds the distinct members in its
/// first `members` slots and stale values after them, and `index` maps a
/// value to its slot in `member`. A value `x` is present iff
///
/// 集合由两个数组承载：`member` 的前 `members` 个位置存放互不相同的成员，
/// 之后为陈旧值；`index` 将值映射到其在 `member` 中的位置。值 `x` 存在当且仅当
///
/// 1. `x < limit`
/// 2. `index[x] < members`
/// 3. `member[index[x]] == x`
///
/// Neither array is ever cleared, so stale slots may point anywhere;
/// the round trip rejects them.
///
/// 两个数组从不清零，陈旧位置可以指向任意处；往返校验会拒绝它们。
///
/// # Examples
///
/// ```
/// use collective_io::FastSet;
///
/// let mut set = FastSet::new();
/// set.add(3);
/// set.add(40);
/// set.add(3);
/// assert_eq!(set.len(), 2);
/// assert!(set.contains(40));
///
/// set.clear();
/// assert!(!set.contains(3));
/// assert!(set.limit() > 40);
/// ```
#[derive(Clone, Default)]
pub struct FastSet {
    members: usize,
    member: Vec<u32>,
    index: Vec<u32>,
}

impl FastSet {
    /// Create an empty set with no backing storage
    ///
    /// 创建无后备存储的空集合
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set that accepts values below `limit` without growing
    ///
    /// 创建可不扩容地容纳 `limit` 以下值的空集合
    pub fn with_limit(limit: usize) -> Self {
        Self {
            members: 0,
            member: vec![0; limit],
            index: vec![0; limit],
        }
    }

    /// Number of members
    ///
    /// 成员个数
    #[inline]
    pub fn len(&self) -> usize {
        self.members
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members == 0
    }

    /// Exclusive upper bound of values storable without growing
    ///
    /// 无需扩容即可存放的值的上界（不含）
    #[inline]
    pub fn limit(&self) -> usize {
        self.index.len()
    }

    /// Grow the backing arrays so values below `limit_hint` fit
    ///
    /// 扩展后备数组，使 `limit_hint` 以下的值可以放入
    ///
    /// Growth is at least geometric; existing members are kept.
    ///
    /// 至少按几何倍数增长；保留现有成员。
    pub fn reserve(&mut self, limit_hint: usize) {
        let limit = self.limit();
        if limit_hint <= limit {
            return;
        }
        let new_limit = limit_hint.max(limit * 2);
        tracing::trace!(from = limit, to = new_limit, "grow fast set");
        self.member.resize(new_limit, 0);
        self.index.resize(new_limit, 0);
    }

    /// Slot of `x` in `member` if `x` is present
    ///
    /// 若 `x` 存在，返回其在 `member` 中的位置
    #[inline]
    fn slot(&self, x: u32) -> Option<usize> {
        let idx = *self.index.get(x as usize)? as usize;
        (idx < self.members && self.member[idx] == x).then_some(idx)
    }

    #[inline]
    pub fn contains(&self, x: u32) -> bool {
        self.slot(x).is_some()
    }

    /// Add `x`; returns whether it was newly inserted
    ///
    /// 添加 `x`；返回是否为新插入
    ///
    /// # Memory
    ///
    /// Storage grows to at least `x + 1` slots of 8 bytes each, whatever
    /// the number of members. A value near `u32::MAX` asks for about
    /// 32 GiB, and the process aborts if that allocation fails.
    ///
    /// # 内存
    ///
    /// 无论成员多少，存储至少增长到 `x + 1` 个 8 字节的位置。接近 `u32::MAX`
    /// 的值约需 32 GiB，分配失败时进程会中止。
    pub fn add(&mut self, x: u32) -> bool {
        if x as usize >= self.limit() {
            self.reserve(x as usize + 1);
        } else if self.contains(x) {
            return false;
        }
        let idx = self.members;
        self.member[idx] = x;
        self.index[x as usize] = idx as u32;
        self.members += 1;
        true
    }

    /// Remove `x`; returns whether it was present
    ///
    /// 删除 `x`；返回其是否存在
    ///
    /// The last member moves into the vacated slot, so iteration order
    /// changes.
    ///
    /// 最后一个成员移入空出的位置，因此迭代顺序会改变。
    pub fn remove(&mut self, x: u32) -> bool {
        let Some(idx) = self.slot(x) else {
            return false;
        };
        self.members -= 1;
        let last = self.member[self.members];
        self.member[idx] = last;
        self.index[last as usize] = idx as u32;
        true
    }

    /// Remove and return some member
    ///
    /// 删除并返回某个成员
    #[inline]
    pub fn pop(&mut self) -> Option<u32> {
        if self.members == 0 {
            return None;
        }
        self.members -= 1;
        Some(self.member[self.members])
    }

    /// Remove every member in constant time; storage is kept as is
    ///
    /// 以常数时间删除所有成员；存储保持原样
    #[inline]
    pub fn clear(&mut self) {
        self.members = 0;
    }

    /// Member at physical position `idx`, for `idx < len()`
    ///
    /// 物理位置 `idx` 处的成员，要求 `idx < len()`
    #[inline]
    pub fn get(&self, idx: usize) -> Option<u32> {
        self.as_slice().get(idx).copied()
    }

    /// Members in physical order
    ///
    /// 按物理顺序排列的成员
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.member[..self.members]
    }

    #[inline]
    pub fn iter(&self) -> Copied<slice::Iter<'_, u32>> {
        self.as_slice().iter().copied()
    }

    /// Add every member of `ys`
    ///
    /// 加入 `ys` 的所有成员
    pub fn union(&mut self, ys: &FastSet) {
        if let Some(max) = ys.iter().max() {
            self.reserve(max as usize + 1);
        }
        for y in ys {
            self.add(y);
        }
    }

    /// Remove every member of `ys`
    ///
    /// 删除 `ys` 的所有成员
    pub fn difference(&mut self, ys: &FastSet) {
        if self.members <= ys.members {
            // Walking backwards, the member swapped into `i` has been seen already
            for i in (0..self.members).rev() {
                let x = self.member[i];
                if ys.contains(x) {
                    self.remove(x);
                }
            }
        } else {
            for y in ys {
                self.remove(y);
            }
        }
    }

    /// Keep only members also present in `ys`
    ///
    /// 仅保留同样存在于 `ys` 中的成员
    pub fn intersection(&mut self, ys: &FastSet) {
        if self.members <= ys.members {
            for i in (0..self.members).rev() {
                let x = self.member[i];
                if !ys.contains(x) {
                    self.remove(x);
                }
            }
            return;
        }

        // Gather shared members at the front, then cut the rest off
        let mut kept = 0;
        for y in ys {
            let Some(idx) = self.slot(y) else {
                continue;
            };
            let displaced = self.member[kept];
            self.member[kept] = y;
            self.index[y as usize] = kept as u32;
            self.member[idx] = displaced;
            self.index[displaced as usize] = idx as u32;
            kept += 1;
        }
        self.members = kept;
    }

    /// Thread `acc` through `f` for every member in physical order
    ///
    /// 按物理顺序对每个成员调用 `f`，传递累加值 `acc`
    ///
    /// ```
    /// use collective_io::FastSet;
    ///
    /// let set: FastSet = [2, 5, 9].into_iter().collect();
    /// assert_eq!(set.fold(0, |sum, x| sum + x), 16);
    /// ```
    pub fn fold<B>(&self, acc: B, f: impl FnMut(B, u32) -> B) -> B {
        self.iter().fold(acc, f)
    }

    /// Validate the representation
    ///
    /// 校验内部表示
    ///
    /// # Panics
    /// If a member fails the round trip or lies beyond the limit
    ///
    /// # Panics
    /// 某成员往返校验失败或超出上界时
    pub fn check(&self) {
        assert!(
            self.members <= self.limit(),
            "fast set holds {} members but limit is {}",
            self.members,
            self.limit()
        );
        assert_eq!(self.member.len(), self.index.len(), "fast set arrays disagree in length");
        for (idx, &x) in self.as_slice().iter().enumerate() {
            assert!((x as usize) < self.limit(), "member {} beyond limit {}", x, self.limit());
            assert_eq!(
                self.index[x as usize] as usize, idx,
                "member {} at slot {} is indexed elsewhere",
                x, idx
            );
        }
    }
}

impl fmt::Debug for FastSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Equal when both hold the same members, in any physical order
///
/// 两者成员相同即相等，与物理顺序无关
impl PartialEq for FastSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members && self.iter().all(|x| other.contains(x))
    }
}

impl Eq for FastSet {}

impl<'a> IntoIterator for &'a FastSet {
    type Item = u32;
    type IntoIter = Copied<slice::Iter<'a, u32>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<u32> for FastSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<u32> for FastSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = FastSet::new();
        set.extend(iter);
        set
    }
}
