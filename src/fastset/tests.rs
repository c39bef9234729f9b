//! 快速集合测试模块

use super::*;
use std::collections::HashSet;

fn set_of(values: &[u32]) -> FastSet {
    values.iter().copied().collect()
}

fn sorted(set: &FastSet) -> Vec<u32> {
    let mut values: Vec<u32> = set.iter().collect();
    values.sort_unstable();
    values
}

/// 简单的线性同余序列，避免引入随机数依赖
fn lcg(seed: u64) -> impl Iterator<Item = u32> {
    let mut state = seed;
    std::iter::repeat_with(move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as u32
    })
}

mod elemental_tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let set = FastSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.limit(), 0);
        assert!(!set.contains(0));
        assert!(!set.contains(u32::MAX));
        assert_eq!(set.get(0), None);
        set.check();
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut set = FastSet::new();
        assert!(set.add(7));
        assert!(!set.add(7));
        assert_eq!(set.len(), 1);
        assert!(set.contains(7));
        assert!(!set.contains(6));
        set.check();
    }

    #[test]
    fn test_add_grows_and_keeps_members() {
        let mut set = FastSet::with_limit(4);
        set.add(1);
        set.add(3);
        assert_eq!(set.limit(), 4);

        set.add(100);
        assert!(set.limit() > 100);
        assert_eq!(sorted(&set), vec![1, 3, 100]);
        set.check();
    }

    #[test]
    fn test_storage_follows_largest_value() {
        // 单个大值决定存储大小，与成员数量无关
        let mut set = FastSet::new();
        assert!(set.add(5000));
        assert_eq!(set.len(), 1);
        assert_eq!(set.limit(), 5001);

        // 上界之外的查询与删除不会扩容
        assert!(!set.contains(u32::MAX));
        assert!(!set.remove(u32::MAX));
        assert_eq!(set.limit(), 5001);

        // 再次越界时至少翻倍
        assert!(set.add(5001));
        assert_eq!(set.limit(), 10002);
        set.check();
    }

    #[test]
    fn test_reserve_is_geometric() {
        let mut set = FastSet::with_limit(10);
        set.reserve(11);
        assert_eq!(set.limit(), 20);

        set.reserve(5);
        assert_eq!(set.limit(), 20);

        set.reserve(100);
        assert_eq!(set.limit(), 100);
    }

    #[test]
    fn test_remove_swaps_last_into_place() {
        let mut set = set_of(&[10, 20, 30, 40]);
        assert_eq!(set.as_slice(), &[10, 20, 30, 40]);

        assert!(set.remove(20));
        assert_eq!(set.as_slice(), &[10, 40, 30]);
        assert!(!set.contains(20));
        assert!(set.contains(10) && set.contains(30) && set.contains(40));

        // 删除不存在或越界的值无影响
        assert!(!set.remove(20));
        assert!(!set.remove(1_000_000));
        assert_eq!(set.len(), 3);
        set.check();
    }

    #[test]
    fn test_remove_last_member() {
        let mut set = set_of(&[5]);
        assert!(set.remove(5));
        assert!(set.is_empty());
        assert!(!set.contains(5));
        set.check();
    }

    #[test]
    fn test_pop_until_empty() {
        let mut set = set_of(&[4, 8, 15]);
        let mut popped = Vec::new();
        while let Some(x) = set.pop() {
            assert!(!set.contains(x));
            popped.push(x);
        }
        popped.sort_unstable();
        assert_eq!(popped, vec![4, 8, 15]);
        assert_eq!(set.pop(), None);
        set.check();
    }

    #[test]
    fn test_get_by_position() {
        let set = set_of(&[9, 2]);
        assert_eq!(set.get(0), Some(9));
        assert_eq!(set.get(1), Some(2));
        assert_eq!(set.get(2), None);
    }
}

mod clear_tests {
    use super::*;

    #[test]
    fn test_clear_leaves_no_visible_members() {
        let mut set = set_of(&[0, 1, 2, 63]);
        let limit = set.limit();
        set.clear();

        assert!(set.is_empty());
        assert_eq!(set.limit(), limit);
        for x in 0..limit as u32 {
            assert!(!set.contains(x));
        }
        set.check();
    }

    #[test]
    fn test_cleared_set_behaves_like_fresh_one() {
        let mut reused = set_of(&[3, 1, 4, 1, 5, 9, 2, 6]);
        reused.clear();
        let mut fresh = FastSet::with_limit(reused.limit());

        // 陈旧的索引指向旧位置，但往返校验必须拒绝它们
        for x in [9, 3, 7, 3, 0] {
            assert_eq!(reused.add(x), fresh.add(x));
        }
        for x in 0..reused.limit() as u32 {
            assert_eq!(reused.contains(x), fresh.contains(x), "value {}", x);
        }
        assert_eq!(reused.as_slice(), fresh.as_slice());
        assert_eq!(reused, fresh);
        reused.check();
    }

    #[test]
    fn test_stale_slot_pointing_at_live_range() {
        let mut set = set_of(&[5, 6]);
        set.clear();
        // 6 的陈旧索引为 1，5 的新位置为 0
        set.add(6);
        assert!(set.contains(6));
        assert!(!set.contains(5));
        set.add(5);
        assert!(set.contains(5));
        set.check();
    }
}

mod algebra_tests {
    use super::*;

    #[test]
    fn test_union() {
        let mut xs = set_of(&[1, 2, 3]);
        let ys = set_of(&[3, 4, 500]);
        xs.union(&ys);

        assert_eq!(sorted(&xs), vec![1, 2, 3, 4, 500]);
        assert!(!xs.contains(5));
        xs.check();
    }

    #[test]
    fn test_difference_smaller_left() {
        let mut xs = set_of(&[1, 2, 3]);
        let ys = set_of(&[2, 3, 4, 5, 6]);
        xs.difference(&ys);
        assert_eq!(sorted(&xs), vec![1]);
        xs.check();
    }

    #[test]
    fn test_difference_smaller_right() {
        let mut xs = set_of(&[1, 2, 3, 4, 5, 6]);
        let ys = set_of(&[2, 6, 99]);
        xs.difference(&ys);
        assert_eq!(sorted(&xs), vec![1, 3, 4, 5]);
        xs.check();
    }

    #[test]
    fn test_intersection_smaller_left() {
        let mut xs = set_of(&[1, 2, 3]);
        let ys = set_of(&[0, 2, 3, 4, 5]);
        xs.intersection(&ys);
        assert_eq!(sorted(&xs), vec![2, 3]);
        xs.check();
    }

    #[test]
    fn test_intersection_smaller_right() {
        let mut xs = set_of(&[1, 2, 3, 4, 5, 6]);
        let ys = set_of(&[6, 42, 2]);
        xs.intersection(&ys);
        assert_eq!(sorted(&xs), vec![2, 6]);
        assert!(!xs.contains(1));
        xs.check();
    }

    #[test]
    fn test_operations_with_empty_sets() {
        let empty = FastSet::new();

        let mut xs = set_of(&[1, 2]);
        xs.union(&empty);
        xs.difference(&empty);
        assert_eq!(sorted(&xs), vec![1, 2]);

        xs.intersection(&empty);
        assert!(xs.is_empty());

        let mut ys = FastSet::new();
        ys.union(&set_of(&[8]));
        assert_eq!(sorted(&ys), vec![8]);
    }

    #[test]
    fn test_algebra_against_hash_set() {
        let mut values = lcg(7).map(|v| v % 200);
        for _ in 0..50 {
            let a: Vec<u32> = values.by_ref().take(40).collect();
            let b: Vec<u32> = values.by_ref().take(25).collect();
            let ha: HashSet<u32> = a.iter().copied().collect();
            let hb: HashSet<u32> = b.iter().copied().collect();

            let mut u = set_of(&a);
            u.union(&set_of(&b));
            let mut d = set_of(&a);
            d.difference(&set_of(&b));
            let mut i = set_of(&a);
            i.intersection(&set_of(&b));
            let mut j = set_of(&b);
            j.intersection(&set_of(&a));

            for x in 0..200 {
                assert_eq!(u.contains(x), ha.contains(&x) || hb.contains(&x));
                assert_eq!(d.contains(x), ha.contains(&x) && !hb.contains(&x));
                assert_eq!(i.contains(x), ha.contains(&x) && hb.contains(&x));
                assert_eq!(j.contains(x), i.contains(x));
            }
            for set in [&u, &d, &i, &j] {
                set.check();
            }
        }
    }
}

mod trait_tests {
    use super::*;

    #[test]
    fn test_fold_threads_accumulator() {
        let set = set_of(&[3, 1, 2]);
        let order = set.fold(Vec::new(), |mut acc, x| {
            acc.push(x);
            acc
        });
        assert_eq!(order, set.as_slice());
        assert_eq!(set.fold(0u64, |sum, x| sum + x as u64), 6);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = set_of(&[1, 2, 3]);
        let mut b = set_of(&[3, 2, 1, 4]);
        assert_ne!(a, b);
        b.remove(4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_debug_lists_members() {
        let set = set_of(&[4, 2]);
        assert_eq!(format!("{:?}", set), "{4, 2}");
        assert_eq!(format!("{:?}", FastSet::new()), "{}");
    }

    #[test]
    fn test_extend_and_iterate() {
        let mut set = FastSet::new();
        set.extend([5, 5, 6]);
        let mut seen = Vec::new();
        for x in &set {
            seen.push(x);
        }
        assert_eq!(seen, vec![5, 6]);
    }

    #[test]
    #[should_panic(expected = "indexed elsewhere")]
    fn test_check_detects_broken_index() {
        let mut set = set_of(&[1, 2]);
        set.index[2] = 0;
        set.check();
    }
}
