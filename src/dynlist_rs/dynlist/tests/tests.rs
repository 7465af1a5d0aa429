/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use dynlist::{DynList, DynListError, MIN_CAPACITY, dynlist};
use std::cell::Cell;
use std::cmp::Ordering;

fn ascending(a: &i32, b: &i32) -> Ordering {
    a.cmp(b)
}

#[test]
fn test_append_remove_sort_insert_sorted() {
    let mut list = DynList::create();
    list.append(20);
    list.append(10);
    list.append(5);
    assert_eq!(list, [20, 10, 5]);
    assert_eq!(list.len(), 3);

    assert_eq!(list.remove(1), 10);
    assert_eq!(list, [20, 5]);

    list.sort_by(ascending);
    assert_eq!(list, [5, 20]);

    assert_eq!(list.insert_sorted_by(ascending, 12), Some(&mut 12));
    assert_eq!(list, [5, 12, 20]);
}

#[test]
fn test_growth_at_full_occupancy() {
    let mut list = DynList::create();
    for i in 0..MIN_CAPACITY {
        list.append(i);
    }
    assert_eq!(list.capacity(), MIN_CAPACITY);

    list.append(MIN_CAPACITY);
    assert_eq!(list.capacity(), 2 * MIN_CAPACITY);
}

#[test]
fn test_shrink_at_quarter_occupancy() {
    let mut list: DynList<u32> = (0..9).collect();
    assert_eq!(list.capacity(), 16);

    let mut capacities = Vec::new();
    while list.len() > 2 {
        list.remove(0);
        capacities.push((list.len(), list.capacity()));
    }
    assert_eq!(
        capacities,
        [(8, 16), (7, 16), (6, 16), (5, 16), (4, 8), (3, 8), (2, 4)]
    );
    assert_eq!(list, [7, 8]);
}

#[test]
fn test_remove_no_contract_keeps_capacity() {
    let mut list: DynList<u32> = (0..9).collect();
    while list.len() > 1 {
        list.remove_no_contract(0);
    }
    assert_eq!(list.capacity(), 16);
    assert_eq!(list, [8]);
}

#[test]
fn test_alternating_insert_remove_does_not_thrash() {
    let mut list: DynList<u32> = (0..4).collect();
    list.push(4);
    assert_eq!(list.capacity(), 8);
    for _ in 0..10 {
        list.pop();
        assert_eq!(list.capacity(), 8);
        list.push(4);
        assert_eq!(list.capacity(), 8);
    }
}

#[test]
fn test_uninitialized() {
    let mut list = DynList::<i32>::new();
    assert!(!list.is_initialized());
    assert_eq!(list.len(), 0);
    assert_eq!(list.capacity(), 0);
    assert!(list.as_slice().is_empty());

    list.sort_by(ascending);
    list.exchange_sort_by(ascending);
    assert_eq!(list.insert_sorted_by(ascending, 1), None);
    list.truncate(0);
    list.destroy();
    assert_eq!(
        list.try_insert(0, 1).err(),
        Some(DynListError::Uninitialized)
    );
    assert_eq!(list.try_remove(0, true), Err(DynListError::Uninitialized));
}

#[test]
fn test_init_and_destroy() {
    let mut list = DynList::<u64>::new();
    list.init(10);
    assert!(list.is_initialized());
    assert_eq!(list.capacity(), 16);
    list.push(1);

    assert_eq!(list.try_init(0), Err(DynListError::AlreadyInitialized));

    list.destroy();
    assert!(!list.is_initialized());
    assert_eq!(list.capacity(), 0);
    list.destroy();
}

#[test]
#[should_panic(expected = "dynlist is already initialized")]
fn test_double_init() {
    let mut list = DynList::<u8>::create();
    list.init(4);
}

#[test]
#[should_panic(expected = "dynlist is not initialized")]
fn test_append_uninitialized() {
    let mut list = DynList::<u8>::new();
    list.append(1);
}

#[test]
#[should_panic(expected = "dynlist is not initialized")]
fn test_copy_uninitialized() {
    let list = DynList::<u8>::new();
    let _ = list.copy();
}

#[test]
#[should_panic(expected = "dynlist is not initialized")]
fn test_pop_uninitialized() {
    let mut list = DynList::<u8>::new();
    list.pop();
}

#[test]
#[should_panic(expected = "dynlist is not initialized")]
fn test_clear_uninitialized() {
    let mut list = DynList::<u8>::new();
    list.clear();
}

#[test]
#[should_panic(expected = "index 4 is out of bounds for a dynlist of size 3")]
fn test_insert_out_of_bounds() {
    let mut list = dynlist![1, 2, 3];
    list.insert(4, 4);
}

#[test]
#[should_panic(expected = "index 3 is out of bounds for a dynlist of size 3")]
fn test_remove_out_of_bounds() {
    let mut list = dynlist![1, 2, 3];
    list.remove(3);
}

#[test]
#[should_panic(expected = "cannot remove an element from an empty dynlist")]
fn test_remove_empty() {
    let mut list = DynList::<u8>::create();
    list.remove(0);
}

#[test]
fn test_try_remove() {
    let mut list = dynlist![1, 2];
    assert_eq!(
        list.try_remove(2, true),
        Err(DynListError::IndexOutOfBounds { index: 2, len: 2 })
    );
    assert_eq!(list.try_remove(0, false), Ok(1));
    assert_eq!(list.try_remove(0, true), Ok(2));
    assert_eq!(list.try_remove(0, true), Err(DynListError::Empty));
}

#[test]
fn test_insert_positions() {
    let mut list = DynList::create();
    list.append(10);
    *list.append(0) = 20;
    list.prepend(5);
    list.insert(3, 7);
    list.insert(1, 6);
    assert_eq!(list, [5, 6, 10, 20, 7]);
}

#[test]
fn test_insert_returns_slot() {
    let mut list = dynlist![1, 2, 3];
    let slot = list.insert(1, 0);
    *slot = 9;
    assert_eq!(list, [1, 9, 2, 3]);
}

#[test]
fn test_pop() {
    let mut list = dynlist![1, 2, 3];
    assert_eq!(list.pop(), Some(3));
    assert_eq!(list.pop(), Some(2));
    assert_eq!(list.pop(), Some(1));
    assert_eq!(list.pop(), None);
    assert!(list.is_initialized());
    assert_eq!(list.capacity(), MIN_CAPACITY);
}

#[test]
fn test_ensure() {
    let mut list = DynList::<u16>::create();
    list.ensure(9);
    assert_eq!(list.capacity(), 16);
    list.ensure(3);
    assert_eq!(list.capacity(), 16);
    assert_eq!(
        DynList::<u16>::new().try_ensure(1),
        Err(DynListError::Uninitialized)
    );
}

#[test]
fn test_resize() {
    let mut list = dynlist![1, 2, 3];
    list.resize(6, 0);
    assert_eq!(list, [1, 2, 3, 0, 0, 0]);
    assert_eq!(list.capacity(), 8);

    list.resize(2, 0);
    assert_eq!(list, [1, 2]);
    assert_eq!(list.capacity(), 8);

    list.resize(40, 7);
    assert_eq!(list.len(), 40);
    assert_eq!(list.capacity(), 64);
    list.resize_no_contract(1, 0);
    assert_eq!(list, [1]);
    assert_eq!(list.capacity(), 64);
}

#[test]
fn test_resize_round_trip_capacity() {
    for n in [0, 1, 3, 4, 5, 17, 100] {
        let mut list = DynList::<u8>::create();
        list.resize(n, 1);
        let capacity = list.capacity();
        list.resize(0, 1);
        assert_eq!(list.capacity(), capacity);
        list.resize(n, 1);
        assert_eq!(list.capacity(), capacity);
        assert!(list.capacity() >= n);
        assert!(list.capacity().is_power_of_two());
    }
}

#[test]
fn test_shrinking_resize_keeps_storage() {
    let mut list: DynList<i32> = (0..100).collect();
    assert_eq!(list.capacity(), 128);
    let data = list.as_ptr();

    list.resize(10, 0);
    assert_eq!(list, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(list.capacity(), 128);
    assert_eq!(list.as_ptr(), data);

    list.resize_with(0, || 0);
    assert!(list.is_empty());
    assert_eq!(list.capacity(), 128);
    assert_eq!(list.as_ptr(), data);

    list.resize(50, 1);
    assert_eq!(list.capacity(), 128);
    assert_eq!(list.as_ptr(), data);
}

#[test]
fn test_resize_with() {
    let mut next = 0;
    let mut list = DynList::create();
    list.resize_with(5, || {
        next += 1;
        next
    });
    assert_eq!(list, [1, 2, 3, 4, 5]);
}

#[test]
fn test_clear() {
    let mut list: DynList<i32> = (0..100).collect();
    assert_eq!(list.capacity(), 128);
    let data = list.as_ptr();
    list.clear();
    assert!(list.is_empty());
    assert!(list.is_initialized());
    assert_eq!(list.capacity(), 128);
    assert_eq!(list.as_ptr(), data);

    list.push(3);
    list.push(4);
    assert_eq!(list, [3, 4]);
}

#[test]
fn test_copy_is_independent() {
    let mut list = dynlist![1, 2, 3, 4, 5];
    let mut copy = list.copy();
    assert_eq!(list, copy);
    assert_eq!(copy.capacity(), 8);

    list[0] = 10;
    list.push(6);
    copy[4] = 50;
    assert_eq!(list, [10, 2, 3, 4, 5, 6]);
    assert_eq!(copy, [1, 2, 3, 4, 50]);
}

#[test]
fn test_clone() {
    let list = dynlist![String::from("a"), String::from("b")];
    let clone = list.clone();
    assert_eq!(list, clone);

    let uninit = DynList::<String>::new();
    assert!(!uninit.clone().is_initialized());
}

#[test]
fn test_append_all() {
    let mut dst = dynlist![1, 2, 3];
    let src = dynlist![4, 5, 6, 7, 8];
    dst.append_all(&src);
    assert_eq!(dst, [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(dst.capacity(), 8);
    assert_eq!(src, [4, 5, 6, 7, 8]);

    let empty = DynList::create();
    dst.append_all(&empty);
    assert_eq!(dst.len(), 8);

    assert_eq!(
        dst.try_append_all(&DynList::new()),
        Err(DynListError::Uninitialized)
    );
}

#[test]
#[should_panic(expected = "dynlist is not initialized")]
fn test_append_all_into_uninitialized() {
    let mut dst = DynList::new();
    dst.append_all(&dynlist![1]);
}

#[test]
fn test_extend_from_slice() {
    let mut list = dynlist![1];
    list.extend_from_slice(&[2, 3, 4, 5]);
    assert_eq!(list, [1, 2, 3, 4, 5]);
    assert_eq!(list.capacity(), 8);
}

#[test]
fn test_sort_by() {
    let mut list = dynlist![9, 3, 7, 1, 8, 2];
    list.sort_by(ascending);
    assert_eq!(list, [1, 2, 3, 7, 8, 9]);
    list.sort_by(ascending);
    assert_eq!(list, [1, 2, 3, 7, 8, 9]);

    list.sort_by(|a, b| b.cmp(a));
    assert_eq!(list, [9, 8, 7, 3, 2, 1]);

    let mut empty = DynList::<i32>::create();
    empty.sort_by(ascending);
    assert!(empty.is_empty());
}

#[test]
fn test_sorts_agree_on_equal_keys() {
    let pairs = [(3, 'a'), (1, 'b'), (3, 'c'), (2, 'd'), (1, 'e'), (3, 'f')];
    let by_key = |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0);

    let mut fast = DynList::from(pairs);
    let mut exchange = DynList::from(pairs);
    fast.sort_by(by_key);
    exchange.exchange_sort_by(by_key);

    assert_eq!(fast, exchange);
    assert_eq!(
        fast,
        [(1, 'b'), (1, 'e'), (2, 'd'), (3, 'a'), (3, 'c'), (3, 'f')]
    );
}

#[test]
fn test_exchange_sort_small_lists() {
    let mut one = dynlist![1];
    one.exchange_sort_by(ascending);
    assert_eq!(one, [1]);

    let mut two = dynlist![2, 1];
    two.exchange_sort_by(ascending);
    assert_eq!(two, [1, 2]);
}

#[test]
fn test_insert_sorted_after_equal_elements() {
    let by_key = |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0);
    let mut list = dynlist![(1, 'a'), (2, 'b'), (2, 'c'), (3, 'd')];
    list.insert_sorted_by(by_key, (2, 'x'));
    assert_eq!(list, [(1, 'a'), (2, 'b'), (2, 'c'), (2, 'x'), (3, 'd')]);

    list.insert_sorted_by(by_key, (0, 'y'));
    list.insert_sorted_by(by_key, (9, 'z'));
    assert_eq!(list[0], (0, 'y'));
    assert_eq!(list[list.len() - 1], (9, 'z'));
}

#[test]
fn test_insert_sorted_into_empty() {
    let mut list = DynList::create();
    for value in [5, 1, 4, 2, 3] {
        list.insert_sorted_by(ascending, value);
    }
    assert_eq!(list, [1, 2, 3, 4, 5]);
}

#[test]
fn test_remove_while_iterating() {
    let mut list: DynList<i32> = (1..=10).collect();
    let mut i = 0;
    while i < list.len() {
        if list[i] % 3 == 0 {
            list.remove(i);
        } else {
            i += 1;
        }
    }
    assert_eq!(list, [1, 2, 4, 5, 7, 8, 10]);
}

#[test]
fn test_retain() {
    let mut list: DynList<i32> = (1..=10).collect();
    list.retain(|x| x % 3 != 0);
    assert_eq!(list, [1, 2, 4, 5, 7, 8, 10]);
    assert_eq!(list.capacity(), 16);

    list.retain_mut(|x| {
        *x *= 2;
        *x > 10
    });
    assert_eq!(list, [14, 16, 20]);
}

#[test]
fn test_iteration() {
    let mut list = dynlist![1, 2, 3];
    for x in &mut list {
        *x *= 10;
    }
    let collected: Vec<i32> = (&list).into_iter().copied().collect();
    assert_eq!(collected, [10, 20, 30]);
    assert_eq!(list.iter().sum::<i32>(), 60);
}

#[test]
fn test_macro() {
    let list: DynList<i32> = dynlist![];
    assert!(list.is_initialized());
    assert_eq!(list.capacity(), MIN_CAPACITY);

    let list = dynlist![1, 2, 3, 4, 5,];
    assert_eq!(list, [1, 2, 3, 4, 5]);
    assert_eq!(list.capacity(), 8);

    let list = dynlist!["x"; 3];
    assert_eq!(list, ["x", "x", "x"]);
}

#[test]
fn test_partial_eq() {
    let a = dynlist![1, 2, 3];
    let b = dynlist![1, 2, 3];
    let c = dynlist![1, 2];
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, vec![1, 2, 3]);
    assert_eq!(a, &[1, 2, 3][..]);
    assert_eq!(DynList::<i32>::new(), DynList::<i32>::create());
}

#[test]
fn test_debug() {
    let list = dynlist![1, 2];
    assert_eq!(format!("{list:?}"), "[1, 2]");
}

#[test]
fn test_mem_usage() {
    let mut list = DynList::<u32>::create();
    assert_eq!(list.mem_usage(), 16);
    list.extend(0..5);
    assert_eq!(list.mem_usage(), 32);
    list.destroy();
    assert_eq!(list.mem_usage(), 0);
}

#[derive(Clone)]
struct DropCounter<'a> {
    count: &'a Cell<u32>,
}

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        self.count.set(self.count.get() + 1);
    }
}

#[test]
fn test_elements_dropped_exactly_once() {
    let count = Cell::new(0);
    {
        let mut list = DynList::create();
        for _ in 0..10 {
            list.push(DropCounter { count: &count });
        }
        let removed = list.remove(3);
        assert_eq!(count.get(), 0);
        drop(removed);
        assert_eq!(count.get(), 1);

        list.truncate(5);
        assert_eq!(count.get(), 5);
    }
    assert_eq!(count.get(), 10);
}

#[test]
fn test_destroy_drops_elements() {
    let count = Cell::new(0);
    let mut list = DynList::create();
    list.resize(6, DropCounter { count: &count });
    // The fill value itself is dropped once `resize` returns.
    assert_eq!(count.get(), 1);
    list.destroy();
    assert_eq!(count.get(), 7);
    list.destroy();
    assert_eq!(count.get(), 7);
}

#[test]
fn test_copy_clones_elements() {
    let count = Cell::new(0);
    let mut list = DynList::create();
    list.push(DropCounter { count: &count });
    list.push(DropCounter { count: &count });
    let copy = list.copy();
    drop(list);
    assert_eq!(count.get(), 2);
    drop(copy);
    assert_eq!(count.get(), 4);
}

#[test]
fn test_zero_sized_elements() {
    let mut list = DynList::create();
    for _ in 0..10 {
        list.push(());
    }
    assert_eq!(list.len(), 10);
    assert_eq!(list.capacity(), 16);
    assert_eq!(list.mem_usage(), 0);

    list.remove(0);
    list.truncate(1);
    list.pop();
    assert!(list.is_empty());
    assert_eq!(list.capacity(), MIN_CAPACITY);
}

#[test]
fn test_from_slice_and_array() {
    let from_slice = DynList::from(&["a", "b"][..]);
    let from_array = DynList::from(["a", "b"]);
    assert_eq!(from_slice, from_array);
    assert_eq!(from_array.capacity(), MIN_CAPACITY);
}

#[test]
fn test_default_is_uninitialized() {
    let list: DynList<u8> = Default::default();
    assert!(!list.is_initialized());
}

#[test]
fn test_hash_matches_slice() {
    use std::hash::{DefaultHasher, Hash, Hasher};

    let hash = |value: &dyn Fn(&mut DefaultHasher)| {
        let mut hasher = DefaultHasher::new();
        value(&mut hasher);
        hasher.finish()
    };
    let list = dynlist![1u8, 2, 3];
    assert_eq!(
        hash(&|h| list.hash(h)),
        hash(&|h| [1u8, 2, 3][..].hash(h))
    );
}

#[test]
#[should_panic(
    expected = "The size of the array of elements within `DynList<T>` would exceed `isize::MAX`, which is the maximum size that can be allocated."
)]
fn test_capacity_overflow() {
    DynList::<u64>::with_capacity(isize::MAX as usize / 4);
}
