//! Integration tests for the `growable_array` package.
//!
//! These tests exercise the public API end to end: growth behavior, positional editing,
//! storage reuse by assignment, value semantics of copies and moves, and the raw building
//! blocks that the array is made of.

use std::cell::Cell;
use std::mem;
use std::rc::Rc;
use std::thread;

use growable_array::{
    DropPolicy, Error, GrowableArray, RawAllocator, construct_clone, destroy_range,
    growable_array, swap,
};

/// Element that records how many instances have been dropped.
#[derive(Debug)]
struct Tracked {
    value: u32,
    drops: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(value: u32, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            value,
            drops: Rc::clone(drops),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.drops)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get().wrapping_add(1));
    }
}

fn values_of(array: &GrowableArray<Tracked>) -> Vec<u32> {
    array.iter().map(|item| item.value).collect()
}

#[test]
fn push_insert_erase_sequence() {
    let mut array = GrowableArray::new();

    array.push_back(1).unwrap();
    array.push_back(2).unwrap();
    array.push_back(3).unwrap();

    assert_eq!(array.insert(1, 9), Ok(1));
    assert_eq!(array, [1, 9, 2, 3]);
    assert!(array.capacity() >= 4);

    assert_eq!(array.erase(0), Ok(0));
    assert_eq!(array, [9, 2, 3]);
    assert_eq!(array.front(), Some(&9));
}

#[test]
fn insert_then_erase_restores_sequence() {
    // Spare capacity 0 forces reallocation. With spare capacity the gap is opened in place,
    // with the tail either longer or shorter than the inserted run depending on the position.
    for len in 0..8_usize {
        for spare in [0_usize, 1, 3, 10] {
            for position in 0..=len {
                for width in 1..=4_usize {
                    let mut array = GrowableArray::builder()
                        .capacity(len + spare)
                        .build()
                        .unwrap();
                    array
                        .assign_iter((0..len).map(|value| value.to_string()))
                        .unwrap();

                    let original = array.clone();

                    assert_eq!(array.insert(position, String::from("new")), Ok(position));
                    assert_eq!(array.erase(position), Ok(position));
                    assert_eq!(
                        array, original,
                        "insert then erase at {position} of {len} with {spare} spare"
                    );

                    let filler = String::from("filler");
                    assert_eq!(array.insert_n(position, width, &filler), Ok(position));
                    assert_eq!(array.len(), len + width);
                    assert_eq!(array.erase_range(position..position + width), Ok(position));
                    assert_eq!(
                        array, original,
                        "insert_n({width}) then erase_range at {position} of {len} with {spare} spare"
                    );
                }
            }
        }
    }
}

#[test]
fn capacity_sequence_of_repeated_push() {
    let mut array = GrowableArray::new();
    let mut capacities = Vec::new();

    for value in 0..17_u32 {
        array.push_back(value).unwrap();

        if capacities.last() != Some(&array.capacity()) {
            capacities.push(array.capacity());
        }
    }

    assert_eq!(capacities, [1, 2, 4, 8, 16, 32]);
}

#[test]
fn reserve_then_fill_never_reallocates() {
    let mut array = GrowableArray::new();
    array.reserve(1000).unwrap();

    let block = array.as_ptr();

    for value in 0..1000_u64 {
        array.push_back(value).unwrap();
    }

    assert_eq!(array.capacity(), 1000);
    assert_eq!(array.as_ptr(), block);

    // Exceeding the reservation grows by doubling.
    array.push_back(1000).unwrap();
    assert_eq!(array.capacity(), 2000);
}

#[test]
fn reserve_zero_on_empty_does_not_allocate() {
    let mut array = GrowableArray::<String>::new();

    array.reserve(0).unwrap();

    assert_eq!(array.capacity(), 0);
    assert!(array.is_empty());
}

#[test]
fn move_leaves_source_empty() {
    let drops = Rc::new(Cell::new(0));
    let mut source = GrowableArray::new();

    for value in 0..3 {
        source.push_back(Tracked::new(value, &drops)).unwrap();
    }

    let target = mem::take(&mut source);

    assert_eq!(values_of(&target), [0, 1, 2]);
    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);
    assert_eq!(drops.get(), 0);
}

#[test]
fn assign_two_values_onto_five() {
    let drops = Rc::new(Cell::new(0));
    let mut array = GrowableArray::new();

    for value in 0..5 {
        array.push_back(Tracked::new(value, &drops)).unwrap();
    }

    let value = Tracked::new(77, &drops);
    let before = drops.get();

    array.assign_n(2, &value).unwrap();

    assert_eq!(values_of(&array), [77, 77]);
    assert_eq!(array.len(), 2);

    // Three surplus elements destroyed, two overwritten.
    assert_eq!(drops.get() - before, 5);
}

#[test]
fn copies_are_independent() {
    let original = growable_array![String::from("a"), String::from("b")];
    let mut copy = original.clone();

    copy.push_back(String::from("c")).unwrap();
    copy[0].push('!');

    let mut assigned = GrowableArray::new();
    assigned.clone_from(&copy);
    assigned.clear();

    assert_eq!(original, ["a", "b"]);
    assert_eq!(copy, ["a!", "b", "c"]);
    assert!(assigned.is_empty());
}

#[test]
fn source_changes_do_not_reach_copies() {
    let mut original = growable_array![String::from("a"), String::from("b")];
    let copy = original.clone();

    let mut assigned = GrowableArray::new();
    assigned.clone_from(&original);

    original[0].push('!');
    original.push_back(String::from("c")).unwrap();
    original.erase(1).unwrap();

    assert_eq!(original, ["a!", "c"]);
    assert_eq!(copy, ["a", "b"]);
    assert_eq!(assigned, ["a", "b"]);
}

#[test]
fn every_element_dropped_exactly_once() {
    let drops = Rc::new(Cell::new(0));

    {
        let mut array = GrowableArray::new();

        for value in 0..10 {
            array.push_back(Tracked::new(value, &drops)).unwrap();
        }

        array.insert_n(3, 4, &Tracked::new(100, &drops)).unwrap();
        array.erase_range(0..2).unwrap();
        array.resize_value(20, &Tracked::new(200, &drops)).unwrap();
        array.truncate(5);
        array.shrink_to_fit();
        drop(array.pop_back());
        drop(array.remove(0).unwrap());
    }

    // 10 pushed, 2 temporaries, 4 inserted and 8 appended by the resize.
    assert_eq!(drops.get(), 24);
}

#[test]
fn failed_operations_leave_array_unchanged() {
    let mut array = growable_array![1_u64, 2, 3];
    let capacity = array.capacity();
    let max = GrowableArray::<u64>::max_size();

    assert_eq!(
        array.insert(4, 0),
        Err(Error::OutOfRange { index: 4, len: 3 })
    );
    assert_eq!(array.erase(3), Err(Error::OutOfRange { index: 3, len: 3 }));
    assert_eq!(array.at(3), Err(Error::OutOfRange { index: 3, len: 3 }));

    assert!(matches!(
        array.reserve(max + 1),
        Err(Error::LengthExceeded { .. })
    ));
    assert!(matches!(
        array.insert_n(0, max, &0),
        Err(Error::LengthExceeded { .. })
    ));
    assert!(matches!(
        array.resize(usize::MAX),
        Err(Error::LengthExceeded { .. })
    ));
    assert!(matches!(
        array.assign_n(max + 1, &0),
        Err(Error::LengthExceeded { .. })
    ));

    assert_eq!(array, [1, 2, 3]);
    assert_eq!(array.capacity(), capacity);
}

#[test]
fn zero_sized_elements() {
    let mut array = growable_array![(); 5];

    assert_eq!(array.len(), 5);
    assert_eq!(array.capacity(), usize::MAX);
    assert_eq!(GrowableArray::<()>::max_size(), usize::MAX);

    array.insert(2, ()).unwrap();
    array.erase(0).unwrap();
    array.assign_n(3, &()).unwrap();
    assert_eq!(array.len(), 3);

    let copy = array.clone();
    assert_eq!(copy, array);
}

#[test]
fn swap_is_constant_time_exchange() {
    let mut a = growable_array![1, 2, 3];
    let mut b = growable_array![4];
    let a_block = a.as_ptr();
    let b_block = b.as_ptr();

    swap(&mut a, &mut b);

    assert_eq!(a, [4]);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(a.as_ptr(), b_block);
    assert_eq!(b.as_ptr(), a_block);
}

#[test]
fn comparison_operators() {
    let short = growable_array![1, 2];
    let long = growable_array![1, 2, 0];
    let larger = growable_array![1, 3];

    assert!(short < long);
    assert!(long < larger);
    assert!(short <= short.clone());
    assert_ne!(short, long);
    assert_eq!(short.cmp(&larger), std::cmp::Ordering::Less);
}

#[test]
fn move_between_threads() {
    let array: GrowableArray<String> = (0..100).map(|value| value.to_string()).collect();

    let handle = thread::spawn(move || {
        let mut array = array;
        array.push_back(String::from("done")).unwrap();
        array
    });

    let array = handle.join().unwrap();

    assert_eq!(array.len(), 101);
    assert_eq!(array.back().map(String::as_str), Some("done"));
}

#[test]
#[should_panic(expected = "forbidden by DropPolicy::MustNotDropItems")]
fn must_not_drop_items_enforced() {
    let mut array = GrowableArray::builder()
        .drop_policy(DropPolicy::MustNotDropItems)
        .build()
        .unwrap();

    array.push_back(String::from("leftover")).unwrap();
}

#[test]
fn must_not_drop_items_satisfied_by_draining() {
    let mut array = GrowableArray::builder()
        .drop_policy(DropPolicy::MustNotDropItems)
        .capacity(4)
        .build()
        .unwrap();

    array.extend([1, 2, 3]);

    let drained: Vec<_> = array.into_iter().collect();
    assert_eq!(drained, [1, 2, 3]);
}

#[test]
fn raw_building_blocks() {
    let allocator = RawAllocator::<String>::new();
    let block = allocator.allocate(3).unwrap();
    let source = String::from("copy me");

    // SAFETY: The block has room for 3 elements and we construct each slot exactly once
    // before destroying all of them and releasing the block.
    unsafe {
        for index in 0..3 {
            construct_clone(block.add(index), &source);
        }

        assert_eq!(block.add(2).as_ref(), "copy me");

        destroy_range(block, 3);
        allocator.deallocate(block, 3);
    }
}
