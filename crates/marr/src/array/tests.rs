use std::cell::Cell;
use std::rc::Rc;

use marr_generic::{Constant, Product};
use pretty_assertions::assert_eq;

use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Generic for Point {
    type Rep = Product<f64, f64>;

    fn into_rep(self) -> Self::Rep {
        Product(self.x, self.y)
    }

    fn from_rep(rep: Self::Rep) -> Self {
        Point { x: rep.0, y: rep.1 }
    }
}

/// Opaque payload whose live instances are counted.
#[derive(Debug)]
struct Tracked(Rc<Cell<usize>>);

impl Tracked {
    fn new(live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Tracked(Rc::clone(live))
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(&self.0)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl Generic for Tracked {
    type Rep = Constant<Tracked>;

    fn into_rep(self) -> Self::Rep {
        Constant(self)
    }

    fn from_rep(rep: Self::Rep) -> Self {
        rep.0
    }
}

// === Construction ===

#[test]
fn new_is_empty() {
    let array = MultiArray::<i32>::new();
    assert!(array.is_empty());
    assert_eq!(array.len(), 0);
    assert_eq!(array.get(0), None);
    assert_eq!(array, MultiArray::default());
}

#[test]
fn from_fn_fills_in_index_order() {
    let mut seen = Vec::new();
    let array = MultiArray::from_fn(4, |i| {
        seen.push(i);
        i as u32 * 10
    });
    assert_eq!(seen, [0, 1, 2, 3]);
    assert_eq!(array.to_vec(), [0, 10, 20, 30]);
}

#[test]
fn try_from_fn_stops_at_first_error() {
    let mut calls = 0;
    let result = MultiArray::<u8>::try_from_fn(10, |i| {
        calls += 1;
        if i == 3 {
            Err("boom")
        } else {
            Ok(1)
        }
    });
    assert_eq!(result, Err("boom"));
    assert_eq!(calls, 4);
}

#[test]
fn repeat_clones_value() {
    let array = MultiArray::repeat(Point { x: 1.0, y: 2.0 }, 3);
    assert_eq!(array.len(), 3);
    assert!(array.iter().all(|p| p == Point { x: 1.0, y: 2.0 }));
}

#[test]
fn conversions_from_sequences() {
    let expected = [3_i16, 1, 4, 1, 5];
    assert_eq!(MultiArray::<i16>::from(expected).to_vec(), expected);
    assert_eq!(MultiArray::<i16>::from(expected.to_vec()).to_vec(), expected);
    assert_eq!(MultiArray::<i16>::from(&expected[..]).to_vec(), expected);
    assert_eq!(Vec::from(MultiArray::<i16>::from(expected)), expected);
}

#[test]
fn collect_with_exact_and_inexact_hints() {
    let exact: MultiArray<u64> = (0..5).collect();
    assert_eq!(exact.to_vec(), [0, 1, 2, 3, 4]);

    let filtered: MultiArray<u64> = (0..10).filter(|n| n % 3 == 0).collect();
    assert_eq!(filtered.to_vec(), [0, 3, 6, 9]);
}

/// Reports an exact length that is wrong.
struct Lying {
    remaining: usize,
    claimed: usize,
}

impl Iterator for Lying {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(7)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.claimed, Some(self.claimed))
    }
}

#[test]
fn collect_tolerates_wrong_size_hint() {
    let short: MultiArray<u8> = Lying {
        remaining: 2,
        claimed: 5,
    }
    .collect();
    assert_eq!(short.to_vec(), [7, 7]);

    let long: MultiArray<u8> = Lying {
        remaining: 6,
        claimed: 3,
    }
    .collect();
    assert_eq!(long.len(), 6);
}

// === Access ===

#[test]
fn get_set_update() {
    let mut array = MultiArray::<Point>::from([Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }]);
    array.set(1, Point { x: 5.0, y: 6.0 });
    assert_eq!(array.get(1), Some(Point { x: 5.0, y: 6.0 }));

    array.update(0, |p| Point { x: p.x + 1.0, ..p });
    assert_eq!(array.get(0), Some(Point { x: 1.0, y: 0.0 }));
    assert_eq!(array.get(2), None);
}

#[test]
#[should_panic(expected = "index out of range: the len is 2 but the index is 2")]
fn set_out_of_range_panics() {
    let mut array = MultiArray::<i32>::from([1, 2]);
    array.set(2, 3);
}

#[test]
#[should_panic(expected = "index out of range")]
fn update_out_of_range_panics() {
    let mut array = MultiArray::<i32>::new();
    array.update(0, |v| v);
}

#[test]
fn columns_are_separate_regions() {
    let array = MultiArray::<Point>::from([Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 4.0 }]);
    let (xs, ys) = array.storage().buffer();
    assert_eq!(ys as usize - xs as usize, 2 * std::mem::size_of::<f64>());
}

// === Mapping ===

#[test]
fn map_matches_vec_map() {
    for len in [0, 1, 2, 17] {
        let values: Vec<i32> = (0..len).map(|i| i * 3 - 7).collect();
        let array = MultiArray::<i32>::from(values.clone());
        let mapped = array.map(|v| Point {
            x: f64::from(v),
            y: f64::from(v) * 2.0,
        });
        let expected: Vec<Point> = values
            .iter()
            .map(|&v| Point {
                x: f64::from(v),
                y: f64::from(v) * 2.0,
            })
            .collect();
        assert_eq!(mapped.to_vec(), expected);
    }
}

#[test]
fn try_map_propagates_error() {
    let array = MultiArray::<u8>::from([1, 2, 0, 4]);
    let result = array.try_map(|v| 8_u8.checked_div(v).ok_or(v));
    assert_eq!(result, Err(0));

    let ok = MultiArray::<u8>::from([1, 2, 4]).try_map(|v| 8_u8.checked_div(v).ok_or(v));
    assert_eq!(ok.map(|a| a.to_vec()), Ok(vec![8, 4, 2]));
}

// === Ownership ===

#[test]
fn overwriting_constant_slots_keeps_live_count_bounded() {
    let live = Rc::new(Cell::new(0));
    let mut array = MultiArray::from_fn(4, |_| Tracked::new(&live));
    assert_eq!(live.get(), 4);

    for round in 0..10 {
        array.set(round % 4, Tracked::new(&live));
        assert_eq!(live.get(), 4);
    }
    drop(array);
    assert_eq!(live.get(), 0);
}

#[test]
fn reading_a_constant_clones_it() {
    let live = Rc::new(Cell::new(0));
    let array = MultiArray::from_fn(2, |_| Tracked::new(&live));
    let first = array.get(0);
    assert_eq!(live.get(), 3);
    drop(first);
    drop(array);
    assert_eq!(live.get(), 0);
}

#[test]
fn owning_iteration_moves_constants_out() {
    let live = Rc::new(Cell::new(0));
    let array = MultiArray::from_fn(4, |_| Tracked::new(&live));

    let mut values = array.into_iter();
    let first = values.next();
    let last = values.next_back();
    assert!(first.is_some() && last.is_some());
    assert_eq!(values.len(), 2);
    assert_eq!(live.get(), 4);

    drop(values);
    assert_eq!(live.get(), 2);
    drop((first, last));
    assert_eq!(live.get(), 0);

    let array = MultiArray::from_fn(3, |_| Tracked::new(&live));
    let vec = Vec::from(array);
    assert_eq!(vec.len(), 3);
    assert_eq!(live.get(), 3);
}

#[test]
fn panicking_generator_leaks_nothing() {
    let live = Rc::new(Cell::new(0));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        MultiArray::from_fn(5, |i| {
            assert!(i < 3, "generator failed");
            Tracked::new(&live)
        })
    }));
    assert!(result.is_err());
    assert_eq!(live.get(), 0);
}

#[test]
fn failing_generator_leaks_nothing() {
    let live = Rc::new(Cell::new(0));
    let result = MultiArray::try_from_fn(5, |i| {
        if i == 2 {
            Err(i)
        } else {
            Ok(Tracked::new(&live))
        }
    });
    assert_eq!(result.map(|a| a.len()), Err(2));
    assert_eq!(live.get(), 0);
}

#[test]
fn clone_is_independent() {
    let original = MultiArray::<i64>::from([1, 2, 3]);
    let mut copy = original.clone();
    copy.set(0, 100);
    assert_eq!(original.to_vec(), [1, 2, 3]);
    assert_eq!(copy.to_vec(), [100, 2, 3]);
    assert_ne!(original, copy);
}

#[test]
fn clone_deep_copies_constants() {
    let live = Rc::new(Cell::new(0));
    let original = MultiArray::from_fn(3, |_| Tracked::new(&live));
    let copy = original.clone();
    assert_eq!(live.get(), 6);
    drop(original);
    assert_eq!(live.get(), 3);
    drop(copy);
    assert_eq!(live.get(), 0);
}

// === Formatting ===

#[test]
fn debug_shows_count_encoding_and_values() {
    let array = MultiArray::<u8>::from([7, 9]);
    let debug = format!("{array:?}");
    assert!(debug.starts_with("MultiArray { count: 2, encoding: \"u8\""), "{debug}");
    assert!(debug.ends_with("values: [7, 9] }"), "{debug}");
}
