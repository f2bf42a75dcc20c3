use std::rc::Rc;

use marr_generic::Constant;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn tracks_progress() {
    let mut builder = MultiArrayBuilder::<u32>::with_capacity(3);
    assert!(builder.is_empty());
    assert_eq!(builder.remaining(), 3);

    builder.push(1);
    builder.push(2);
    assert_eq!(builder.len(), 2);
    assert_eq!(builder.capacity(), 3);
    assert!(!builder.is_full());

    builder.push(3);
    assert!(builder.is_full());
    assert_eq!(builder.finish().to_vec(), [1, 2, 3]);
}

#[test]
fn zero_capacity_finishes_immediately() {
    let builder = MultiArrayBuilder::<f32>::with_capacity(0);
    assert!(builder.is_full());
    assert!(builder.finish().is_empty());
}

#[test]
#[should_panic(expected = "builder finished with 1 of 2 elements written")]
fn finishing_early_panics() {
    let mut builder = MultiArrayBuilder::<u8>::with_capacity(2);
    builder.push(1);
    let _ = builder.finish();
}

#[test]
#[should_panic(expected = "push past the end")]
fn pushing_past_capacity_panics() {
    let mut builder = MultiArrayBuilder::<u8>::with_capacity(1);
    builder.push(1);
    builder.push(2);
}

#[test]
fn abandoned_builder_drops_written_values() {
    let token = Rc::new(());
    let mut builder = MultiArrayBuilder::<Constant<Rc<()>>>::with_capacity(4);
    builder.push(Constant(Rc::clone(&token)));
    builder.push(Constant(Rc::clone(&token)));
    assert_eq!(Rc::strong_count(&token), 3);
    drop(builder);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn into_vec_returns_written_prefix() {
    let mut builder = MultiArrayBuilder::<i8>::with_capacity(5);
    builder.push(-1);
    builder.push(-2);
    assert_eq!(builder.into_vec(), [-1, -2]);
}

#[test]
fn debug_shows_progress() {
    let mut builder = MultiArrayBuilder::<u8>::with_capacity(2);
    builder.push(0);
    assert_eq!(
        format!("{builder:?}"),
        "MultiArrayBuilder { len: 1, capacity: 2 }"
    );
}
