use std::rc::Rc;

use marr_generic::{Constant, Product, Unit};
use pretty_assertions::assert_eq;

use super::*;

type Pair = Product<u8, u64>;

fn pair(a: u8, b: u64) -> Pair {
    Product(a, b)
}

// === Construction ===

#[test]
fn zero_capacity_allocates_nothing() {
    let storage = RawStorage::<Pair>::with_capacity(0);
    assert_eq!(storage.capacity(), 0);
    assert!(storage.is_empty());
    assert!(storage.is_full());
    assert_eq!(storage.byte_len(), 0);
    assert_eq!(storage.as_bytes(), &[] as &[u8]);
}

#[test]
fn byte_len_matches_raw_size() {
    for capacity in [1, 3, 16, 257] {
        let storage = RawStorage::<Product<i32, [f32; 3]>>::with_capacity(capacity);
        assert_eq!(
            Some(storage.byte_len()),
            <Product<i32, [f32; 3]> as ArrayData>::raw_size(capacity, 0)
        );
    }
}

#[test]
fn allocation_has_minimum_alignment() {
    let storage = RawStorage::<u8>::with_capacity(3);
    assert_eq!(storage.align(), MIN_ALIGN);
    assert_eq!(storage.base_ptr() as usize % MIN_ALIGN, 0);
}

#[test]
fn zero_sized_constants_use_aligned_dangling_base() {
    let mut storage = RawStorage::<Product<Constant<()>, Unit>>::with_capacity(4);
    assert_eq!(storage.byte_len(), 0);
    assert!(!storage.base_ptr().is_null());
    assert_eq!(storage.base_ptr() as usize % MIN_ALIGN, 0);

    for _ in 0..4 {
        storage.push(Product(Constant(()), Unit));
    }
    storage.write(2, Product(Constant(()), Unit));
    assert_eq!(storage.len(), 4);
    assert_eq!(storage.read(3), Product(Constant(()), Unit));
}

#[test]
#[should_panic(expected = "capacity overflow")]
fn oversized_capacity_panics() {
    let _ = RawStorage::<u64>::with_capacity(usize::MAX);
}

// === Regions ===

#[test]
fn regions_are_aligned_and_disjoint() {
    let capacity = 5;
    let storage = RawStorage::<Product<u8, Product<u64, [f32; 3]>>>::with_capacity(capacity);
    let (bytes, (words, vectors)) = storage.buffer();
    let base = storage.base_ptr() as usize;
    let bytes = bytes as usize;
    let words = words as usize;
    let vectors = vectors as usize;

    assert_eq!(bytes, base);
    assert_eq!(words % 8, 0);
    assert_eq!(vectors % 4, 0);
    assert!(words >= bytes + capacity);
    assert!(vectors >= words + capacity * 8);
    assert!(vectors + capacity * 12 <= base + storage.byte_len());
}

#[test]
fn unit_fields_have_no_region() {
    let storage = RawStorage::<Product<Unit, u32>>::with_capacity(4);
    assert_eq!(storage.byte_len(), 16);
    let ((), words) = storage.buffer();
    assert_eq!(words as usize, storage.base_ptr() as usize);
}

// === Slots ===

#[test]
fn push_then_read_and_write() {
    let mut storage = RawStorage::<Pair>::with_capacity(3);
    storage.push(pair(1, 10));
    storage.push(pair(2, 20));
    assert_eq!(storage.len(), 2);
    assert!(!storage.is_full());

    storage.write(0, pair(7, 70));
    assert_eq!(storage.read(0), pair(7, 70));
    assert_eq!(storage.read(1), pair(2, 20));

    storage.push(pair(3, 30));
    assert!(storage.is_full());
    assert_eq!(storage.read(2), pair(3, 30));
}

#[test]
#[should_panic(expected = "index out of range: the len is 2 but the index is 2")]
fn read_past_len_panics() {
    let mut storage = RawStorage::<Pair>::with_capacity(4);
    storage.push(pair(1, 1));
    storage.push(pair(2, 2));
    let _ = storage.read(2);
}

#[test]
#[should_panic(expected = "index out of range")]
fn write_past_len_panics() {
    let mut storage = RawStorage::<Pair>::with_capacity(1);
    storage.write(0, pair(1, 1));
}

#[test]
#[should_panic(expected = "push past the end")]
fn push_past_capacity_panics() {
    let mut storage = RawStorage::<u16>::with_capacity(1);
    storage.push(1);
    storage.push(2);
}

// === Ownership ===

#[test]
fn drop_releases_owned_constants() {
    let token = Rc::new(());
    {
        let mut storage = RawStorage::<Product<Constant<Rc<()>>, i32>>::with_capacity(3);
        for index in 0..3 {
            storage.push(Product(Constant(Rc::clone(&token)), index));
        }
        assert_eq!(Rc::strong_count(&token), 4);
    }
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn partially_filled_storage_drops_only_written_slots() {
    let token = Rc::new(());
    let mut storage = RawStorage::<Constant<Rc<()>>>::with_capacity(5);
    storage.push(Constant(Rc::clone(&token)));
    storage.push(Constant(Rc::clone(&token)));
    assert_eq!(Rc::strong_count(&token), 3);
    drop(storage);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn write_drops_previous_value() {
    let old = Rc::new(());
    let new = Rc::new(());
    let mut storage = RawStorage::<Constant<Rc<()>>>::with_capacity(1);
    storage.push(Constant(Rc::clone(&old)));
    storage.write(0, Constant(Rc::clone(&new)));
    assert_eq!(Rc::strong_count(&old), 1);
    assert_eq!(Rc::strong_count(&new), 2);
}

#[test]
fn into_slots_moves_values_out() {
    let token = Rc::new(());
    let mut storage = RawStorage::<Product<Constant<Rc<()>>, i32>>::with_capacity(4);
    for index in 0..4 {
        storage.push(Product(Constant(Rc::clone(&token)), index));
    }

    let mut slots = storage.into_slots();
    assert_eq!(slots.len(), 4);
    let first = slots.next().unwrap();
    let last = slots.next_back().unwrap();
    assert_eq!((first.1, last.1), (0, 3));
    assert_eq!(slots.len(), 2);
    assert_eq!(Rc::strong_count(&token), 5);

    drop(slots);
    assert_eq!(Rc::strong_count(&token), 3);
    drop((first, last));
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn into_slots_of_partial_storage_yields_written_prefix() {
    let mut storage = RawStorage::<Pair>::with_capacity(3);
    storage.push(pair(1, 10));
    storage.push(pair(2, 20));
    let values: Vec<Pair> = storage.into_slots().rev().collect();
    assert_eq!(values, [pair(2, 20), pair(1, 10)]);
}

#[test]
fn clone_is_deep() {
    let token = Rc::new(());
    let mut original = RawStorage::<Product<Constant<Rc<()>>, i32>>::with_capacity(2);
    original.push(Product(Constant(Rc::clone(&token)), 1));
    original.push(Product(Constant(Rc::clone(&token)), 2));

    let mut copy = original.clone();
    assert_eq!(Rc::strong_count(&token), 5);
    assert_ne!(copy.base_ptr(), original.base_ptr());

    copy.write(0, Product(Constant(Rc::clone(&token)), 99));
    assert_eq!(original.read(0).1, 1);
    assert_eq!(copy.read(0).1, 99);
}

#[test]
fn storage_is_send_and_sync_for_plain_data() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RawStorage<Product<i32, f64>>>();
    assert_send_sync::<RawStorage<Constant<String>>>();
}

// === Byte images ===

#[test]
fn byte_image_is_columnar_with_zeroed_padding() {
    let mut storage = RawStorage::<Product<u8, u16>>::with_capacity(3);
    storage.push(Product(1, 0x0102));
    storage.push(Product(2, 0x0304));
    storage.push(Product(3, 0x0506));

    let mut expected = vec![1, 2, 3, 0];
    for word in [0x0102_u16, 0x0304, 0x0506] {
        expected.extend_from_slice(&word.to_ne_bytes());
    }
    assert_eq!(storage.as_bytes(), expected.as_slice());
}

#[test]
fn from_bytes_restores_values() {
    let mut storage = RawStorage::<Product<i32, [f32; 2]>>::with_capacity(2);
    storage.push(Product(-1, [0.5, 1.5]));
    storage.push(Product(7, [2.5, 3.5]));

    let restored = RawStorage::<Product<i32, [f32; 2]>>::from_bytes(2, storage.as_bytes());
    assert!(restored.is_full());
    assert_eq!(restored.read(0), Product(-1, [0.5, 1.5]));
    assert_eq!(restored.read(1), Product(7, [2.5, 3.5]));
}

#[test]
#[should_panic(expected = "byte image does not match")]
fn from_bytes_rejects_wrong_length() {
    let _ = RawStorage::<u32>::from_bytes(2, &[0; 7]);
}

mod properties {
    use marr_generic::Product;
    use proptest::prelude::*;

    use super::super::RawStorage;

    proptest! {
        #[test]
        fn pushed_values_read_back(values in proptest::collection::vec(any::<(u8, u64, i16)>(), 0..256)) {
            let mut storage = RawStorage::<Product<Product<u8, u64>, i16>>::with_capacity(values.len());
            for &(a, b, c) in &values {
                storage.push(Product(Product(a, b), c));
            }
            prop_assert!(storage.is_full());
            for (index, &(a, b, c)) in values.iter().enumerate() {
                prop_assert_eq!(storage.read(index), Product(Product(a, b), c));
            }
        }
    }
}
