use marr_generic::Product;
use marr_layout::TypeTag;
use pretty_assertions::assert_eq;

use super::*;

fn int_snapshot() -> Vec<u8> {
    MultiArray::<i32>::from([10, 20, 30]).encode_snapshot()
}

// === Encoding ===

#[test]
fn header_layout() {
    let bytes = int_snapshot();
    assert_eq!(&bytes[0..4], &MAGIC.to_ne_bytes());
    assert_eq!(bytes[4], VERSION);
    assert_eq!(&bytes[5..8], &[0, 0, 0]);
    assert_eq!(&bytes[8..16], &3_u64.to_ne_bytes());
    assert_eq!(&bytes[16..18], &1_u16.to_ne_bytes());
    assert_eq!(bytes[18], 0x15);
    assert_eq!(bytes.len(), HEADER_LEN + 1 + 12);
}

#[test]
fn payload_is_the_storage_image() {
    let array = MultiArray::<Product<u8, u32>>::from([Product(1, 2), Product(3, 4)]);
    let bytes = array.encode_snapshot();
    let prefix = HEADER_LEN + 3;
    assert_eq!(&bytes[prefix..], array.storage().as_bytes());
}

#[test]
fn empty_snapshot_is_header_and_descriptor() {
    assert_eq!(MultiArray::<f32>::new().encode_snapshot().len(), 19);
    assert_eq!(MultiArray::<Product<f32, i8>>::new().encode_snapshot().len(), 21);
}

// === Header parsing ===

#[test]
fn header_parses_without_static_type() {
    let array = MultiArray::<Product<i64, [f32; 3]>>::from_fn(4, |i| Product(i as i64, [0.0; 3]));
    let header = SnapshotHeader::parse(&array.encode_snapshot());
    assert_eq!(
        header,
        Ok(SnapshotHeader {
            version: 1,
            count: 4,
            type_desc: <Product<i64, [f32; 3]> as BinaryArrayData>::type_desc(),
            payload_len: array.storage().byte_len(),
        })
    );
}

#[test]
fn header_rejects_short_input() {
    assert_eq!(
        SnapshotHeader::parse(&MAGIC.to_ne_bytes()),
        Err(SnapshotError::Truncated {
            index: 4,
            required: 1,
            available: 0,
        })
    );
}

#[test]
fn header_checks_declared_descriptor_length() {
    let mut bytes = int_snapshot();
    bytes[16..18].copy_from_slice(&2_u16.to_ne_bytes());
    assert_eq!(
        SnapshotHeader::parse(&bytes),
        Err(SnapshotError::MalformedType {
            declared: 2,
            consumed: 1,
        })
    );
}

#[test]
fn header_rejects_invalid_tags() {
    let mut bytes = int_snapshot();
    bytes[18] = 0xEE;
    assert_eq!(
        SnapshotHeader::parse(&bytes),
        Err(SnapshotError::InvalidTag {
            offset: 18,
            tag: TypeTag(0xEE),
        })
    );
}

#[test]
fn byte_swapped_magic_is_an_endian_mismatch() {
    let mut bytes = int_snapshot();
    bytes[0..4].copy_from_slice(&MAGIC.swap_bytes().to_ne_bytes());
    assert_eq!(
        MultiArray::<i32>::decode_snapshot(&bytes),
        Err(SnapshotError::EndianMismatch)
    );
    assert_eq!(
        SnapshotHeader::parse(&bytes),
        Err(SnapshotError::EndianMismatch)
    );
}

// === Size checks ===

#[test]
fn trailing_bytes_are_a_size_mismatch() {
    let mut bytes = int_snapshot();
    bytes.push(0);
    assert_eq!(
        MultiArray::<i32>::decode_snapshot(&bytes),
        Err(SnapshotError::SizeMismatch {
            expected: 31,
            actual: 32,
        })
    );
}

#[test]
fn huge_count_is_rejected_before_allocating() {
    let mut bytes = int_snapshot();
    bytes[8..16].copy_from_slice(&u64::MAX.to_ne_bytes());
    let error = MultiArray::<i32>::decode_snapshot(&bytes);
    assert!(
        matches!(
            error,
            Err(SnapshotError::Overflow(u64::MAX) | SnapshotError::Truncated { .. })
        ),
        "{error:?}"
    );
}

#[test]
fn malformed_descriptor_length_is_reported() {
    let mut bytes = int_snapshot();
    bytes[16..18].copy_from_slice(&0_u16.to_ne_bytes());
    assert_eq!(
        MultiArray::<i32>::decode_snapshot(&bytes),
        Err(SnapshotError::MalformedType {
            declared: 0,
            consumed: 1,
        })
    );
}

#[test]
fn unit_columns_snapshot_without_payload() {
    let array = MultiArray::<Product<marr_generic::Unit, u16>>::from_fn(3, |i| {
        Product(marr_generic::Unit, i as u16)
    });
    let bytes = array.encode_snapshot();
    assert_eq!(bytes.len(), HEADER_LEN + 3 + 6);
    let decoded = MultiArray::<Product<marr_generic::Unit, u16>>::decode_snapshot(&bytes);
    assert_eq!(decoded, Ok(array));
}
