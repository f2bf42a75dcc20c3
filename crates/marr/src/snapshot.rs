//! Binary snapshots: a header, a type descriptor and the raw storage bytes.
//!
//! A snapshot is a memory image, not a portable encoding. Integers are
//! written in native byte order and the payload is the container's
//! allocation copied verbatim, so snapshots only round-trip between builds
//! of this crate on machines with the same endianness and type layout. Use
//! the structured (serde) encoding for anything longer-lived.
//!
//! # Format
//!
//! ```text
//!   bytes   field
//!   0..4    magic 0x4D415252 ("MARR")
//!   4       format version (1)
//!   5       flags (0)
//!   6..8    reserved (0)
//!   8..16   element count, u64
//!   16..18  type descriptor length t, u16
//!   18..    type descriptor (t bytes, see marr_layout::TypeDesc)
//!   18+t..  payload: the storage allocation for `count` elements
//! ```
//!
//! Only representations implementing [`BinaryArrayData`] can be
//! snapshotted, which rules out opaque `Constant` fields at compile time.

use marr_generic::Generic;
use marr_layout::{ArrayData, BinaryArrayData, RawStorage, SnapshotError, TypeDesc};

use crate::MultiArray;

/// Leading magic number, "MARR" in ASCII.
pub const MAGIC: u32 = 0x4D41_5252;

/// The only format version this crate reads and writes.
pub const VERSION: u8 = 1;

/// Size of the fixed header preceding the type descriptor.
pub const HEADER_LEN: usize = 18;

/// The fixed header fields.
struct RawHeader {
    count: u64,
    type_len: usize,
}

fn read_array<const N: usize>(bytes: &[u8], index: usize) -> Result<[u8; N], SnapshotError> {
    bytes
        .get(index..index + N)
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(SnapshotError::Truncated {
            index,
            required: N,
            available: bytes.len().saturating_sub(index),
        })
}

/// Validate magic and version and read the remaining header fields.
fn parse_raw_header(bytes: &[u8]) -> Result<RawHeader, SnapshotError> {
    let magic = u32::from_ne_bytes(read_array(bytes, 0)?);
    if magic == MAGIC.swap_bytes() {
        tracing::debug!("rejecting snapshot: byte-swapped magic");
        return Err(SnapshotError::EndianMismatch);
    }
    if magic != MAGIC {
        tracing::debug!(magic, "rejecting snapshot: bad magic");
        return Err(SnapshotError::BadMagic { found: magic });
    }

    let [version] = read_array(bytes, 4)?;
    if version != VERSION {
        tracing::debug!(version, "rejecting snapshot: unsupported version");
        return Err(SnapshotError::UnsupportedVersion(version));
    }

    // flags and reserved bytes (5..8) carry no meaning in version 1
    let count = u64::from_ne_bytes(read_array(bytes, 8)?);
    let type_len = usize::from(u16::from_ne_bytes(read_array(bytes, 16)?));
    Ok(RawHeader { count, type_len })
}

/// Header and type descriptor of a snapshot, read without knowing the
/// element type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Format version.
    pub version: u8,
    /// Declared element count.
    pub count: u64,
    /// The stored representation.
    pub type_desc: TypeDesc,
    /// Bytes following the type descriptor.
    pub payload_len: usize,
}

impl SnapshotHeader {
    /// Parse the header and type descriptor of `bytes`.
    ///
    /// The payload is not validated, since its expected size depends on the
    /// platform layout of the described type.
    pub fn parse(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let header = parse_raw_header(bytes)?;
        let mut offset = HEADER_LEN;
        let type_desc = TypeDesc::decode(bytes, &mut offset)?;
        let consumed = offset - HEADER_LEN;
        if consumed != header.type_len {
            return Err(SnapshotError::MalformedType {
                declared: header.type_len,
                consumed,
            });
        }
        Ok(Self {
            version: VERSION,
            count: header.count,
            type_desc,
            payload_len: bytes.len() - offset,
        })
    }
}

impl<E: Generic> MultiArray<E>
where
    E::Rep: BinaryArrayData,
{
    /// Encode the array as a binary snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the type descriptor is longer than `u16::MAX` bytes.
    #[tracing::instrument(level = "debug", skip_all, fields(count = self.len()))]
    pub fn encode_snapshot(&self) -> Vec<u8> {
        let type_len = <E::Rep as BinaryArrayData>::encoded_type_len();
        let declared = u16::try_from(type_len).unwrap_or_else(|_| {
            panic!("type descriptor of {type_len} bytes does not fit the snapshot header")
        });
        let payload = self.storage().as_bytes();

        let mut out = Vec::with_capacity(HEADER_LEN + type_len + payload.len());
        out.extend_from_slice(&MAGIC.to_ne_bytes());
        out.push(VERSION);
        out.push(0);
        out.extend_from_slice(&0_u16.to_ne_bytes());
        out.extend_from_slice(&(self.len() as u64).to_ne_bytes());
        out.extend_from_slice(&declared.to_ne_bytes());
        <E::Rep as BinaryArrayData>::append_type(&mut out);
        out.extend_from_slice(payload);

        tracing::debug!(bytes = out.len(), "encoded snapshot");
        out
    }

    /// Decode a snapshot produced by [`encode_snapshot`](Self::encode_snapshot).
    ///
    /// The header, sizes and type descriptor are validated in full before
    /// anything is allocated; the payload is then copied in one block.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
    pub fn decode_snapshot(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let type_len = <E::Rep as BinaryArrayData>::encoded_type_len();
        let prefix = HEADER_LEN + type_len;
        if bytes.len() < prefix {
            tracing::debug!(required = prefix, "rejecting snapshot: shorter than header");
            return Err(SnapshotError::Truncated {
                index: 0,
                required: prefix,
                available: bytes.len(),
            });
        }

        let header = parse_raw_header(bytes)?;
        let count = usize::try_from(header.count)
            .map_err(|_| SnapshotError::Overflow(header.count))?;

        let expected = <E::Rep as ArrayData>::raw_size(count, 0)
            .and_then(|payload| payload.checked_add(prefix))
            .ok_or(SnapshotError::Overflow(header.count))?;
        if bytes.len() < expected {
            tracing::debug!(expected, "rejecting snapshot: payload truncated");
            return Err(SnapshotError::Truncated {
                index: 0,
                required: expected,
                available: bytes.len(),
            });
        }
        if bytes.len() > expected {
            tracing::debug!(expected, "rejecting snapshot: trailing bytes");
            return Err(SnapshotError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let mut offset = HEADER_LEN;
        <E::Rep as BinaryArrayData>::verify_type(bytes, &mut offset)?;
        let consumed = offset - HEADER_LEN;
        if consumed != header.type_len {
            return Err(SnapshotError::MalformedType {
                declared: header.type_len,
                consumed,
            });
        }

        let storage = RawStorage::from_bytes(count, &bytes[prefix..]);
        tracing::debug!(count, "decoded snapshot");
        Ok(Self::from_storage(storage))
    }
}

#[cfg(test)]
mod tests;
