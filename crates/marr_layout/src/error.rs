//! Errors from decoding untrusted snapshot bytes.

use crate::TypeTag;

/// Why a byte snapshot was rejected.
///
/// Every check that can fail on malformed input has its own variant carrying
/// the expected and actual values, so a format mismatch can be diagnosed
/// without looking at raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The leading magic number is not ours.
    #[error("incorrect magic value {found:#010x}; this is not MultiArray snapshot data")]
    BadMagic { found: u32 },

    /// The magic number is ours, byte-swapped.
    #[error("snapshot was produced on a machine of different endianness, which is not supported")]
    EndianMismatch,

    /// The stored element count does not fit this platform's address range.
    #[error("encoded count {0} overflows the addressable range")]
    Overflow(u64),

    /// The format version is not one we can read.
    #[error("unknown or unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    /// The input ends before a required section.
    #[error(
        "ran out of data at byte {index}: required {required} bytes but only {available} available"
    )]
    Truncated {
        index: usize,
        required: usize,
        available: usize,
    },

    /// The input is longer than header, descriptor and payload together.
    #[error("size mismatch: expected {expected} bytes but found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The type descriptor diverges from the expected representation.
    #[error("type tag mismatch at byte {offset}: expected {expected} but found {actual}")]
    TypeMismatch {
        offset: usize,
        expected: TypeTag,
        actual: TypeTag,
    },

    /// The descriptor length in the header disagrees with the descriptor.
    #[error("incomplete type encoding: header declares {declared} bytes but {consumed} were consumed")]
    MalformedType { declared: usize, consumed: usize },

    /// A descriptor byte that does not decode to any type.
    #[error("invalid type tag {tag} at byte {offset}")]
    InvalidTag { offset: usize, tag: TypeTag },

    /// A descriptor nested deeper than any storable representation.
    #[error("type descriptor at byte {offset} nests deeper than {limit} levels")]
    TooDeep { offset: usize, limit: usize },
}
