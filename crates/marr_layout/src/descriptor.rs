//! Type descriptors for byte snapshots.
//!
//! A descriptor is the pre-order encoding of a representation tree, one tag
//! byte per node. The high nibble holds the node kind, the low nibble a
//! parameter:
//!
//! ```text
//!  kind      nibble  parameter
//!  Unit      0x0     0
//!  Int       0x1     log2(bits)        8..=128
//!  UInt      0x2     log2(bits)        8..=128
//!  Float     0x3     log2(bits)        16..=64
//!  Vector    0x4     log2(lanes), 3→0  followed by the element tag
//!  Product   0x5     0                 followed by left, then right
//! ```
//!
//! Only [`BinaryArrayData`] representations have descriptors: their byte
//! image is fully determined by the type and contains no pointers.
//! [`Constant`](marr_generic::Constant) leaves are excluded.

use std::fmt;
use std::mem::size_of;

use half::f16;
use marr_generic::{Product, Scalar, Unit};

use crate::{ArrayData, SnapshotError};

/// Deepest descriptor nesting accepted when parsing untrusted bytes.
pub const MAX_TYPE_DEPTH: usize = 128;

/// Node kind, stored in the high nibble of a tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeKind {
    Unit = 0,
    Int = 1,
    UInt = 2,
    Float = 3,
    Vector = 4,
    Product = 5,
}

/// The non-recursive head of a descriptor node: exactly one tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeHead {
    Unit,
    Product,
    Int { bits: u8 },
    UInt { bits: u8 },
    Float { bits: u8 },
    Vector { lanes: u8 },
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "trailing_zeros of a u8 is at most 8"
)]
const fn log2_nibble(value: u8) -> u8 {
    debug_assert!(value.is_power_of_two(), "must be a power of two");
    value.trailing_zeros() as u8
}

impl TypeHead {
    /// The node kind.
    pub const fn kind(self) -> TypeKind {
        match self {
            TypeHead::Unit => TypeKind::Unit,
            TypeHead::Product => TypeKind::Product,
            TypeHead::Int { .. } => TypeKind::Int,
            TypeHead::UInt { .. } => TypeKind::UInt,
            TypeHead::Float { .. } => TypeKind::Float,
            TypeHead::Vector { .. } => TypeKind::Vector,
        }
    }

    const fn parameter(self) -> u8 {
        match self {
            TypeHead::Unit | TypeHead::Product | TypeHead::Vector { lanes: 3 } => 0,
            TypeHead::Int { bits } | TypeHead::UInt { bits } | TypeHead::Float { bits } => {
                log2_nibble(bits)
            }
            TypeHead::Vector { lanes } => log2_nibble(lanes),
        }
    }

    /// Encode as a tag byte.
    pub const fn to_byte(self) -> u8 {
        ((self.kind() as u8) << 4) | self.parameter()
    }

    /// Decode a tag byte, rejecting kinds and parameters no storable type
    /// produces.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let parameter = byte & 0x0F;
        match (byte >> 4, parameter) {
            (0, 0) => Some(TypeHead::Unit),
            (5, 0) => Some(TypeHead::Product),
            (1, 3..=7) => Some(TypeHead::Int {
                bits: 1 << parameter,
            }),
            (2, 3..=7) => Some(TypeHead::UInt {
                bits: 1 << parameter,
            }),
            (3, 4..=6) => Some(TypeHead::Float {
                bits: 1 << parameter,
            }),
            (4, 0) => Some(TypeHead::Vector { lanes: 3 }),
            (4, 1..=6) => Some(TypeHead::Vector {
                lanes: 1 << parameter,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for TypeHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHead::Unit => f.write_str("Unit"),
            TypeHead::Product => f.write_str("Product<...>"),
            TypeHead::Int { bits } => write!(f, "Int{bits}"),
            TypeHead::UInt { bits } => write!(f, "UInt{bits}"),
            TypeHead::Float { bits } => write!(f, "Float{bits}"),
            TypeHead::Vector { lanes } => write!(f, "SIMD{lanes}<...>"),
        }
    }
}

/// A raw tag byte as found in a descriptor, valid or not.
///
/// Displays as hex plus the decoded head, e.g. `0x15 (Int32)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(pub u8);

impl TypeTag {
    /// Decode the tag, if valid.
    pub fn head(self) -> Option<TypeHead> {
        TypeHead::from_byte(self.0)
    }
}

impl From<TypeHead> for TypeTag {
    fn from(head: TypeHead) -> Self {
        TypeTag(head.to_byte())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.head() {
            Some(head) => write!(f, "{:#04x} ({head})", self.0),
            None => write!(f, "{:#04x} (invalid)", self.0),
        }
    }
}

/// A complete descriptor tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Unit,
    Int { bits: u8 },
    UInt { bits: u8 },
    Float { bits: u8 },
    Vector { lanes: u8, element: Box<TypeDesc> },
    Product(Box<TypeDesc>, Box<TypeDesc>),
}

impl TypeDesc {
    /// The root node's head.
    pub fn head(&self) -> TypeHead {
        match *self {
            TypeDesc::Unit => TypeHead::Unit,
            TypeDesc::Int { bits } => TypeHead::Int { bits },
            TypeDesc::UInt { bits } => TypeHead::UInt { bits },
            TypeDesc::Float { bits } => TypeHead::Float { bits },
            TypeDesc::Vector { lanes, .. } => TypeHead::Vector { lanes },
            TypeDesc::Product(..) => TypeHead::Product,
        }
    }

    /// Number of bytes in the encoded descriptor.
    pub fn encoded_len(&self) -> usize {
        match self {
            TypeDesc::Unit | TypeDesc::Int { .. } | TypeDesc::UInt { .. } | TypeDesc::Float { .. } => 1,
            TypeDesc::Vector { element, .. } => 1 + element.encoded_len(),
            TypeDesc::Product(lhs, rhs) => 1 + lhs.encoded_len() + rhs.encoded_len(),
        }
    }

    /// Append the encoded descriptor to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.head().to_byte());
        match self {
            TypeDesc::Vector { element, .. } => element.encode_into(out),
            TypeDesc::Product(lhs, rhs) => {
                lhs.encode_into(out);
                rhs.encode_into(out);
            }
            _ => {}
        }
    }

    /// Parse a descriptor starting at `*offset`, advancing past it.
    ///
    /// Used where no static type is known; typed decoding compares tags
    /// with [`BinaryArrayData::verify_type`] instead.
    pub fn decode(bytes: &[u8], offset: &mut usize) -> Result<Self, SnapshotError> {
        Self::decode_at(bytes, offset, 0)
    }

    fn decode_at(bytes: &[u8], offset: &mut usize, depth: usize) -> Result<Self, SnapshotError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(SnapshotError::TooDeep {
                offset: *offset,
                limit: MAX_TYPE_DEPTH,
            });
        }
        let head = read_head(bytes, offset)?;
        Ok(match head {
            TypeHead::Unit => TypeDesc::Unit,
            TypeHead::Int { bits } => TypeDesc::Int { bits },
            TypeHead::UInt { bits } => TypeDesc::UInt { bits },
            TypeHead::Float { bits } => TypeDesc::Float { bits },
            TypeHead::Vector { lanes } => {
                let element_at = *offset;
                let element = Self::decode_at(bytes, offset, depth + 1)?;
                if !element.is_scalar() {
                    return Err(SnapshotError::InvalidTag {
                        offset: element_at,
                        tag: element.head().into(),
                    });
                }
                TypeDesc::Vector {
                    lanes,
                    element: Box::new(element),
                }
            }
            TypeHead::Product => {
                let lhs = Self::decode_at(bytes, offset, depth + 1)?;
                let rhs = Self::decode_at(bytes, offset, depth + 1)?;
                TypeDesc::Product(Box::new(lhs), Box::new(rhs))
            }
        })
    }

    fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeDesc::Int { .. } | TypeDesc::UInt { .. } | TypeDesc::Float { .. }
        )
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Unit => f.write_str("Unit"),
            TypeDesc::Int { bits } => write!(f, "Int{bits}"),
            TypeDesc::UInt { bits } => write!(f, "UInt{bits}"),
            TypeDesc::Float { bits } => write!(f, "Float{bits}"),
            TypeDesc::Vector { lanes, element } => write!(f, "SIMD{lanes}<{element}>"),
            TypeDesc::Product(lhs, rhs) => write!(f, "Product<{lhs}, {rhs}>"),
        }
    }
}

/// Read one tag byte and decode it.
fn read_head(bytes: &[u8], offset: &mut usize) -> Result<TypeHead, SnapshotError> {
    let byte = take_byte(bytes, offset)?;
    TypeHead::from_byte(byte).ok_or(SnapshotError::InvalidTag {
        offset: *offset - 1,
        tag: TypeTag(byte),
    })
}

fn take_byte(bytes: &[u8], offset: &mut usize) -> Result<u8, SnapshotError> {
    let Some(&byte) = bytes.get(*offset) else {
        return Err(SnapshotError::Truncated {
            index: *offset,
            required: 1,
            available: bytes.len().saturating_sub(*offset),
        });
    };
    *offset += 1;
    Ok(byte)
}

/// Consume one tag byte, which must equal `expected`.
fn verify_head(expected: TypeHead, bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError> {
    let at = *offset;
    let found = take_byte(bytes, offset)?;
    if found == expected.to_byte() {
        Ok(())
    } else {
        Err(SnapshotError::TypeMismatch {
            offset: at,
            expected: expected.into(),
            actual: TypeTag(found),
        })
    }
}

pub(crate) mod sealed {
    pub trait Binary {}
}

/// Representations whose storage can be copied as raw bytes.
///
/// Sealed. Implemented for integer and float leaves, fixed-width vectors of
/// them, [`Unit`] and [`Product`]s of binary representations. Every bit
/// pattern of these types is a valid value, and none of them own heap data.
pub trait BinaryArrayData: ArrayData + sealed::Binary {
    /// Tag of the root node.
    const HEAD: TypeHead;

    /// The full descriptor tree.
    fn type_desc() -> TypeDesc;

    /// Length of the encoded descriptor.
    fn encoded_type_len() -> usize;

    /// Append the encoded descriptor to `out`.
    fn append_type(out: &mut Vec<u8>);

    /// Match and consume this type's descriptor from `bytes[*offset..]`.
    ///
    /// Fails on the first tag that differs from the expected one.
    fn verify_type(bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError>;
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "scalar widths are at most 128 bits"
)]
const fn bits_of<T>() -> u8 {
    (size_of::<T>() * 8) as u8
}

macro_rules! impl_binary_scalar {
    ($($variant:ident: $($ty:ty),+;)*) => {
        $($(
            impl sealed::Binary for $ty {}

            impl BinaryArrayData for $ty {
                const HEAD: TypeHead = TypeHead::$variant { bits: bits_of::<$ty>() };

                fn type_desc() -> TypeDesc {
                    TypeDesc::$variant { bits: bits_of::<$ty>() }
                }

                fn encoded_type_len() -> usize {
                    1
                }

                fn append_type(out: &mut Vec<u8>) {
                    out.push(Self::HEAD.to_byte());
                }

                fn verify_type(bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError> {
                    verify_head(Self::HEAD, bytes, offset)
                }
            }
        )+)*
    };
}

impl_binary_scalar! {
    Int: i8, i16, i32, i64, i128, isize;
    UInt: u8, u16, u32, u64, u128, usize;
    Float: f16, f32, f64;
}

macro_rules! impl_binary_vector {
    ($($lanes:literal),* $(,)?) => {
        $(
            impl<S: Scalar + BinaryArrayData> sealed::Binary for [S; $lanes] {}

            impl<S: Scalar + BinaryArrayData> BinaryArrayData for [S; $lanes] {
                const HEAD: TypeHead = TypeHead::Vector { lanes: $lanes };

                fn type_desc() -> TypeDesc {
                    TypeDesc::Vector {
                        lanes: $lanes,
                        element: Box::new(S::type_desc()),
                    }
                }

                fn encoded_type_len() -> usize {
                    1 + S::encoded_type_len()
                }

                fn append_type(out: &mut Vec<u8>) {
                    out.push(Self::HEAD.to_byte());
                    S::append_type(out);
                }

                fn verify_type(bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError> {
                    verify_head(Self::HEAD, bytes, offset)?;
                    S::verify_type(bytes, offset)
                }
            }
        )*
    };
}

impl_binary_vector!(2, 3, 4, 8, 16, 32, 64);

impl sealed::Binary for Unit {}

impl BinaryArrayData for Unit {
    const HEAD: TypeHead = TypeHead::Unit;

    fn type_desc() -> TypeDesc {
        TypeDesc::Unit
    }

    fn encoded_type_len() -> usize {
        1
    }

    fn append_type(out: &mut Vec<u8>) {
        out.push(Self::HEAD.to_byte());
    }

    fn verify_type(bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError> {
        verify_head(Self::HEAD, bytes, offset)
    }
}

impl<A: BinaryArrayData, B: BinaryArrayData> sealed::Binary for Product<A, B> {}

impl<A: BinaryArrayData, B: BinaryArrayData> BinaryArrayData for Product<A, B> {
    const HEAD: TypeHead = TypeHead::Product;

    fn type_desc() -> TypeDesc {
        TypeDesc::Product(Box::new(A::type_desc()), Box::new(B::type_desc()))
    }

    fn encoded_type_len() -> usize {
        1 + A::encoded_type_len() + B::encoded_type_len()
    }

    fn append_type(out: &mut Vec<u8>) {
        out.push(Self::HEAD.to_byte());
        A::append_type(out);
        B::append_type(out);
    }

    fn verify_type(bytes: &[u8], offset: &mut usize) -> Result<(), SnapshotError> {
        verify_head(Self::HEAD, bytes, offset)?;
        A::verify_type(bytes, offset)?;
        B::verify_type(bytes, offset)
    }
}
