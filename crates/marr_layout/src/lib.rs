//! Columnar layout engine.
//!
//! Turns a representation type (see [`marr_generic`]) and a capacity into a
//! single raw allocation partitioned into one aligned region per leaf field,
//! plus a tree of typed pointers ("buffers") into those regions.
//!
//! # Layout
//!
//! Leaves are laid out left to right in field order. Each region starts at
//! the next offset aligned for its element type:
//!
//! ```text
//! Product<u8, u64>, capacity 3
//!
//! [ u8 u8 u8 | pad ×5 | u64 u64 u64 ]
//!   0          3        8           32
//! ```
//!
//! with `padding = (-offset) mod align`. The same formula is used for sizing
//! ([`ArrayData::raw_size`]) and for handing out pointers
//! ([`ArrayData::reserve`]), so the two can never disagree.
//!
//! # Modules
//!
//! - [`ArrayData`]: closed set of storable representations
//! - [`RawStorage`]: the owned allocation with its buffer tree
//! - [`BinaryArrayData`], [`TypeDesc`]: type descriptors for byte snapshots

mod array_data;
mod descriptor;
mod error;
mod storage;

pub use array_data::{padding, ArrayData};
pub use descriptor::{BinaryArrayData, TypeDesc, TypeHead, TypeKind, TypeTag, MAX_TYPE_DEPTH};
pub use error::SnapshotError;
pub use storage::{IntoSlots, RawStorage, MIN_ALIGN};
