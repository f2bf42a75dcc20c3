//! Struct-of-arrays containers over a generic representation algebra.
//!
//! A [`MultiArray<E>`] stores `len` values of `E` column by column: every
//! leaf field of `E`'s representation gets its own contiguous, aligned
//! region inside a single allocation. Reading index `i` gathers the `i`th
//! slot of every column and converts the result back into an `E`.
//!
//! ```
//! use marr::{Generic, MultiArray};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Generic)]
//! struct Particle {
//!     position: [f32; 3],
//!     mass: f32,
//! }
//!
//! let particles: MultiArray<Particle> = (0..4)
//!     .map(|i| Particle { position: [i as f32, 0.0, 0.0], mass: 1.0 })
//!     .collect();
//! let heavier = particles.map(|p| Particle { mass: p.mass * 2.0, ..p });
//! assert_eq!(heavier.get(3).map(|p| p.mass), Some(2.0));
//! ```
//!
//! # Crates
//!
//! - [`marr_generic`]: the representation vocabulary and [`Generic`] trait
//! - [`marr_layout`]: the layout engine and snapshot type descriptors
//! - `marr_macros`: `#[derive(Generic)]`
//!
//! # Encodings
//!
//! - [`MultiArray::encode_snapshot`]: a native-endian memory image, fast and
//!   not portable
//! - `serde` (feature `serde`, on by default): a structured
//!   `{version, count, values}` encoding for any serde format
//!
//! # Logging
//!
//! Storage and snapshot code emits [`tracing`] events. Binaries can call
//! [`init_tracing`] to print them, filtered by `MARR_LOG` or `RUST_LOG`.

mod array;
mod builder;
mod iter;
pub mod snapshot;
#[cfg(feature = "serde")]
mod structured;

use std::sync::Once;

pub use array::MultiArray;
pub use builder::MultiArrayBuilder;
pub use iter::{IntoIter, Iter};
pub use marr_generic::{Constant, Generic, Product, Scalar, Sum, Unit};
pub use marr_layout::{
    ArrayData, BinaryArrayData, RawStorage, SnapshotError, TypeDesc, TypeHead, TypeTag,
};
pub use marr_macros::Generic;
pub use snapshot::SnapshotHeader;

/// Environment variable holding the log filter, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "MARR_LOG";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debugging.
///
/// Reads the filter from `MARR_LOG`, falling back to `RUST_LOG`, using
/// [`EnvFilter`](tracing_subscriber::EnvFilter) syntax
/// (e.g. `MARR_LOG=marr=debug`). Does nothing if neither is set. Safe to
/// call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = std::env::var(LOG_ENV)
            .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
            .ok();
        if let Some(directives) = filter {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::new(directives))
                .init();
        }
    });
}
