//! Provides the foundation for runtime support functionality for WebAssembly modules compiled
//! ahead-of-time to native code by `wasmbake`.
//!
//! The `wasmbake-rt-*` crates each provide runtime support for different aspects of WebAssembly;
//! this crate defines what they all share: the trap model, bounds-check results, table element
//! traits, and call-stack depth accounting.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![deny(unsafe_code)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::std_instead_of_core)]

#[cfg(feature = "std")]
extern crate std;

pub mod stack;
pub mod table;
pub mod trap;

/// Error type used when an address or index was out of bounds.
///
/// This carries no detail on purpose; the helper functions in the other `wasmbake-rt-*` crates
/// attach the memory/table index and address before handing the failure to a
/// [`Trap`](trap::Trap) implementation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BoundsCheckError;

impl core::fmt::Display for BoundsCheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("out-of-bounds address")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoundsCheckError {}

/// Result type used for functions that need to indicate if an address or index is out of bounds.
pub type BoundsCheck<T> = core::result::Result<T, BoundsCheckError>;
