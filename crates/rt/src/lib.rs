//! Runtime support functionality for WebAssembly modules compiled ahead-of-time to native code
//! by `wasmbake`.
//!
//! Generated code is a straight-line sequence of calls into this crate: memory and table
//! accesses, numeric operators with trap semantics, segment initialisation, and the indirect
//! call check. Embedders depend on this crate too, for the [`trap::TrapError`] type that carries
//! a caught trap out of a translated module.
//!
//! # Related Crates
//!
//! The implementation is split into component crates, re-exported here as modules:
//! - [`wasmbake_rt_core`], shared foundations; its [`stack`] and [`table element`] modules are
//!   re-exported in the crate root.
//! - [`wasmbake_rt_func_ref`], function references and the indirect call check, re-exported as
//!   the [`func_ref`] module.
//! - [`wasmbake_rt_math`], integer and floating-point operators, re-exported as the [`math`]
//!   module.
//! - [`wasmbake_rt_memory`], linear memory, re-exported as the [`memory`] module.
//! - [`wasmbake_rt_table`], tables, re-exported as the [`table`] module.
//!
//! [`wasmbake_rt_core`]: rt_core
//! [`wasmbake_rt_func_ref`]: rt_func_ref
//! [`wasmbake_rt_math`]: rt_math
//! [`wasmbake_rt_memory`]: rt_memory
//! [`wasmbake_rt_table`]: rt_table
//! [`stack`]: stack
//! [`table element`]: element

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)] // Unsafe code present in dependencies
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![deny(clippy::alloc_instead_of_core)]
#![deny(clippy::std_instead_of_core)]
#![deny(clippy::cast_possible_truncation)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

pub use rt_core::{stack, table as element};
pub use rt_func_ref as func_ref;
pub use rt_math as math;
pub use rt_memory as memory;
pub use rt_table as table;

pub mod trap;
