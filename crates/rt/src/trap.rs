//! Provides the embedder-level implementation for [WebAssembly traps].
//!
//! The runtime crates report failures as small per-concern error types; [`TrapError`] is the
//! ready-made embedder error that accepts all of them, preserves the originating cause, and
//! exposes the stable [`TrapKind`]. Generated code is oblivious to the concrete type and only
//! requires `E: Trap<C>`, so embedders with their own error machinery can substitute it.
//!
//! [WebAssembly traps]: https://webassembly.github.io/spec/core/intro/overview.html#trap

mod trap_error;

pub use rt_core::trap::{unreachable, Trap, TrapInfo, TrapKind, UnreachableError};
pub use trap_error::{TrapCause, TrapError};
