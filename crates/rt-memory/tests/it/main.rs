use wasmbake_rt_core::trap::{Trap, TrapInfo, TrapKind};

mod access;

#[cfg(all(feature = "guard-pages", target_family = "unix", target_pointer_width = "64"))]
mod guard;


/// Minimal embedder error for the tests: records only the trap kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Trapped(pub TrapKind);

impl<C: TrapInfo> Trap<C> for Trapped {
    fn trap(cause: C) -> Self {
        Self(cause.kind())
    }
}
