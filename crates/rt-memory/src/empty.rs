use crate::{Address, BoundsCheck, BoundsCheckError, Memory};

/// A [`Memory`] implementation that always has a size of zero.
///
/// Stands in for the linear memory of modules that neither declare nor import one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EmptyMemory;

impl<I: Address> Memory<I> for EmptyMemory {
    fn size(&self) -> I {
        I::ZERO
    }

    fn maximum(&self) -> I {
        I::ZERO
    }

    fn copy_to_slice(&self, addr: I, dst: &mut [u8]) -> BoundsCheck<()> {
        if addr == I::ZERO && dst.is_empty() {
            Ok(())
        } else {
            Err(BoundsCheckError)
        }
    }

    fn copy_from_slice(&self, addr: I, src: &[u8]) -> BoundsCheck<()> {
        if addr == I::ZERO && src.is_empty() {
            Ok(())
        } else {
            Err(BoundsCheckError)
        }
    }
}
