//! Memory arena and typed-view layer.
//!
//! One big pre-allocated [`Buffer`] per [`BufferUse`] is carved into
//! [`BufferView`]s by bump allocation. Each view hands out strided
//! [`Accessor`]s that read and write scalars, vectors and matrices straight
//! from the arena bytes, so the same memory can be uploaded to the GPU
//! without repacking.
//!
//! # Invariants
//! - Arenas never free; a buffer's free pointer only grows and stays a multiple of 4.
//! - Byte ranges handed out by one buffer never overlap.
//! - Every accessor's last element ends inside its buffer view (checked at construction).
//! - Single-threaded: handles are `Rc`-based and `!Send`.

mod accessor;
mod buffer;
mod buffer_view;
mod error;
mod manager;
mod types;

pub use accessor::{Accessor, AccessorBase, ElementView, FlexibleAccessor, TypedElement};
pub use buffer::Buffer;
pub use buffer_view::{AccessorLayout, BufferLayout, BufferView};
pub use error::MemoryError;
pub use manager::{BufferStats, MemoryManager};
pub use types::{BufferUse, ComponentType, CompositionType};

pub fn crate_info() -> &'static str {
    "lattice-memory v0.1.0"
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiples() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(12, 4), 12);
        assert_eq!(align_up(13, 8), 16);
    }
}
