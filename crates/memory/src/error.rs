use crate::types::{ComponentType, CompositionType};

/// Errors raised by the arena and accessor layer.
///
/// All of these are capacity or usage errors: raise the configured buffer
/// sizes or fix the caller. None of them is transient.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("invalid engine config: {0}")]
    Config(#[from] lattice_common::ConfigError),
    #[error("buffer '{buffer}' exhausted: requested {requested} bytes, {available} available")]
    OutOfMemory {
        buffer: String,
        requested: usize,
        available: usize,
    },
    #[error(
        "accessor range ends at byte {end} but its buffer view ends at byte {view_end} \
         ({composition:?} x {component:?}, count {count})"
    )]
    AccessorOutOfBounds {
        end: usize,
        view_end: usize,
        composition: CompositionType,
        component: ComponentType,
        count: usize,
    },
    #[error("byte stride {stride} is smaller than the element size {element_size}")]
    StrideTooSmall { stride: usize, element_size: usize },
    #[error("accessor element count must be non-zero")]
    EmptyAccessor,
    #[error("composition type {0:?} cannot back an accessor")]
    UnsupportedComposition(CompositionType),
    #[error("component type {0:?} cannot back an accessor")]
    UnsupportedComponentType(ComponentType),
    #[error("copying {0}-component elements is not supported (1 to 4 only)")]
    UnsupportedArity(usize),
    #[error("{requested}-component access on a {composition:?} accessor")]
    ArityMismatch {
        requested: usize,
        composition: CompositionType,
    },
    #[error("element index {index} out of range for accessor of {count} elements")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("accessor has no unclaimed elements left ({count} taken)")]
    AccessorExhausted { count: usize },
    #[error("source holds {len} values, not a whole number of {components}-component elements")]
    RaggedSource { len: usize, components: usize },
}
