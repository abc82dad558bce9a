use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::buffer_view::{BufferLayout, BufferView};
use crate::error::MemoryError;
use crate::types::ComponentType;

/// A pre-allocated byte arena. Sub-ranges are handed out as [`BufferView`]s
/// by bumping a free pointer; nothing is ever freed.
///
/// `Buffer` is a shared handle: clones see the same bytes. Views and
/// accessors hold a clone as their back-reference, so the arena lives as
/// long as anything still points into it.
#[derive(Clone)]
pub struct Buffer {
    inner: Rc<BufferInner>,
}

struct BufferInner {
    name: String,
    byte_length: usize,
    // Stored as u64 words so the byte view is 8-byte aligned and can be
    // reinterpreted as f32/f64 without copying.
    words: RefCell<Box<[u64]>>,
    next_free_byte_offset: Cell<usize>,
}

impl Buffer {
    /// Allocate a zeroed arena of `byte_length` bytes.
    pub fn new(name: impl Into<String>, byte_length: usize) -> Self {
        let name = name.into();
        let words = vec![0u64; byte_length.div_ceil(8)].into_boxed_slice();
        tracing::debug!(buffer = %name, byte_length, "allocated buffer");
        Self {
            inner: Rc::new(BufferInner {
                name,
                byte_length,
                words: RefCell::new(words),
                next_free_byte_offset: Cell::new(0),
            }),
        }
    }

    /// Wrap a copy of externally produced bytes (e.g. a decoded glTF `.bin`).
    /// The whole range counts as free; views are carved from offset 0.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        let buffer = Self::new(name, bytes.len());
        buffer.write_bytes(0, bytes);
        buffer
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn byte_length(&self) -> usize {
        self.inner.byte_length
    }

    /// Bytes already handed out. Always a multiple of 4.
    pub fn used_byte_length(&self) -> usize {
        self.inner.next_free_byte_offset.get()
    }

    pub fn remaining_byte_length(&self) -> usize {
        self.byte_length() - self.used_byte_length()
    }

    /// True if both handles point at the same arena.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Carve the next `byte_length_needed` bytes into a view.
    ///
    /// Length and stride are rounded up to multiples of 4; the padding is
    /// logged, never an error. Fails only when the arena is exhausted.
    pub fn take_buffer_view(
        &self,
        byte_length_needed: usize,
        byte_stride: usize,
        layout: BufferLayout,
    ) -> Result<BufferView, MemoryError> {
        let byte_length = crate::align_up(byte_length_needed, 4);
        if byte_length != byte_length_needed {
            tracing::info!(
                buffer = %self.name(),
                from = byte_length_needed,
                to = byte_length,
                "padded buffer view length to a multiple of 4"
            );
        }
        let stride = crate::align_up(byte_stride, 4);
        if stride != byte_stride {
            tracing::info!(
                buffer = %self.name(),
                from = byte_stride,
                to = stride,
                "padded buffer view stride to a multiple of 4"
            );
        }

        let offset = self.used_byte_length();
        if byte_length > self.remaining_byte_length() {
            return Err(MemoryError::OutOfMemory {
                buffer: self.name().to_string(),
                requested: byte_length,
                available: self.remaining_byte_length(),
            });
        }
        self.inner.next_free_byte_offset.set(offset + byte_length);

        tracing::debug!(
            buffer = %self.name(),
            offset,
            byte_length,
            stride,
            ?layout,
            "took buffer view"
        );
        Ok(BufferView::new(self.clone(), offset, byte_length, stride, layout))
    }

    /// The whole arena as bytes, for upload by a render backend.
    pub fn bytes(&self) -> Ref<'_, [u8]> {
        let len = self.inner.byte_length;
        Ref::map(self.inner.words.borrow(), |words| {
            &bytemuck::cast_slice::<u64, u8>(words)[..len]
        })
    }

    /// The arena reinterpreted as 32-bit floats, e.g. RGBA32F texels.
    pub fn as_f32_texels(&self) -> Ref<'_, [f32]> {
        let len = self.inner.byte_length / 4;
        Ref::map(self.inner.words.borrow(), |words| {
            &bytemuck::cast_slice::<u64, f32>(words)[..len]
        })
    }

    /// Decode `out.len()` components starting at `byte_offset`, `step` bytes apart.
    ///
    /// Callers validate ranges against their view; indexing past the arena
    /// is an invariant violation.
    pub(crate) fn read_components(
        &self,
        byte_offset: usize,
        step: usize,
        component: ComponentType,
        little_endian: bool,
        out: &mut [f64],
    ) {
        let size = component.size_in_bytes();
        let words = self.inner.words.borrow();
        let bytes = bytemuck::cast_slice::<u64, u8>(&words[..]);
        for (k, value) in out.iter_mut().enumerate() {
            let at = byte_offset + k * step;
            *value = component.decode(&bytes[at..at + size], little_endian);
        }
    }

    /// Encode `values` starting at `byte_offset`, `step` bytes apart.
    pub(crate) fn write_components(
        &self,
        byte_offset: usize,
        step: usize,
        component: ComponentType,
        little_endian: bool,
        values: &[f64],
    ) {
        let size = component.size_in_bytes();
        let mut words = self.inner.words.borrow_mut();
        let bytes = bytemuck::cast_slice_mut::<u64, u8>(&mut words[..]);
        for (k, value) in values.iter().enumerate() {
            let at = byte_offset + k * step;
            component.encode(*value, little_endian, &mut bytes[at..at + size]);
        }
    }

    fn write_bytes(&self, byte_offset: usize, src: &[u8]) {
        let mut words = self.inner.words.borrow_mut();
        let bytes = bytemuck::cast_slice_mut::<u64, u8>(&mut words[..]);
        bytes[byte_offset..byte_offset + src.len()].copy_from_slice(src);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.inner.name)
            .field("byte_length", &self.inner.byte_length)
            .field("used", &self.used_byte_length())
            .finish()
    }
}
