use crate::accessor::{Accessor, AccessorBase, FlexibleAccessor};
use crate::buffer::Buffer;
use crate::error::MemoryError;
use crate::types::{ComponentType, CompositionType};

/// Physical arrangement of the accessors inside one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferLayout {
    /// Array of structures: accessors interleave inside a shared row stride.
    Aos,
    /// Structure of arrays: each accessor owns a contiguous run.
    Soa,
}

/// Placement record of an accessor issued by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    pub byte_offset_in_buffer: usize,
    pub byte_stride: usize,
    pub element_size_in_bytes: usize,
    pub count: usize,
}

/// A strided sub-range of a [`Buffer`] that issues accessors.
///
/// The view keeps a strong handle to its buffer so accessors stay valid
/// after the caller drops its own handle. Buffers never point back at their
/// views, so no reference cycle forms, and arena space is never returned.
#[derive(Debug)]
pub struct BufferView {
    buffer: Buffer,
    byte_offset_in_buffer: usize,
    byte_length: usize,
    byte_stride: usize,
    layout: BufferLayout,
    next_free_byte_offset: usize,
    little_endian: bool,
    accessors: Vec<AccessorLayout>,
}

impl BufferView {
    pub(crate) fn new(
        buffer: Buffer,
        byte_offset_in_buffer: usize,
        byte_length: usize,
        byte_stride: usize,
        layout: BufferLayout,
    ) -> Self {
        Self {
            buffer,
            byte_offset_in_buffer,
            byte_length,
            byte_stride,
            layout,
            next_free_byte_offset: 0,
            little_endian: true,
            accessors: Vec::new(),
        }
    }

    /// Set the byte order used by accessors issued after this call.
    pub fn with_little_endian(mut self, little_endian: bool) -> Self {
        self.little_endian = little_endian;
        self
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn byte_offset_in_buffer(&self) -> usize {
        self.byte_offset_in_buffer
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub fn is_aos(&self) -> bool {
        self.layout == BufferLayout::Aos
    }

    pub fn is_soa(&self) -> bool {
        self.layout == BufferLayout::Soa
    }

    /// Bytes of this view already claimed by accessors.
    pub fn used_byte_length(&self) -> usize {
        self.next_free_byte_offset
    }

    /// Placement records of every accessor issued so far, in issue order.
    pub fn accessors(&self) -> &[AccessorLayout] {
        &self.accessors
    }

    /// Issue a typed accessor of `count` elements.
    ///
    /// SoA views give each accessor its own tightly packed run and advance the
    /// cursor by the whole run. AoS views advance the cursor by one element and
    /// use the view's stride as row pitch, so successive accessors interleave.
    pub fn take_accessor(
        &mut self,
        composition: CompositionType,
        component: ComponentType,
        count: usize,
    ) -> Result<Accessor, MemoryError> {
        self.take_base(composition, component, count).map(Accessor::new)
    }

    /// Like [`take_accessor`](Self::take_accessor) but returns an accessor
    /// with the shape-agnostic get/set API.
    pub fn take_flexible_accessor(
        &mut self,
        composition: CompositionType,
        component: ComponentType,
        count: usize,
    ) -> Result<FlexibleAccessor, MemoryError> {
        self.take_base(composition, component, count)
            .map(FlexibleAccessor::new)
    }

    fn take_base(
        &mut self,
        composition: CompositionType,
        component: ComponentType,
        count: usize,
    ) -> Result<AccessorBase, MemoryError> {
        if !composition.is_storable() {
            return Err(MemoryError::UnsupportedComposition(composition));
        }
        if component == ComponentType::Unknown {
            return Err(MemoryError::UnsupportedComponentType(component));
        }
        let element_size = composition.number_of_components() * component.size_in_bytes();

        let mut cursor = self.next_free_byte_offset;
        if component.size_in_bytes() == 8 {
            let absolute = self.byte_offset_in_buffer + cursor;
            let aligned = crate::align_up(absolute, 8);
            if aligned != absolute {
                tracing::info!(
                    from = absolute,
                    to = aligned,
                    "padded double accessor offset to 8-byte alignment"
                );
                cursor += aligned - absolute;
            }
        }

        let byte_stride = match self.layout {
            BufferLayout::Soa => element_size,
            BufferLayout::Aos if self.byte_stride == 0 => element_size,
            BufferLayout::Aos => self.byte_stride,
        };

        let base = AccessorBase::new(
            self.buffer.clone(),
            self.byte_offset_in_buffer + cursor,
            byte_stride,
            composition,
            component,
            count,
            self.little_endian,
            self.byte_offset_in_buffer + self.byte_length,
        )?;

        self.next_free_byte_offset = match self.layout {
            BufferLayout::Aos => cursor + element_size,
            BufferLayout::Soa => cursor + element_size * count,
        };
        self.accessors.push(AccessorLayout {
            byte_offset_in_buffer: base.byte_offset_in_buffer(),
            byte_stride,
            element_size_in_bytes: element_size,
            count,
        });
        tracing::debug!(
            offset = base.byte_offset_in_buffer(),
            byte_stride,
            ?composition,
            ?component,
            count,
            "took accessor"
        );
        Ok(base)
    }

    /// Advisory self-consistency check of the layout classification.
    ///
    /// Only the first two accessors are compared, and the size condition can
    /// never hold for non-empty elements, so any view with two or more
    /// accessors reports `false`. The check is kept as observed; it is
    /// likely inverted and must not drive behavior.
    pub fn recheck_is_soa(&self) -> bool {
        let [first, second, ..] = self.accessors.as_slice() else {
            return true;
        };
        first.byte_stride == second.byte_stride
            && first.element_size_in_bytes + second.element_size_in_bytes
                < first.element_size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(len: usize, stride: usize, layout: BufferLayout) -> BufferView {
        Buffer::new("test", 4096)
            .take_buffer_view(len, stride, layout)
            .unwrap()
    }

    #[test]
    fn soa_accessors_get_contiguous_runs() {
        let mut v = view(256, 0, BufferLayout::Soa);
        let a = v
            .take_accessor(CompositionType::Vec3, ComponentType::Float, 4)
            .unwrap();
        let b = v
            .take_accessor(CompositionType::Scalar, ComponentType::Float, 4)
            .unwrap();
        assert_eq!(a.byte_stride(), 12);
        assert_eq!(b.byte_offset_in_buffer(), 48);
        assert_eq!(v.used_byte_length(), 64);
    }

    #[test]
    fn aos_accessors_interleave() {
        let mut v = view(96, 24, BufferLayout::Aos);
        let position = v
            .take_accessor(CompositionType::Vec3, ComponentType::Float, 4)
            .unwrap();
        let normal = v
            .take_accessor(CompositionType::Vec3, ComponentType::Float, 4)
            .unwrap();
        assert_eq!(position.byte_offset_in_buffer(), 0);
        assert_eq!(normal.byte_offset_in_buffer(), 12);
        assert_eq!(position.byte_stride(), 24);
        assert_eq!(normal.byte_stride(), 24);
        assert_eq!(v.used_byte_length(), 24);
    }

    #[test]
    fn overflowing_accessor_fails() {
        let mut v = view(64, 0, BufferLayout::Soa);
        let err = v
            .take_accessor(CompositionType::Mat4, ComponentType::Float, 4)
            .unwrap_err();
        assert!(matches!(err, MemoryError::AccessorOutOfBounds { .. }));
        // Nothing was claimed by the failed attempt.
        assert!(v.accessors().is_empty());
        assert_eq!(v.used_byte_length(), 0);
    }

    #[test]
    fn texture_and_unknown_types_are_rejected() {
        let mut v = view(64, 0, BufferLayout::Soa);
        assert!(matches!(
            v.take_accessor(CompositionType::Texture2D, ComponentType::Float, 1),
            Err(MemoryError::UnsupportedComposition(CompositionType::Texture2D))
        ));
        assert!(matches!(
            v.take_accessor(CompositionType::Vec2, ComponentType::Unknown, 1),
            Err(MemoryError::UnsupportedComponentType(_))
        ));
    }

    #[test]
    fn double_accessors_are_eight_byte_aligned() {
        let mut v = view(64, 0, BufferLayout::Soa);
        v.take_accessor(CompositionType::Scalar, ComponentType::Float, 1)
            .unwrap();
        let d = v
            .take_accessor(CompositionType::Scalar, ComponentType::Double, 2)
            .unwrap();
        assert_eq!(d.byte_offset_in_buffer() % 8, 0);
        assert_eq!(d.byte_offset_in_buffer(), 8);
    }

    #[test]
    fn recheck_keeps_observed_behavior() {
        let mut v = view(96, 24, BufferLayout::Aos);
        assert!(v.recheck_is_soa());
        v.take_accessor(CompositionType::Vec3, ComponentType::Float, 4)
            .unwrap();
        assert!(v.recheck_is_soa());
        v.take_accessor(CompositionType::Vec3, ComponentType::Float, 4)
            .unwrap();
        assert!(!v.recheck_is_soa());
    }

    #[test]
    fn view_outlives_the_buffer_handle() {
        let buffer = Buffer::new("short-lived", 64);
        let mut v = buffer.take_buffer_view(32, 0, BufferLayout::Soa).unwrap();
        drop(buffer);
        let a = v
            .take_accessor(CompositionType::Scalar, ComponentType::Float, 4)
            .unwrap();
        a.set_scalar(3, 1.5).unwrap();
        assert_eq!(a.get_scalar(3).unwrap(), 1.5);
        assert_eq!(v.buffer().used_byte_length(), 32);
    }
}
