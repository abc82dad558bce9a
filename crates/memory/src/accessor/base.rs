use std::cell::Cell;

use super::element::ElementView;
use crate::buffer::Buffer;
use crate::error::MemoryError;
use crate::types::{ComponentType, CompositionType};

/// Placement, bounds and encoding shared by every accessor flavour.
#[derive(Debug)]
pub struct AccessorBase {
    buffer: Buffer,
    byte_offset_in_buffer: usize,
    byte_stride: usize,
    composition: CompositionType,
    component: ComponentType,
    count: usize,
    little_endian: bool,
    taken_count: Cell<usize>,
}

impl AccessorBase {
    /// Validate and build an accessor whose view ends at byte `view_end`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        buffer: Buffer,
        byte_offset_in_buffer: usize,
        byte_stride: usize,
        composition: CompositionType,
        component: ComponentType,
        count: usize,
        little_endian: bool,
        view_end: usize,
    ) -> Result<Self, MemoryError> {
        if count == 0 {
            return Err(MemoryError::EmptyAccessor);
        }
        let element_size = composition.number_of_components() * component.size_in_bytes();
        if byte_stride < element_size {
            return Err(MemoryError::StrideTooSmall {
                stride: byte_stride,
                element_size,
            });
        }
        let end = byte_offset_in_buffer + byte_stride * (count - 1) + element_size;
        if end > view_end {
            return Err(MemoryError::AccessorOutOfBounds {
                end,
                view_end,
                composition,
                component,
                count,
            });
        }
        Ok(Self {
            buffer,
            byte_offset_in_buffer,
            byte_stride,
            composition,
            component,
            count,
            little_endian,
            taken_count: Cell::new(0),
        })
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn byte_offset_in_buffer(&self) -> usize {
        self.byte_offset_in_buffer
    }

    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    pub fn composition_type(&self) -> CompositionType {
        self.composition
    }

    pub fn component_type(&self) -> ComponentType {
        self.component
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn number_of_components(&self) -> usize {
        self.composition.number_of_components()
    }

    pub fn element_size_in_bytes(&self) -> usize {
        self.number_of_components() * self.component.size_in_bytes()
    }

    pub fn little_endian(&self) -> bool {
        self.little_endian
    }

    /// Elements already claimed through [`take_one`](Self::take_one).
    pub fn taken_count(&self) -> usize {
        self.taken_count.get()
    }

    /// Claim the next unclaimed element as a zero-copy view.
    ///
    /// Each element is handed out at most once.
    pub fn take_one(&self) -> Result<ElementView, MemoryError> {
        let index = self.taken_count.get();
        if index >= self.count {
            return Err(MemoryError::AccessorExhausted { count: self.count });
        }
        let view = self.element(index)?;
        self.taken_count.set(index + 1);
        Ok(view)
    }

    /// View of element `index` without claiming it.
    pub fn element(&self, index: usize) -> Result<ElementView, MemoryError> {
        let byte_offset = self.element_byte_offset(index)?;
        Ok(ElementView::new(
            self.buffer.clone(),
            byte_offset,
            self.composition,
            self.component,
            self.little_endian,
        ))
    }

    pub(crate) fn element_byte_offset(&self, index: usize) -> Result<usize, MemoryError> {
        if index >= self.count {
            return Err(MemoryError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(self.byte_offset_in_buffer + self.byte_stride * index)
    }

    fn check_arity(&self, requested: usize) -> Result<(), MemoryError> {
        if requested > self.number_of_components() {
            return Err(MemoryError::ArityMismatch {
                requested,
                composition: self.composition,
            });
        }
        Ok(())
    }

    /// Decode the first `out.len()` components of element `index`.
    pub(crate) fn read(&self, index: usize, out: &mut [f64]) -> Result<(), MemoryError> {
        self.check_arity(out.len())?;
        let offset = self.element_byte_offset(index)?;
        self.buffer.read_components(
            offset,
            self.component.size_in_bytes(),
            self.component,
            self.little_endian,
            out,
        );
        Ok(())
    }

    /// Encode `values` into the first components of element `index`.
    pub(crate) fn write(&self, index: usize, values: &[f64]) -> Result<(), MemoryError> {
        self.check_arity(values.len())?;
        let offset = self.element_byte_offset(index)?;
        self.buffer.write_components(
            offset,
            self.component.size_in_bytes(),
            self.component,
            self.little_endian,
            values,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_view::BufferLayout;

    #[test]
    fn bounds_invariant_is_checked_at_construction() {
        let buffer = Buffer::new("test", 256);
        // 4 Vec3<f32> elements need exactly 48 bytes.
        assert!(
            AccessorBase::new(
                buffer.clone(),
                0,
                12,
                CompositionType::Vec3,
                ComponentType::Float,
                4,
                true,
                48
            )
            .is_ok()
        );
        assert!(matches!(
            AccessorBase::new(
                buffer,
                0,
                12,
                CompositionType::Vec3,
                ComponentType::Float,
                4,
                true,
                47
            ),
            Err(MemoryError::AccessorOutOfBounds { end: 48, view_end: 47, .. })
        ));
    }

    #[test]
    fn stride_smaller_than_element_is_rejected() {
        let buffer = Buffer::new("test", 256);
        let err = AccessorBase::new(
            buffer,
            0,
            8,
            CompositionType::Vec3,
            ComponentType::Float,
            2,
            true,
            256,
        )
        .unwrap_err();
        assert!(matches!(err, MemoryError::StrideTooSmall { stride: 8, element_size: 12 }));
    }

    #[test]
    fn take_one_claims_successive_rows_until_exhausted() {
        let mut view = Buffer::new("test", 64)
            .take_buffer_view(64, 0, BufferLayout::Soa)
            .unwrap();
        let accessor = view
            .take_accessor(CompositionType::Vec4, ComponentType::Float, 2)
            .unwrap();
        let first = accessor.take_one().unwrap();
        let second = accessor.take_one().unwrap();
        assert_eq!(first.byte_offset_in_buffer(), 0);
        assert_eq!(second.byte_offset_in_buffer(), 16);
        assert_eq!(accessor.taken_count(), 2);
        assert!(matches!(
            accessor.take_one(),
            Err(MemoryError::AccessorExhausted { count: 2 })
        ));
    }

    #[test]
    fn element_index_is_bounds_checked() {
        let mut view = Buffer::new("test", 64)
            .take_buffer_view(64, 0, BufferLayout::Soa)
            .unwrap();
        let accessor = view
            .take_accessor(CompositionType::Scalar, ComponentType::Int, 3)
            .unwrap();
        assert!(matches!(
            accessor.element(3),
            Err(MemoryError::IndexOutOfRange { index: 3, count: 3 })
        ));
    }
}
