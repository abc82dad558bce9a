use std::ops::Deref;

use super::base::AccessorBase;
use crate::error::MemoryError;

/// Accessor whose element shape is only known at runtime.
///
/// Values travel as plain `f64` slices of up to the composition's arity,
/// which suits importers that forward attribute metadata unchanged.
#[derive(Debug)]
pub struct FlexibleAccessor {
    base: AccessorBase,
}

impl Deref for FlexibleAccessor {
    type Target = AccessorBase;

    fn deref(&self) -> &AccessorBase {
        &self.base
    }
}

impl FlexibleAccessor {
    pub(crate) fn new(base: AccessorBase) -> Self {
        Self { base }
    }

    /// All components of element `index`.
    pub fn get_value(&self, index: usize) -> Result<Vec<f64>, MemoryError> {
        let mut out = vec![0.0; self.number_of_components()];
        self.base.read(index, &mut out)?;
        Ok(out)
    }

    /// Overwrite the leading components of element `index`.
    pub fn set_value(&self, index: usize, values: &[f64]) -> Result<(), MemoryError> {
        self.base.write(index, values)
    }

    /// Component `k` of element `index`.
    pub fn get_component(&self, index: usize, k: usize) -> Result<f64, MemoryError> {
        let value = self.get_value(index)?;
        value.get(k).copied().ok_or(MemoryError::ArityMismatch {
            requested: k + 1,
            composition: self.composition_type(),
        })
    }

    pub fn set_component(&self, index: usize, k: usize, value: f64) -> Result<(), MemoryError> {
        let mut values = self.get_value(index)?;
        let slot = values.get_mut(k).ok_or(MemoryError::ArityMismatch {
            requested: k + 1,
            composition: self.composition_type(),
        })?;
        *slot = value;
        self.base.write(index, &values)
    }

    /// Bulk-load tightly packed values of any arity, element by element.
    /// Nothing is written unless the whole source fits.
    pub fn copy_from_slice(&self, src: &[f64]) -> Result<(), MemoryError> {
        let components = self.number_of_components();
        if src.len() % components != 0 {
            return Err(MemoryError::RaggedSource {
                len: src.len(),
                components,
            });
        }
        let elements = src.len() / components;
        if elements > self.count() {
            return Err(MemoryError::IndexOutOfRange {
                index: elements - 1,
                count: self.count(),
            });
        }
        for (index, chunk) in src.chunks_exact(components).enumerate() {
            self.base.write(index, chunk)?;
        }
        Ok(())
    }
}
