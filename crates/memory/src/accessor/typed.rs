use std::ops::Deref;

use glam::{DMat2, DMat3, DMat4, DVec2, DVec3, DVec4};

use super::base::AccessorBase;
use crate::error::MemoryError;
use crate::types::ComponentType;

/// Plain numeric element types an accessor can be bulk-loaded from.
pub trait TypedElement: bytemuck::Pod {
    const COMPONENT_TYPE: ComponentType;

    fn to_f64(self) -> f64;
}

macro_rules! typed_element {
    ($($t:ty => $component:ident),* $(,)?) => {
        $(
            impl TypedElement for $t {
                const COMPONENT_TYPE: ComponentType = ComponentType::$component;

                fn to_f64(self) -> f64 {
                    f64::from(self)
                }
            }
        )*
    };
}

typed_element! {
    i8 => Byte,
    u8 => UnsignedByte,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
    f64 => Double,
}

/// Accessor with the fixed-shape scalar/vector/matrix API.
///
/// Index `i` is element-relative and zero-based. Reading or writing more
/// components than the composition type carries is an error.
#[derive(Debug)]
pub struct Accessor {
    base: AccessorBase,
}

impl Deref for Accessor {
    type Target = AccessorBase;

    fn deref(&self) -> &AccessorBase {
        &self.base
    }
}

impl Accessor {
    pub(crate) fn new(base: AccessorBase) -> Self {
        Self { base }
    }

    fn get<const N: usize>(&self, index: usize) -> Result<[f64; N], MemoryError> {
        let mut out = [0.0; N];
        self.base.read(index, &mut out)?;
        Ok(out)
    }

    pub fn get_scalar(&self, index: usize) -> Result<f64, MemoryError> {
        Ok(self.get::<1>(index)?[0])
    }

    pub fn get_vec2(&self, index: usize) -> Result<DVec2, MemoryError> {
        self.get(index).map(DVec2::from_array)
    }

    pub fn get_vec3(&self, index: usize) -> Result<DVec3, MemoryError> {
        self.get(index).map(DVec3::from_array)
    }

    pub fn get_vec4(&self, index: usize) -> Result<DVec4, MemoryError> {
        self.get(index).map(DVec4::from_array)
    }

    /// Column-major, as glTF stores matrices.
    pub fn get_mat2(&self, index: usize) -> Result<DMat2, MemoryError> {
        self.get(index).map(|cols| DMat2::from_cols_array(&cols))
    }

    pub fn get_mat3(&self, index: usize) -> Result<DMat3, MemoryError> {
        self.get(index).map(|cols| DMat3::from_cols_array(&cols))
    }

    pub fn get_mat4(&self, index: usize) -> Result<DMat4, MemoryError> {
        self.get(index).map(|cols| DMat4::from_cols_array(&cols))
    }

    pub fn set_scalar(&self, index: usize, value: f64) -> Result<(), MemoryError> {
        self.base.write(index, &[value])
    }

    pub fn set_vec2(&self, index: usize, value: DVec2) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_array())
    }

    pub fn set_vec3(&self, index: usize, value: DVec3) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_array())
    }

    pub fn set_vec4(&self, index: usize, value: DVec4) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_array())
    }

    pub fn set_mat2(&self, index: usize, value: DMat2) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_cols_array())
    }

    pub fn set_mat3(&self, index: usize, value: DMat3) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_cols_array())
    }

    pub fn set_mat4(&self, index: usize, value: DMat4) -> Result<(), MemoryError> {
        self.base.write(index, &value.to_cols_array())
    }

    /// Bulk-load a tightly packed external array into this accessor's
    /// strided storage, starting at element 0.
    ///
    /// Only 1 to 4 component elements are supported.
    pub fn copy_from_typed_array<T: TypedElement>(&self, src: &[T]) -> Result<(), MemoryError> {
        let components = self.number_of_components();
        if !(1..=4).contains(&components) {
            return Err(MemoryError::UnsupportedArity(components));
        }
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

        let mut values = [0.0; 4];
        for (index, chunk) in src.chunks_exact(components).enumerate() {
            for (value, item) in values.iter_mut().zip(chunk) {
                *value = item.to_f64();
            }
            let row = &values[..components];
            match components {
                1 => self.set_scalar(index, row[0])?,
                2 => self.set_vec2(index, DVec2::from_slice(row))?,
                3 => self.set_vec3(index, DVec3::from_slice(row))?,
                _ => self.set_vec4(index, DVec4::from_slice(row))?,
            }
        }
        tracing::debug!(
            elements,
            source = ?T::COMPONENT_TYPE,
            target = ?self.component_type(),
            "copied typed array into accessor"
        );
        Ok(())
    }

    /// Bulk-load raw bytes holding native-endian `T` values, e.g. a slice of a
    /// glTF binary chunk.
    pub fn copy_from_raw<T: TypedElement>(&self, raw: &[u8]) -> Result<(), MemoryError> {
        let size = std::mem::size_of::<T>();
        if raw.len() % size != 0 {
            return Err(MemoryError::RaggedSource {
                len: raw.len(),
                components: size,
            });
        }
        let values: Vec<T> = raw
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned::<T>)
            .collect();
        self.copy_from_typed_array(&values)
    }
}
