use glam::{DMat3, DMat4, DVec2, DVec3, DVec4};

use crate::buffer::Buffer;
use crate::types::{ComponentType, CompositionType};

/// One claimed element of a class-shared accessor.
///
/// Reads and writes go straight to the arena bytes; nothing is cached.
/// Components beyond the element's arity read as zero and writes to them
/// are dropped. Clones alias the same bytes.
#[derive(Debug, Clone)]
pub struct ElementView {
    buffer: Buffer,
    byte_offset_in_buffer: usize,
    composition: CompositionType,
    component: ComponentType,
    little_endian: bool,
}

impl ElementView {
    pub(crate) fn new(
        buffer: Buffer,
        byte_offset_in_buffer: usize,
        composition: CompositionType,
        component: ComponentType,
        little_endian: bool,
    ) -> Self {
        Self {
            buffer,
            byte_offset_in_buffer,
            composition,
            component,
            little_endian,
        }
    }

    pub fn byte_offset_in_buffer(&self) -> usize {
        self.byte_offset_in_buffer
    }

    pub fn composition_type(&self) -> CompositionType {
        self.composition
    }

    pub fn component_type(&self) -> ComponentType {
        self.component
    }

    pub fn arity(&self) -> usize {
        self.composition.number_of_components()
    }

    /// All components of the element.
    pub fn values(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.arity()];
        self.read_into(&mut out);
        out
    }

    /// Overwrite the leading components with `values`.
    pub fn set_values(&self, values: &[f64]) {
        let n = values.len().min(self.arity());
        self.buffer.write_components(
            self.byte_offset_in_buffer,
            self.component.size_in_bytes(),
            self.component,
            self.little_endian,
            &values[..n],
        );
    }

    fn read_into(&self, out: &mut [f64]) {
        let n = out.len().min(self.arity());
        self.buffer.read_components(
            self.byte_offset_in_buffer,
            self.component.size_in_bytes(),
            self.component,
            self.little_endian,
            &mut out[..n],
        );
    }

    fn read_array<const N: usize>(&self) -> [f64; N] {
        let mut out = [0.0; N];
        self.read_into(&mut out);
        out
    }

    pub fn get_scalar(&self) -> f64 {
        self.read_array::<1>()[0]
    }

    pub fn set_scalar(&self, value: f64) {
        self.set_values(&[value]);
    }

    pub fn get_vec2(&self) -> DVec2 {
        DVec2::from_array(self.read_array())
    }

    pub fn set_vec2(&self, value: DVec2) {
        self.set_values(&value.to_array());
    }

    pub fn get_vec3(&self) -> DVec3 {
        DVec3::from_array(self.read_array())
    }

    pub fn set_vec3(&self, value: DVec3) {
        self.set_values(&value.to_array());
    }

    pub fn get_vec4(&self) -> DVec4 {
        DVec4::from_array(self.read_array())
    }

    pub fn set_vec4(&self, value: DVec4) {
        self.set_values(&value.to_array());
    }

    pub fn get_mat3(&self) -> DMat3 {
        DMat3::from_cols_array(&self.read_array())
    }

    pub fn set_mat3(&self, value: DMat3) {
        self.set_values(&value.to_cols_array());
    }

    pub fn get_mat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.read_array())
    }

    pub fn set_mat4(&self, value: DMat4) {
        self.set_values(&value.to_cols_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(composition: CompositionType, component: ComponentType) -> ElementView {
        ElementView::new(Buffer::new("test", 128), 0, composition, component, true)
    }

    #[test]
    fn vec3_round_trip() {
        let v = view(CompositionType::Vec3, ComponentType::Float);
        v.set_vec3(DVec3::new(1.0, -2.5, 3.25));
        assert_eq!(v.get_vec3(), DVec3::new(1.0, -2.5, 3.25));
    }

    #[test]
    fn mat4_round_trip() {
        let v = view(CompositionType::Mat4, ComponentType::Float);
        let m = DMat4::from_translation(DVec3::new(4.0, 5.0, 6.0));
        v.set_mat4(m);
        assert_eq!(v.get_mat4(), m);
    }

    #[test]
    fn components_past_arity_read_zero_and_drop_writes() {
        let v = view(CompositionType::Vec2, ComponentType::Float);
        v.set_vec4(DVec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(v.get_vec4(), DVec4::new(1.0, 2.0, 0.0, 0.0));
        assert_eq!(v.values(), vec![1.0, 2.0]);
    }

    #[test]
    fn clones_alias_the_same_bytes() {
        let a = view(CompositionType::Scalar, ComponentType::UnsignedShort);
        let b = a.clone();
        a.set_scalar(513.0);
        assert_eq!(b.get_scalar(), 513.0);
    }
}
