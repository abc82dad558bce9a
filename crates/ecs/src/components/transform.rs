use glam::{DMat4, DQuat, DVec3, DVec4};
use lattice_memory::{BufferUse, ComponentType, CompositionType, ElementView};

use crate::component::{ComponentClass, ComponentCore, MemberInfo, MemberSlots};
use crate::error::EcsError;
use crate::impl_component;

/// Local translation, rotation and scale plus the derived local matrix.
///
/// Every setter rewrites the matrix immediately, so readers of
/// [`matrix_view`](Self::matrix_view) never see a stale value.
pub struct TransformComponent {
    core: ComponentCore,
    translate: ElementView,
    rotate: ElementView,
    scale: ElementView,
    matrix: ElementView,
}

impl_component!(TransformComponent);

impl ComponentClass for TransformComponent {
    const NAME: &'static str = "TransformComponent";

    fn members() -> Vec<MemberInfo> {
        let member = |name, composition| {
            MemberInfo::new(BufferUse::CpuGeneric, name, composition, ComponentType::Float)
        };
        vec![
            member("translate", CompositionType::Vec3).with_initial(&[0.0, 0.0, 0.0]),
            member("rotate", CompositionType::Vec4).with_initial(&[0.0, 0.0, 0.0, 1.0]),
            member("scale", CompositionType::Vec3).with_initial(&[1.0, 1.0, 1.0]),
            member("matrix", CompositionType::Mat4)
                .with_initial(&DMat4::IDENTITY.to_cols_array()),
        ]
    }

    fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self {
            core,
            translate: slots.take("translate")?,
            rotate: slots.take("rotate")?,
            scale: slots.take("scale")?,
            matrix: slots.take("matrix")?,
        })
    }
}

impl TransformComponent {
    pub fn translate(&self) -> DVec3 {
        self.translate.get_vec3()
    }

    pub fn set_translate(&mut self, value: DVec3) {
        self.translate.set_vec3(value);
        self.update_matrix();
    }

    pub fn rotate(&self) -> DQuat {
        let v = self.rotate.get_vec4();
        DQuat::from_xyzw(v.x, v.y, v.z, v.w)
    }

    /// Stores the normalized quaternion; a zero quaternion becomes identity.
    pub fn set_rotate(&mut self, value: DQuat) {
        let q = if value.length_squared() > 0.0 {
            value.normalize()
        } else {
            DQuat::IDENTITY
        };
        self.rotate.set_vec4(DVec4::new(q.x, q.y, q.z, q.w));
        self.update_matrix();
    }

    pub fn scale(&self) -> DVec3 {
        self.scale.get_vec3()
    }

    pub fn set_scale(&mut self, value: DVec3) {
        self.scale.set_vec3(value);
        self.update_matrix();
    }

    pub fn matrix(&self) -> DMat4 {
        self.matrix.get_mat4()
    }

    /// Decompose `value` into translation, rotation and scale.
    pub fn set_matrix(&mut self, value: DMat4) {
        let (scale, rotation, translation) = value.to_scale_rotation_translation();
        self.translate.set_vec3(translation);
        self.rotate
            .set_vec4(DVec4::new(rotation.x, rotation.y, rotation.z, rotation.w));
        self.scale.set_vec3(scale);
        self.matrix.set_mat4(value);
    }

    /// The arena row holding the local matrix.
    pub fn matrix_view(&self) -> &ElementView {
        &self.matrix
    }

    fn update_matrix(&self) {
        let m = DMat4::from_scale_rotation_translation(self.scale(), self.rotate(), self.translate());
        self.matrix.set_mat4(m);
    }
}
