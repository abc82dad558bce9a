use glam::DMat4;
use lattice_common::EntityUid;
use lattice_memory::{BufferUse, ComponentType, CompositionType, ElementView};

use crate::component::{ComponentClass, ComponentCore, MemberInfo, MemberSlots};
use crate::error::EcsError;
use crate::impl_component;
use crate::stage::{OnLogic, StageContext};

/// Parent/child links and the world matrix uploaded to the GPU instance
/// buffer.
///
/// The world matrix is recomputed during `Logic` from the parent's world
/// matrix and the bound local matrix. A parent with a higher sid than its
/// child is one frame behind.
pub struct SceneGraphComponent {
    core: ComponentCore,
    world_matrix: ElementView,
    local_matrix: Option<ElementView>,
    parent: Option<(EntityUid, ElementView)>,
    children: Vec<EntityUid>,
}

impl_component!(SceneGraphComponent);

impl ComponentClass for SceneGraphComponent {
    const NAME: &'static str = "SceneGraphComponent";

    fn members() -> Vec<MemberInfo> {
        vec![MemberInfo::new(
            BufferUse::GpuInstanceData,
            "worldMatrix",
            CompositionType::Mat4,
            ComponentType::Float,
        )
        .with_initial(&DMat4::IDENTITY.to_cols_array())]
    }

    fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self {
            core,
            world_matrix: slots.take("worldMatrix")?,
            local_matrix: None,
            parent: None,
            children: Vec::new(),
        })
    }
}

impl SceneGraphComponent {
    pub fn world_matrix(&self) -> DMat4 {
        self.world_matrix.get_mat4()
    }

    pub fn world_matrix_view(&self) -> &ElementView {
        &self.world_matrix
    }

    /// Local matrix, identity when none is bound.
    pub fn local_matrix(&self) -> DMat4 {
        self.local_matrix
            .as_ref()
            .map_or(DMat4::IDENTITY, ElementView::get_mat4)
    }

    pub fn bind_local_matrix(&mut self, view: ElementView) {
        self.local_matrix = Some(view);
    }

    pub fn parent(&self) -> Option<EntityUid> {
        self.parent.as_ref().map(|(uid, _)| *uid)
    }

    pub fn children(&self) -> &[EntityUid] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_parent(&mut self, parent: EntityUid, parent_world: ElementView) {
        self.parent = Some((parent, parent_world));
    }

    pub(crate) fn push_child(&mut self, child: EntityUid) {
        self.children.push(child);
    }
}

impl OnLogic for SceneGraphComponent {
    fn on_logic(&mut self, _ctx: &StageContext) -> Result<(), EcsError> {
        let local = self.local_matrix();
        let world = match &self.parent {
            Some((_, parent_world)) => parent_world.get_mat4() * local,
            None => local,
        };
        self.world_matrix.set_mat4(world);
        Ok(())
    }
}
