use crate::component::{ComponentClass, ComponentCore, MemberSlots};
use crate::error::EcsError;
use crate::impl_component;
use crate::stage::{OnLoad, OnPreRender, OnRender, ProcessStage, ResourceHandle, StageContext};

/// Renders the mesh of its entity. Loads once, then issues one draw per
/// frame against the instance-id buffer received in `PreRender`.
#[derive(Debug)]
pub struct MeshRendererComponent {
    core: ComponentCore,
    loaded: bool,
    instance_ids: Option<ResourceHandle>,
    draw_count: u64,
}

impl_component!(MeshRendererComponent);

impl ComponentClass for MeshRendererComponent {
    const NAME: &'static str = "MeshRendererComponent";

    fn construct(core: ComponentCore, _slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self {
            core,
            loaded: false,
            instance_ids: None,
            draw_count: 0,
        })
    }
}

impl MeshRendererComponent {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn instance_ids(&self) -> Option<ResourceHandle> {
        self.instance_ids
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }
}

impl OnLoad for MeshRendererComponent {
    fn on_load(&mut self, _ctx: &StageContext) -> Result<(), EcsError> {
        if !self.loaded {
            self.loaded = true;
            self.core.move_stage_to(ProcessStage::Render);
            tracing::debug!(entity = %self.core.entity_uid(), "mesh renderer loaded");
        }
        Ok(())
    }
}

impl OnPreRender for MeshRendererComponent {
    fn on_pre_render(
        &mut self,
        _ctx: &StageContext,
        instance_ids: ResourceHandle,
    ) -> Result<(), EcsError> {
        self.instance_ids = Some(instance_ids);
        Ok(())
    }
}

impl OnRender for MeshRendererComponent {
    fn on_render(&mut self, ctx: &StageContext) -> Result<(), EcsError> {
        if !self.loaded {
            return Err(EcsError::StageFailed {
                stage: ctx.stage,
                entity: self.core.entity_uid(),
                message: "render before load".into(),
            });
        }
        self.draw_count += 1;
        Ok(())
    }
}
