//! Lifecycle stages and the per-stage capability traits.
//!
//! A component class opts into a stage by implementing the matching trait
//! and naming it at registration; the scheduler never calls a stage the
//! class did not declare.

use lattice_memory::MemoryManager;
use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::EcsError;

/// One phase of the per-frame lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessStage {
    Create,
    Load,
    Mount,
    Logic,
    PreRender,
    Render,
    Unmount,
    Discard,
}

impl ProcessStage {
    pub const ALL: [ProcessStage; 8] = [
        Self::Create,
        Self::Load,
        Self::Mount,
        Self::Logic,
        Self::PreRender,
        Self::Render,
        Self::Unmount,
        Self::Discard,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the stage entry point, as reported in logs.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Create => "$create",
            Self::Load => "$load",
            Self::Mount => "$mount",
            Self::Logic => "$logic",
            Self::PreRender => "$prerender",
            Self::Render => "$render",
            Self::Unmount => "$unmount",
            Self::Discard => "$discard",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

/// Opaque handle to a render-side resource, such as the instance-id buffer
/// produced once per frame before the `PreRender` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceHandle(pub u32);

/// Render-side collaborator asked for the instance-id buffer once per frame.
pub trait InstanceIdProvider {
    fn update_instance_ids(&mut self, memory: &MemoryManager) -> Result<ResourceHandle, EcsError>;
}

/// Provider for headless runs: always hands back the default handle.
#[derive(Debug, Default)]
pub struct NullInstanceIdProvider {
    calls: u64,
}

impl NullInstanceIdProvider {
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl InstanceIdProvider for NullInstanceIdProvider {
    fn update_instance_ids(&mut self, _memory: &MemoryManager) -> Result<ResourceHandle, EcsError> {
        self.calls += 1;
        Ok(ResourceHandle::default())
    }
}

/// Per-dispatch information handed to stage hooks.
#[derive(Debug, Clone, Copy)]
pub struct StageContext {
    pub stage: ProcessStage,
    pub frame: u64,
    /// Set only while dispatching [`ProcessStage::PreRender`].
    pub instance_ids: Option<ResourceHandle>,
}

pub trait OnCreate {
    fn on_create(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnLoad {
    fn on_load(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnMount {
    fn on_mount(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnLogic {
    fn on_logic(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnPreRender {
    fn on_pre_render(
        &mut self,
        ctx: &StageContext,
        instance_ids: ResourceHandle,
    ) -> Result<(), EcsError>;
}

pub trait OnRender {
    fn on_render(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnUnmount {
    fn on_unmount(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

pub trait OnDiscard {
    fn on_discard(&mut self, ctx: &StageContext) -> Result<(), EcsError>;
}

/// Type-erased stage entry point stored per class and stage.
pub(crate) type StageHook = fn(&mut dyn Component, &StageContext) -> Result<(), EcsError>;

fn downcast<T: Component>(component: &mut dyn Component) -> Result<&mut T, EcsError> {
    let (tid, sid) = (component.core().tid(), component.core().sid());
    component
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or(EcsError::TypeMismatch {
            tid,
            sid,
            expected: std::any::type_name::<T>(),
        })
}

pub(crate) fn create_hook<T: Component + OnCreate>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_create(ctx)
}

pub(crate) fn load_hook<T: Component + OnLoad>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_load(ctx)
}

pub(crate) fn mount_hook<T: Component + OnMount>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_mount(ctx)
}

pub(crate) fn logic_hook<T: Component + OnLogic>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_logic(ctx)
}

pub(crate) fn pre_render_hook<T: Component + OnPreRender>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    let handle = ctx
        .instance_ids
        .ok_or(EcsError::MissingInstanceIds(ctx.stage))?;
    downcast::<T>(c)?.on_pre_render(ctx, handle)
}

pub(crate) fn render_hook<T: Component + OnRender>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_render(ctx)
}

pub(crate) fn unmount_hook<T: Component + OnUnmount>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_unmount(ctx)
}

pub(crate) fn discard_hook<T: Component + OnDiscard>(
    c: &mut dyn Component,
    ctx: &StageContext,
) -> Result<(), EcsError> {
    downcast::<T>(c)?.on_discard(ctx)
}
