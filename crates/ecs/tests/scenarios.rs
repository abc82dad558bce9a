use std::cell::RefCell;

use glam::DVec3;
use lattice_common::{ComponentSid, ComponentTid, EngineConfig, EntityUid};
use lattice_ecs::components::{
    MESH_RENDERER_TID, MESH_TID, MeshRendererComponent, SCENE_GRAPH_TID, SceneGraphComponent,
    TRANSFORM_TID,
};
use lattice_ecs::{
    Component, ComponentClass, ComponentCore, EcsError, MemberSlots, NullInstanceIdProvider, OnCreate,
    OnDiscard, OnLoad, OnLogic, OnMount, OnPreRender, OnRender, OnUnmount, ProcessStage,
    ResourceHandle, StageContext, World, impl_component,
};
use lattice_memory::{BufferLayout, BufferUse, ComponentType, CompositionType, MemoryError};

thread_local! {
    static SEEN: RefCell<Vec<(&'static str, ProcessStage)>> = const { RefCell::new(Vec::new()) };
}

fn seen(class: &'static str, stage: ProcessStage) {
    SEEN.with(|s| s.borrow_mut().push((class, stage)));
}

fn drain() -> Vec<(&'static str, ProcessStage)> {
    SEEN.with(|s| std::mem::take(&mut *s.borrow_mut()))
}

struct Recorder {
    core: ComponentCore,
}

impl_component!(Recorder);

impl ComponentClass for Recorder {
    const NAME: &'static str = "Recorder";

    fn construct(core: ComponentCore, _slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self { core })
    }
}

macro_rules! record_stage {
    ($ty:ty, $name:literal, $($trait:ident :: $method:ident),*) => {
        $(
            impl $trait for $ty {
                fn $method(&mut self, ctx: &StageContext) -> Result<(), EcsError> {
                    seen($name, ctx.stage);
                    Ok(())
                }
            }
        )*
    };
}

record_stage!(
    Recorder,
    "recorder",
    OnCreate::on_create,
    OnLoad::on_load,
    OnMount::on_mount,
    OnLogic::on_logic,
    OnRender::on_render,
    OnUnmount::on_unmount,
    OnDiscard::on_discard
);

impl OnPreRender for Recorder {
    fn on_pre_render(
        &mut self,
        ctx: &StageContext,
        _instance_ids: ResourceHandle,
    ) -> Result<(), EcsError> {
        seen("recorder", ctx.stage);
        Ok(())
    }
}

struct LoadRender {
    core: ComponentCore,
}

impl_component!(LoadRender);

impl ComponentClass for LoadRender {
    const NAME: &'static str = "LoadRender";

    fn construct(core: ComponentCore, _slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self { core })
    }
}

record_stage!(LoadRender, "load_render", OnLoad::on_load, OnRender::on_render);

fn config() -> EngineConfig {
    EngineConfig {
        buffer_side_length: 64,
        max_entity_count: 256,
        little_endian: true,
    }
}

#[test]
fn basic_entity_component() {
    let mut world = World::with_builtin_components(config()).unwrap();
    let entity = world
        .create_entity(&[TRANSFORM_TID, SCENE_GRAPH_TID])
        .unwrap();
    assert_eq!(entity.uid(), EntityUid(1));

    let component = world
        .get_component_of_entity(EntityUid(1), SCENE_GRAPH_TID)
        .expect("scene graph component");
    assert!(component.downcast_ref::<SceneGraphComponent>().is_some());
    assert_eq!(component.core().sid(), ComponentSid(1));
}

#[test]
fn identities_are_monotonic() {
    let mut world = World::with_builtin_components(config()).unwrap();
    let mut last_uid = 0;
    for i in 0..20 {
        let tids: &[ComponentTid] = if i % 2 == 0 {
            &[TRANSFORM_TID, SCENE_GRAPH_TID]
        } else {
            &[TRANSFORM_TID]
        };
        let uid = world.create_entity(tids).unwrap().uid();
        assert!(uid.0 > last_uid);
        last_uid = uid.0;
    }
    assert_eq!(last_uid, 20);

    let sids: Vec<u32> = world
        .components()
        .get_components_with_type(SCENE_GRAPH_TID)
        .map(|c| c.core().sid().0)
        .collect();
    assert_eq!(sids, (1..=10).collect::<Vec<_>>());
    assert!(
        world
            .components()
            .get_component(TRANSFORM_TID, ComponentSid(0))
            .is_none()
    );
}

#[test]
fn stages_run_in_lifecycle_order() {
    drain();
    let mut world = World::new(config()).unwrap();
    world
        .register_component_class::<Recorder>(ComponentTid(10))
        .unwrap()
        .on_create()
        .on_load()
        .on_mount()
        .on_logic()
        .on_pre_render()
        .on_render()
        .on_unmount()
        .on_discard();
    world
        .register_component_class::<LoadRender>(ComponentTid(11))
        .unwrap()
        .on_load()
        .on_render();
    world
        .create_entity(&[ComponentTid(10), ComponentTid(11)])
        .unwrap();

    world.process(&mut NullInstanceIdProvider::default()).unwrap();
    let log = drain();

    let recorder: Vec<ProcessStage> = log
        .iter()
        .filter(|(class, _)| *class == "recorder")
        .map(|&(_, stage)| stage)
        .collect();
    assert_eq!(recorder, ProcessStage::ALL.to_vec());

    let partial: Vec<ProcessStage> = log
        .iter()
        .filter(|(class, _)| *class == "load_render")
        .map(|&(_, stage)| stage)
        .collect();
    assert_eq!(partial, vec![ProcessStage::Load, ProcessStage::Render]);
    assert_eq!(world.system().frame_count(), 1);
}

#[test]
fn unregistered_class_is_omitted() {
    let mut world = World::with_builtin_components(config()).unwrap();
    let uid = world
        .create_entity(&[TRANSFORM_TID, ComponentTid(99)])
        .unwrap()
        .uid();
    assert!(world.get_component_of_entity(uid, TRANSFORM_TID).is_some());
    assert!(world.get_component_of_entity(uid, ComponentTid(99)).is_none());
}

#[test]
fn mesh_renderer_draws_after_loading() {
    let mut world = World::with_builtin_components(config()).unwrap();
    let uid = world
        .create_entity(&[TRANSFORM_TID, SCENE_GRAPH_TID, MESH_TID, MESH_RENDERER_TID])
        .unwrap()
        .uid();
    let mut provider = NullInstanceIdProvider::default();
    for _ in 0..3 {
        world.process(&mut provider).unwrap();
    }
    let renderer = world
        .component_of_entity::<MeshRendererComponent>(uid, MESH_RENDERER_TID)
        .unwrap();
    assert!(renderer.is_loaded());
    assert_eq!(renderer.draw_count(), 3);
    assert_eq!(renderer.instance_ids(), Some(ResourceHandle::default()));
    assert_eq!(renderer.core().current_stage(), ProcessStage::Render);
    assert_eq!(provider.calls(), 3);
}

#[test]
fn accessor_overflow_fails_at_construction() {
    let world = World::new(config()).unwrap();
    let mut view = world
        .memory()
        .buffer(BufferUse::CpuGeneric)
        .take_buffer_view(64, 0, BufferLayout::Soa)
        .unwrap();
    let err = view
        .take_accessor(CompositionType::Mat4, ComponentType::Float, 4)
        .unwrap_err();
    assert!(matches!(err, MemoryError::AccessorOutOfBounds { .. }));
}

#[test]
fn aos_and_soa_agree_on_logical_values() {
    let world = World::new(config()).unwrap();
    let buffer = world.memory().buffer(BufferUse::GpuVertexData);
    let positions = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
    let normals = [0.0f32, 0.0, 1.0, 0.0, 1.0, 0.0];

    let mut interleaved = buffer
        .take_buffer_view(48, 24, BufferLayout::Aos)
        .unwrap();
    let aos_position = interleaved
        .take_accessor(CompositionType::Vec3, ComponentType::Float, 2)
        .unwrap();
    let aos_normal = interleaved
        .take_accessor(CompositionType::Vec3, ComponentType::Float, 2)
        .unwrap();
    aos_position.copy_from_typed_array(&positions).unwrap();
    aos_normal.copy_from_typed_array(&normals).unwrap();

    let soa_position = buffer
        .take_buffer_view(24, 0, BufferLayout::Soa)
        .unwrap()
        .take_accessor(CompositionType::Vec3, ComponentType::Float, 2)
        .unwrap();
    let soa_normal = buffer
        .take_buffer_view(24, 0, BufferLayout::Soa)
        .unwrap()
        .take_accessor(CompositionType::Vec3, ComponentType::Float, 2)
        .unwrap();
    soa_position.copy_from_typed_array(&positions).unwrap();
    soa_normal.copy_from_typed_array(&normals).unwrap();

    assert_eq!(aos_position.get_vec3(1).unwrap(), DVec3::new(3.0, 4.0, 5.0));
    assert_eq!(aos_position.get_vec3(1).unwrap(), soa_position.get_vec3(1).unwrap());
    assert_eq!(aos_normal.get_vec3(1).unwrap(), soa_normal.get_vec3(1).unwrap());
    assert_ne!(
        aos_normal.byte_offset_in_buffer() - aos_position.byte_offset_in_buffer(),
        soa_normal.byte_offset_in_buffer() - soa_position.byte_offset_in_buffer()
    );
}

#[test]
fn component_capacity_surfaces_as_error() {
    let mut world = World::with_builtin_components(EngineConfig {
        buffer_side_length: 16,
        max_entity_count: 2,
        little_endian: true,
    })
    .unwrap();
    world.create_entity(&[TRANSFORM_TID]).unwrap();
    world.create_entity(&[TRANSFORM_TID]).unwrap();
    assert!(matches!(
        world.create_entity(&[TRANSFORM_TID]),
        Err(EcsError::EntityCapacityExceeded(2))
    ));
}

#[test]
fn big_endian_world_round_trips() {
    let mut world = World::with_builtin_components(EngineConfig {
        little_endian: false,
        ..config()
    })
    .unwrap();
    let uid = world
        .create_entity(&[TRANSFORM_TID, SCENE_GRAPH_TID])
        .unwrap()
        .uid();
    world
        .component_of_entity_mut::<lattice_ecs::components::TransformComponent>(uid, TRANSFORM_TID)
        .unwrap()
        .set_translate(DVec3::new(1.5, -2.0, 8.0));
    world.process(&mut NullInstanceIdProvider::default()).unwrap();
    let graph = world
        .component_of_entity::<SceneGraphComponent>(uid, SCENE_GRAPH_TID)
        .unwrap();
    assert_eq!(
        graph.world_matrix().w_axis.truncate(),
        DVec3::new(1.5, -2.0, 8.0)
    );
}
