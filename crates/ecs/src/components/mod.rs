//! Built-in component classes.

mod mesh;
mod mesh_renderer;
mod scene_graph;
mod transform;

pub use mesh::{MeshComponent, Primitive, VertexAttribute};
pub use mesh_renderer::MeshRendererComponent;
pub use scene_graph::SceneGraphComponent;
pub use transform::TransformComponent;

use lattice_common::ComponentTid;

use crate::error::EcsError;
use crate::repository::ComponentRepository;

pub const TRANSFORM_TID: ComponentTid = ComponentTid(1);
pub const SCENE_GRAPH_TID: ComponentTid = ComponentTid(2);
pub const MESH_TID: ComponentTid = ComponentTid(3);
pub const MESH_RENDERER_TID: ComponentTid = ComponentTid(4);

/// Register the built-in classes under their fixed tids.
pub fn register_builtin(repository: &mut ComponentRepository) -> Result<(), EcsError> {
    repository.register_component_class::<TransformComponent>(TRANSFORM_TID)?;
    repository
        .register_component_class::<SceneGraphComponent>(SCENE_GRAPH_TID)?
        .on_logic();
    repository.register_component_class::<MeshComponent>(MESH_TID)?;
    repository
        .register_component_class::<MeshRendererComponent>(MESH_RENDERER_TID)?
        .on_load()
        .on_pre_render()
        .on_render();
    Ok(())
}
