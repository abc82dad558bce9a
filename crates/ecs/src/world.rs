use lattice_common::{ComponentTid, EngineConfig, EntityUid};
use lattice_memory::MemoryManager;

use crate::component::{Component, ComponentClass};
use crate::components::{self, SceneGraphComponent, TransformComponent};
use crate::entity::{Entity, EntityRepository};
use crate::error::EcsError;
use crate::repository::{ClassRegistration, ComponentRepository};
use crate::stage::InstanceIdProvider;
use crate::system::System;

/// Owns the arenas, both repositories and the scheduler for one engine
/// instance. Pass it explicitly; there is no global instance.
pub struct World {
    config: EngineConfig,
    memory: MemoryManager,
    components: ComponentRepository,
    entities: EntityRepository,
    system: System,
}

impl World {
    /// An empty world with no registered classes. Fails if `config` does
    /// not validate.
    pub fn new(config: EngineConfig) -> Result<Self, EcsError> {
        let _span = tracing::info_span!("world_new").entered();
        let memory = MemoryManager::new(&config)?;
        let max = config.max_entity_count;
        Ok(Self {
            memory,
            components: ComponentRepository::new(max),
            entities: EntityRepository::new(max),
            system: System::new(max),
            config,
        })
    }

    /// A world with the built-in transform, scene graph and mesh classes.
    pub fn with_builtin_components(config: EngineConfig) -> Result<Self, EcsError> {
        let mut world = Self::new(config)?;
        components::register_builtin(&mut world.components)?;
        Ok(world)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn components(&self) -> &ComponentRepository {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRepository {
        &mut self.components
    }

    pub fn entities(&self) -> &EntityRepository {
        &self.entities
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn register_component_class<T: ComponentClass>(
        &mut self,
        tid: ComponentTid,
    ) -> Result<ClassRegistration<'_, T>, EcsError> {
        self.components.register_component_class::<T>(tid)
    }

    /// Create an entity with one instance of each listed class. A scene
    /// graph created next to a transform is bound to its local matrix.
    pub fn create_entity(&mut self, tids: &[ComponentTid]) -> Result<Entity, EcsError> {
        let entity = self
            .entities
            .create_entity(tids, &mut self.components, &self.memory)?;
        let uid = entity.uid();

        let local = self
            .component_of_entity::<TransformComponent>(uid, components::TRANSFORM_TID)
            .map(|t| t.matrix_view().clone());
        if let Some(local) = local {
            if let Some(graph) =
                self.component_of_entity_mut::<SceneGraphComponent>(uid, components::SCENE_GRAPH_TID)
            {
                graph.bind_local_matrix(local);
            }
        }
        Ok(entity)
    }

    pub fn get_component_of_entity(
        &self,
        uid: EntityUid,
        tid: ComponentTid,
    ) -> Option<&(dyn Component + 'static)> {
        self.entities
            .get_component_of_entity(uid, tid, &self.components)
    }

    pub fn component_of_entity<T: Component>(&self, uid: EntityUid, tid: ComponentTid) -> Option<&T> {
        self.get_component_of_entity(uid, tid)?.downcast_ref::<T>()
    }

    pub fn component_of_entity_mut<T: Component>(
        &mut self,
        uid: EntityUid,
        tid: ComponentTid,
    ) -> Option<&mut T> {
        let sid = self.entities.component_sid(uid, tid)?;
        self.components.get_component_as_mut::<T>(tid, sid)
    }

    /// Parent `child` under `parent` in the scene graph. Both entities need
    /// a scene graph component; a child has at most one parent and cycles
    /// are rejected.
    pub fn add_child(&mut self, parent: EntityUid, child: EntityUid) -> Result<(), EcsError> {
        let tid = components::SCENE_GRAPH_TID;
        let invalid = |reason| EcsError::InvalidHierarchy {
            parent,
            child,
            reason,
        };
        if parent == child {
            return Err(invalid("an entity cannot parent itself"));
        }

        let graph = |uid| {
            self.component_of_entity::<SceneGraphComponent>(uid, tid)
                .ok_or(EcsError::MissingComponent { entity: uid, tid })
        };
        if graph(child)?.parent().is_some() {
            return Err(invalid("child already has a parent"));
        }
        let mut ancestor = graph(parent)?.parent();
        while let Some(uid) = ancestor {
            if uid == child {
                return Err(invalid("would create a cycle"));
            }
            ancestor = graph(uid)?.parent();
        }
        let parent_world = graph(parent)?.world_matrix_view().clone();

        if let Some(node) = self.component_of_entity_mut::<SceneGraphComponent>(child, tid) {
            node.set_parent(parent, parent_world);
        }
        if let Some(node) = self.component_of_entity_mut::<SceneGraphComponent>(parent, tid) {
            node.push_child(child);
        }
        tracing::debug!(%parent, %child, "linked scene graph nodes");
        Ok(())
    }

    /// Run one frame of the scheduler.
    pub fn process(&mut self, provider: &mut dyn InstanceIdProvider) -> Result<(), EcsError> {
        self.system
            .process(&mut self.components, &self.memory, provider)
    }
}
