use std::collections::BTreeMap;

use lattice_common::{ComponentSid, ComponentTid, EntityUid};
use lattice_memory::MemoryManager;
use serde::Serialize;

use crate::component::Component;
use crate::error::EcsError;
use crate::repository::ComponentRepository;

/// A handle to an entity. Entities are never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Entity {
    uid: EntityUid,
    alive: bool,
}

impl Entity {
    pub fn uid(&self) -> EntityUid {
        self.uid
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Issues entity uids and records which component instance each entity
/// owns per class.
#[derive(Debug)]
pub struct EntityRepository {
    max_entity_number: u32,
    uid_counter: u32,
    // Slot 0 is never populated; uids index directly.
    entities: Vec<Option<Entity>>,
    components: Vec<BTreeMap<ComponentTid, ComponentSid>>,
}

impl EntityRepository {
    pub fn new(max_entity_number: u32) -> Self {
        Self {
            max_entity_number,
            uid_counter: 0,
            entities: vec![None],
            components: vec![BTreeMap::new()],
        }
    }

    /// Create an entity owning one instance of each listed class.
    ///
    /// Unregistered tids are skipped with a warning. Any other component
    /// failure aborts; the entity keeps the components created so far.
    pub fn create_entity(
        &mut self,
        tids: &[ComponentTid],
        repository: &mut ComponentRepository,
        memory: &MemoryManager,
    ) -> Result<Entity, EcsError> {
        if self.uid_counter >= self.max_entity_number {
            return Err(EcsError::EntityCapacityExceeded(self.max_entity_number));
        }
        self.uid_counter += 1;
        let uid = EntityUid(self.uid_counter);
        let entity = Entity { uid, alive: true };
        self.entities.push(Some(entity));
        self.components.push(BTreeMap::new());

        for &tid in tids {
            match repository.create_component(tid, uid, memory) {
                Ok(sid) => {
                    self.components[uid.index()].insert(tid, sid);
                }
                Err(EcsError::UnregisteredClass(tid)) => {
                    tracing::warn!(entity = %uid, %tid, "skipping unregistered component class");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(entity = %uid, components = tids.len(), "created entity");
        Ok(entity)
    }

    pub fn get_entity(&self, uid: EntityUid) -> Option<&Entity> {
        self.entities.get(uid.index())?.as_ref()
    }

    /// Sid of the `tid` instance owned by `uid`, if any.
    pub fn component_sid(&self, uid: EntityUid, tid: ComponentTid) -> Option<ComponentSid> {
        self.components.get(uid.index())?.get(&tid).copied()
    }

    /// Every `(tid, sid)` pair owned by `uid`, ordered by tid.
    pub fn components_of_entity(
        &self,
        uid: EntityUid,
    ) -> impl Iterator<Item = (ComponentTid, ComponentSid)> + '_ {
        self.components
            .get(uid.index())
            .into_iter()
            .flat_map(|m| m.iter().map(|(&t, &s)| (t, s)))
    }

    pub fn get_component_of_entity<'a>(
        &self,
        uid: EntityUid,
        tid: ComponentTid,
        repository: &'a ComponentRepository,
    ) -> Option<&'a (dyn Component + 'static)> {
        let sid = self.component_sid(uid, tid)?;
        repository.get_component(tid, sid)
    }

    pub fn entity_count(&self) -> usize {
        self.uid_counter as usize
    }

    pub fn get_max_entity_number(&self) -> u32 {
        self.max_entity_number
    }

    /// Entities in ascending uid order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().flatten()
    }
}
