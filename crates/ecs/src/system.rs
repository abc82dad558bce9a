//! Per-frame stage scheduler.

use std::collections::BTreeMap;

use lattice_common::{ComponentSid, ComponentTid};
use lattice_memory::MemoryManager;

use crate::error::EcsError;
use crate::repository::ComponentRepository;
use crate::stage::{InstanceIdProvider, ProcessStage, StageContext};

/// Sids to visit for one `(class, stage)` pair, terminated by
/// [`ComponentSid::INVALID`].
#[derive(Debug)]
struct StageIndex {
    sids: Box<[u32]>,
    dirty: bool,
    built_for: usize,
}

impl StageIndex {
    fn new(capacity: usize) -> Self {
        Self {
            sids: vec![ComponentSid::INVALID.0; capacity + 1].into_boxed_slice(),
            dirty: true,
            built_for: 0,
        }
    }

    fn needs_rebuild(&self, count: usize) -> bool {
        self.dirty || self.built_for != count
    }

    fn rebuild(&mut self, repository: &ComponentRepository, tid: ComponentTid) {
        let mut len = 0;
        for component in repository.get_components_with_type(tid) {
            self.sids[len] = component.core().sid().0;
            len += 1;
        }
        self.sids[len] = ComponentSid::INVALID.0;
        self.dirty = false;
        self.built_for = len;
    }

    fn iter(&self) -> impl Iterator<Item = ComponentSid> + '_ {
        self.sids
            .iter()
            .take_while(|&&sid| sid != ComponentSid::INVALID.0)
            .map(|&sid| ComponentSid(sid))
    }
}

/// Drives every registered class through the lifecycle stages once per frame.
#[derive(Debug)]
pub struct System {
    max_entity_count: usize,
    indices: BTreeMap<(ComponentTid, ProcessStage), StageIndex>,
    frame_count: u64,
    last_frame_dispatches: usize,
}

impl System {
    pub fn new(max_entity_count: u32) -> Self {
        Self {
            max_entity_count: max_entity_count as usize,
            indices: BTreeMap::new(),
            frame_count: 0,
            last_frame_dispatches: 0,
        }
    }

    /// Frames completed without error.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Hook invocations made by the most recent frame.
    pub fn last_frame_dispatches(&self) -> usize {
        self.last_frame_dispatches
    }

    /// Force the index of `(tid, stage)` to be rebuilt before its next use.
    /// Dispatch does not filter on a component's current stage, so a dirty
    /// index only costs one rebuild.
    pub fn mark_dirty(&mut self, tid: ComponentTid, stage: ProcessStage) {
        if let Some(index) = self.indices.get_mut(&(tid, stage)) {
            index.dirty = true;
        }
    }

    /// Run one frame: stages in order, then classes in registration order,
    /// then instances by ascending sid. The first failing hook aborts the
    /// frame and its error is returned.
    pub fn process(
        &mut self,
        repository: &mut ComponentRepository,
        memory: &MemoryManager,
        provider: &mut dyn InstanceIdProvider,
    ) -> Result<(), EcsError> {
        let _span = tracing::info_span!("system_process", frame = self.frame_count).entered();
        let tids = repository.registered_tids().to_vec();
        let mut dispatches = 0;

        for stage in ProcessStage::ALL {
            let instance_ids = match stage {
                ProcessStage::PreRender => Some(provider.update_instance_ids(memory)?),
                _ => None,
            };
            let ctx = StageContext {
                stage,
                frame: self.frame_count,
                instance_ids,
            };

            for &tid in &tids {
                let Some(hook) = repository.stage_hook(tid, stage) else {
                    continue;
                };
                let count = repository.component_count(tid);
                let capacity = self.max_entity_count;
                let index = self
                    .indices
                    .entry((tid, stage))
                    .or_insert_with(|| StageIndex::new(capacity));
                if index.needs_rebuild(count) {
                    index.rebuild(repository, tid);
                }

                let mut moved = Vec::new();
                for sid in index.iter() {
                    let Some(component) = repository.get_component_mut(tid, sid) else {
                        continue;
                    };
                    let before = component.core().current_stage();
                    if let Err(e) = hook(component, &ctx) {
                        tracing::error!(
                            stage = stage.method_name(),
                            %tid,
                            %sid,
                            error = %e,
                            "stage hook failed"
                        );
                        return Err(e);
                    }
                    let after = component.core().current_stage();
                    if before != after {
                        moved.push((before, after));
                    }
                    dispatches += 1;
                }
                for (before, after) in moved {
                    self.mark_dirty(tid, before);
                    self.mark_dirty(tid, after);
                }
                tracing::trace!(stage = stage.method_name(), %tid, count, "dispatched stage");
            }
        }

        self.frame_count += 1;
        self.last_frame_dispatches = dispatches;
        tracing::debug!(dispatches, "frame complete");
        Ok(())
    }
}
