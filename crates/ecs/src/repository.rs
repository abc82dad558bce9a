//! Class registry and dense per-class instance tables.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use lattice_common::{ComponentSid, ComponentTid, EntityUid};
use lattice_memory::{Accessor, BufferLayout, BufferUse, BufferView, MemoryManager};

use crate::component::{Component, ComponentClass, ComponentCore, MemberInfo, MemberSlots};
use crate::error::EcsError;
use crate::stage::{
    self, OnCreate, OnDiscard, OnLoad, OnLogic, OnMount, OnPreRender, OnRender, OnUnmount,
    ProcessStage, StageHook,
};

type Factory = fn(ComponentCore, &mut MemberSlots) -> Result<Box<dyn Component>, EcsError>;

fn build<T: ComponentClass>(
    core: ComponentCore,
    slots: &mut MemberSlots,
) -> Result<Box<dyn Component>, EcsError> {
    Ok(Box::new(T::construct(core, slots)?))
}

struct ClassEntry {
    name: &'static str,
    members: Vec<MemberInfo>,
    factory: Factory,
    hooks: [Option<StageHook>; 8],
    allocated: bool,
    views: Vec<BufferView>,
    accessors: BTreeMap<&'static str, Accessor>,
    // Slot 0 is never populated; sids index directly.
    instances: Vec<Option<Box<dyn Component>>>,
    sid_counter: u32,
}

impl ClassEntry {
    /// Reserve class-wide storage on first use, then stage row `row` of
    /// every member for a new instance. Nothing is claimed until
    /// [`commit_rows`](Self::commit_rows).
    fn submit_to_allocation(
        &mut self,
        memory: &MemoryManager,
        max_entity_count: u32,
        row: usize,
    ) -> Result<MemberSlots, EcsError> {
        if !self.allocated {
            self.allocate(memory, max_entity_count as usize)?;
        }

        let mut slots = MemberSlots::new(self.name);
        for member in &self.members {
            let view = self.accessor(member.name)?.element(row)?;
            if !member.initial.is_empty() {
                view.set_values(&member.initial);
            }
            slots.insert(member.name, view);
        }
        Ok(slots)
    }

    /// Claim the staged rows once the instance has been built.
    fn commit_rows(&self) -> Result<(), EcsError> {
        for member in &self.members {
            self.accessor(member.name)?.take_one()?;
        }
        Ok(())
    }

    fn accessor(&self, member: &'static str) -> Result<&Accessor, EcsError> {
        self.accessors.get(member).ok_or(EcsError::UnknownMember {
            class: self.name,
            member,
        })
    }

    fn allocate(&mut self, memory: &MemoryManager, count: usize) -> Result<(), EcsError> {
        let mut bytes_per_use: BTreeMap<BufferUse, usize> = BTreeMap::new();
        for &buffer_use in &BufferUse::ALL {
            // Walk the members the way the view will lay them out, starting
            // at the buffer's next free byte.
            let start = memory.buffer(buffer_use).used_byte_length();
            let mut cursor = start;
            for member in self.members.iter().filter(|m| m.buffer_use == buffer_use) {
                if member.component.size_in_bytes() == 8 {
                    cursor = cursor.next_multiple_of(8);
                }
                cursor += member.element_size_in_bytes() * count;
            }
            if self.members.iter().any(|m| m.buffer_use == buffer_use) {
                bytes_per_use.insert(buffer_use, cursor - start);
            }
        }

        for (buffer_use, bytes) in bytes_per_use {
            let mut view = memory
                .buffer(buffer_use)
                .take_buffer_view(bytes, 0, BufferLayout::Soa)?
                .with_little_endian(memory.little_endian());
            for member in self.members.iter().filter(|m| m.buffer_use == buffer_use) {
                let accessor = view.take_accessor(member.composition, member.component, count)?;
                self.accessors.insert(member.name, accessor);
            }
            self.views.push(view);
        }
        self.allocated = true;
        tracing::debug!(
            class = self.name,
            members = self.members.len(),
            views = self.views.len(),
            "reserved class storage"
        );
        Ok(())
    }
}

/// Registry of component classes and the owner of every component instance.
pub struct ComponentRepository {
    max_entity_count: u32,
    classes: Vec<Option<ClassEntry>>,
    registration_order: Vec<ComponentTid>,
}

impl ComponentRepository {
    pub fn new(max_entity_count: u32) -> Self {
        Self {
            max_entity_count,
            classes: Vec::new(),
            registration_order: Vec::new(),
        }
    }

    /// Register `T` under `tid`. Chain `on_*` calls on the returned value to
    /// declare which stages the class takes part in.
    pub fn register_component_class<T: ComponentClass>(
        &mut self,
        tid: ComponentTid,
    ) -> Result<ClassRegistration<'_, T>, EcsError> {
        if let Some(existing) = self.entry(tid) {
            return Err(EcsError::DuplicateClass {
                tid,
                name: existing.name,
            });
        }
        if self.classes.len() <= tid.index() {
            self.classes.resize_with(tid.index() + 1, || None);
        }
        self.classes[tid.index()] = Some(ClassEntry {
            name: T::NAME,
            members: T::members(),
            factory: build::<T>,
            hooks: [None; 8],
            allocated: false,
            views: Vec::new(),
            accessors: BTreeMap::new(),
            instances: vec![None],
            sid_counter: 0,
        });
        self.registration_order.push(tid);
        tracing::debug!(%tid, class = T::NAME, "registered component class");

        let entry = self.classes[tid.index()]
            .as_mut()
            .ok_or(EcsError::UnregisteredClass(tid))?;
        Ok(ClassRegistration {
            tid,
            entry,
            _marker: PhantomData,
        })
    }

    /// Instantiate the class registered under `tid` for `entity_uid`.
    pub fn create_component(
        &mut self,
        tid: ComponentTid,
        entity_uid: EntityUid,
        memory: &MemoryManager,
    ) -> Result<ComponentSid, EcsError> {
        let max = self.max_entity_count;
        let entry = self
            .classes
            .get_mut(tid.index())
            .and_then(Option::as_mut)
            .ok_or(EcsError::UnregisteredClass(tid))?;
        if entry.sid_counter >= max {
            return Err(EcsError::CapacityExceeded { tid, max });
        }

        // Sid n always owns row n - 1 of every member accessor.
        let sid = ComponentSid(entry.sid_counter + 1);
        let mut slots = entry.submit_to_allocation(memory, max, entry.sid_counter as usize)?;
        let component = (entry.factory)(ComponentCore::new(tid, sid, entity_uid), &mut slots)?;
        entry.commit_rows()?;
        entry.sid_counter = sid.0;
        entry.instances.push(Some(component));
        tracing::trace!(%tid, %sid, entity = %entity_uid, class = entry.name, "created component");
        Ok(sid)
    }

    pub fn is_registered(&self, tid: ComponentTid) -> bool {
        self.entry(tid).is_some()
    }

    /// Registered tids in registration order.
    pub fn registered_tids(&self) -> &[ComponentTid] {
        &self.registration_order
    }

    pub fn class_name(&self, tid: ComponentTid) -> Option<&'static str> {
        self.entry(tid).map(|e| e.name)
    }

    pub fn members(&self, tid: ComponentTid) -> Option<&[MemberInfo]> {
        self.entry(tid).map(|e| e.members.as_slice())
    }

    /// Class-wide accessor backing `member`, once the class has instances.
    pub fn member_accessor(&self, tid: ComponentTid, member: &str) -> Option<&Accessor> {
        self.entry(tid)?.accessors.get(member)
    }

    /// Buffer views reserved for the class, one per buffer use it declares.
    pub fn class_views(&self, tid: ComponentTid) -> Option<&[BufferView]> {
        self.entry(tid).map(|e| e.views.as_slice())
    }

    pub fn implements_stage(&self, tid: ComponentTid, stage: ProcessStage) -> bool {
        self.stage_hook(tid, stage).is_some()
    }

    pub(crate) fn stage_hook(&self, tid: ComponentTid, stage: ProcessStage) -> Option<StageHook> {
        self.entry(tid)?.hooks[stage.index()]
    }

    /// Number of live instances of `tid`; also the highest issued sid.
    pub fn component_count(&self, tid: ComponentTid) -> usize {
        self.entry(tid).map_or(0, |e| e.sid_counter as usize)
    }

    pub fn get_component(
        &self,
        tid: ComponentTid,
        sid: ComponentSid,
    ) -> Option<&(dyn Component + 'static)> {
        self.entry(tid)?.instances.get(sid.index())?.as_deref()
    }

    pub fn get_component_mut(
        &mut self,
        tid: ComponentTid,
        sid: ComponentSid,
    ) -> Option<&mut (dyn Component + 'static)> {
        let entry = self.classes.get_mut(tid.index())?.as_mut()?;
        entry.instances.get_mut(sid.index())?.as_deref_mut()
    }

    pub fn get_component_as<T: Component>(
        &self,
        tid: ComponentTid,
        sid: ComponentSid,
    ) -> Option<&T> {
        self.get_component(tid, sid)?.downcast_ref::<T>()
    }

    pub fn get_component_as_mut<T: Component>(
        &mut self,
        tid: ComponentTid,
        sid: ComponentSid,
    ) -> Option<&mut T> {
        self.get_component_mut(tid, sid)?.downcast_mut::<T>()
    }

    /// Every instance of `tid` in ascending sid order. Empty if unregistered.
    pub fn get_components_with_type(
        &self,
        tid: ComponentTid,
    ) -> impl Iterator<Item = &(dyn Component + 'static)> + '_ {
        self.entry(tid)
            .into_iter()
            .flat_map(|e| e.instances.iter().filter_map(|slot| slot.as_deref()))
    }

    fn entry(&self, tid: ComponentTid) -> Option<&ClassEntry> {
        self.classes.get(tid.index())?.as_ref()
    }
}

/// Returned by [`ComponentRepository::register_component_class`]; declares
/// the stages `T` participates in.
pub struct ClassRegistration<'a, T> {
    tid: ComponentTid,
    entry: &'a mut ClassEntry,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ComponentClass> ClassRegistration<'_, T> {
    pub fn tid(&self) -> ComponentTid {
        self.tid
    }

    fn hook(self, stage: ProcessStage, hook: StageHook) -> Self {
        self.entry.hooks[stage.index()] = Some(hook);
        self
    }

    pub fn on_create(self) -> Self
    where
        T: OnCreate,
    {
        self.hook(ProcessStage::Create, stage::create_hook::<T>)
    }

    pub fn on_load(self) -> Self
    where
        T: OnLoad,
    {
        self.hook(ProcessStage::Load, stage::load_hook::<T>)
    }

    pub fn on_mount(self) -> Self
    where
        T: OnMount,
    {
        self.hook(ProcessStage::Mount, stage::mount_hook::<T>)
    }

    pub fn on_logic(self) -> Self
    where
        T: OnLogic,
    {
        self.hook(ProcessStage::Logic, stage::logic_hook::<T>)
    }

    pub fn on_pre_render(self) -> Self
    where
        T: OnPreRender,
    {
        self.hook(ProcessStage::PreRender, stage::pre_render_hook::<T>)
    }

    pub fn on_render(self) -> Self
    where
        T: OnRender,
    {
        self.hook(ProcessStage::Render, stage::render_hook::<T>)
    }

    pub fn on_unmount(self) -> Self
    where
        T: OnUnmount,
    {
        self.hook(ProcessStage::Unmount, stage::unmount_hook::<T>)
    }

    pub fn on_discard(self) -> Self
    where
        T: OnDiscard,
    {
        self.hook(ProcessStage::Discard, stage::discard_hook::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_component;
    use crate::stage::StageContext;
    use lattice_common::EngineConfig;
    use lattice_memory::{ComponentType, CompositionType, ElementView};

    struct Gauge {
        core: ComponentCore,
        weight: ElementView,
        offset: ElementView,
    }

    impl_component!(Gauge);

    impl ComponentClass for Gauge {
        const NAME: &'static str = "Gauge";

        fn members() -> Vec<MemberInfo> {
            vec![
                MemberInfo::new(
                    BufferUse::CpuGeneric,
                    "weight",
                    CompositionType::Scalar,
                    ComponentType::Float,
                )
                .with_initial(&[2.5]),
                MemberInfo::new(
                    BufferUse::GpuInstanceData,
                    "offset",
                    CompositionType::Vec3,
                    ComponentType::Double,
                ),
            ]
        }

        fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError> {
            Ok(Self {
                core,
                weight: slots.take("weight")?,
                offset: slots.take("offset")?,
            })
        }
    }

    impl OnLogic for Gauge {
        fn on_logic(&mut self, _ctx: &StageContext) -> Result<(), EcsError> {
            self.weight.set_scalar(self.weight.get_scalar() + 1.0);
            Ok(())
        }
    }

    struct Mixed {
        core: ComponentCore,
        wide: ElementView,
    }

    impl_component!(Mixed);

    impl ComponentClass for Mixed {
        const NAME: &'static str = "Mixed";

        fn members() -> Vec<MemberInfo> {
            let member = |name, component| {
                MemberInfo::new(BufferUse::CpuGeneric, name, CompositionType::Scalar, component)
            };
            vec![
                member("a", ComponentType::Short),
                member("b", ComponentType::Double),
                member("c", ComponentType::Short),
                member("d", ComponentType::Double).with_initial(&[0.25]),
            ]
        }

        fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError> {
            Ok(Self {
                core,
                wide: slots.take("d")?,
            })
        }
    }

    thread_local! {
        static FAIL_NEXT: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
    }

    struct Fragile {
        core: ComponentCore,
        weight: ElementView,
    }

    impl_component!(Fragile);

    impl ComponentClass for Fragile {
        const NAME: &'static str = "Fragile";

        fn members() -> Vec<MemberInfo> {
            vec![MemberInfo::new(
                BufferUse::CpuGeneric,
                "weight",
                CompositionType::Scalar,
                ComponentType::Float,
            )]
        }

        fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError> {
            let weight = slots.take("weight")?;
            if FAIL_NEXT.with(|f| f.replace(false)) {
                return Err(EcsError::UnknownMember {
                    class: Self::NAME,
                    member: "missing",
                });
            }
            Ok(Self { core, weight })
        }
    }

    fn setup(max: u32) -> (ComponentRepository, MemoryManager) {
        let config = EngineConfig {
            buffer_side_length: 16,
            max_entity_count: max,
            ..EngineConfig::default()
        };
        (
            ComponentRepository::new(max),
            MemoryManager::new(&config).unwrap(),
        )
    }

    #[test]
    fn sids_start_at_one_and_increase() {
        let (mut repo, memory) = setup(8);
        let tid = ComponentTid(5);
        repo.register_component_class::<Gauge>(tid).unwrap();
        let a = repo.create_component(tid, EntityUid(1), &memory).unwrap();
        let b = repo.create_component(tid, EntityUid(2), &memory).unwrap();
        assert_eq!(a, ComponentSid(1));
        assert_eq!(b, ComponentSid(2));
        assert_eq!(repo.component_count(tid), 2);
        assert_eq!(repo.get_components_with_type(tid).count(), 2);
        assert!(repo.get_component(tid, ComponentSid(0)).is_none());
    }

    #[test]
    fn storage_is_reserved_once_per_class() {
        let (mut repo, memory) = setup(8);
        let tid = ComponentTid(1);
        repo.register_component_class::<Gauge>(tid).unwrap();
        repo.create_component(tid, EntityUid(1), &memory).unwrap();
        let used = memory.buffer(BufferUse::CpuGeneric).used_byte_length();
        assert_eq!(used, 4 * 8);
        repo.create_component(tid, EntityUid(2), &memory).unwrap();
        assert_eq!(memory.buffer(BufferUse::CpuGeneric).used_byte_length(), used);
        assert_eq!(repo.class_views(tid).unwrap().len(), 2);
        assert_eq!(repo.member_accessor(tid, "weight").unwrap().taken_count(), 2);
    }

    #[test]
    fn rows_are_distinct_and_initialized() {
        let (mut repo, memory) = setup(4);
        let tid = ComponentTid(1);
        repo.register_component_class::<Gauge>(tid).unwrap();
        let a = repo.create_component(tid, EntityUid(1), &memory).unwrap();
        let b = repo.create_component(tid, EntityUid(2), &memory).unwrap();

        let first = repo.get_component_as::<Gauge>(tid, a).unwrap();
        assert_eq!(first.weight.get_scalar(), 2.5);
        first.offset.set_vec3(glam::DVec3::new(1.0, 2.0, 3.0));
        let second = repo.get_component_as::<Gauge>(tid, b).unwrap();
        assert_eq!(second.offset.get_vec3(), glam::DVec3::ZERO);
        assert_eq!(second.offset.byte_offset_in_buffer() % 8, 0);
    }

    #[test]
    fn capacity_is_enforced() {
        let (mut repo, memory) = setup(2);
        let tid = ComponentTid(1);
        repo.register_component_class::<Gauge>(tid).unwrap();
        repo.create_component(tid, EntityUid(1), &memory).unwrap();
        repo.create_component(tid, EntityUid(2), &memory).unwrap();
        let err = repo.create_component(tid, EntityUid(3), &memory).unwrap_err();
        assert!(matches!(err, EcsError::CapacityExceeded { max: 2, .. }));
    }

    #[test]
    fn duplicate_and_unknown_classes() {
        let (mut repo, memory) = setup(2);
        repo.register_component_class::<Gauge>(ComponentTid(1)).unwrap();
        assert!(matches!(
            repo.register_component_class::<Gauge>(ComponentTid(1)),
            Err(EcsError::DuplicateClass { name: "Gauge", .. })
        ));
        assert!(matches!(
            repo.create_component(ComponentTid(9), EntityUid(1), &memory),
            Err(EcsError::UnregisteredClass(ComponentTid(9)))
        ));
        assert_eq!(repo.get_components_with_type(ComponentTid(9)).count(), 0);
        assert_eq!(repo.class_name(ComponentTid(1)), Some("Gauge"));
    }

    #[test]
    fn hooks_are_recorded_per_stage() {
        let (mut repo, _memory) = setup(2);
        let tid = ComponentTid(1);
        let registration = repo.register_component_class::<Gauge>(tid).unwrap().on_logic();
        assert_eq!(registration.tid(), tid);
        assert!(repo.implements_stage(tid, ProcessStage::Logic));
        assert!(!repo.implements_stage(tid, ProcessStage::Render));
        assert_eq!(repo.registered_tids(), &[tid]);
    }

    #[test]
    fn narrow_members_before_doubles_fit_their_view() {
        let (mut repo, memory) = setup(1);
        let tid = ComponentTid(1);
        repo.register_component_class::<Mixed>(tid).unwrap();
        let sid = repo.create_component(tid, EntityUid(1), &memory).unwrap();

        let mixed = repo.get_component_as::<Mixed>(tid, sid).unwrap();
        assert_eq!(mixed.wide.byte_offset_in_buffer() % 8, 0);
        assert_eq!(mixed.wide.get_scalar(), 0.25);
        let view = &repo.class_views(tid).unwrap()[0];
        assert_eq!(view.byte_length(), 32);
        assert_eq!(view.accessors().len(), 4);
    }

    #[test]
    fn failed_construction_does_not_consume_rows() {
        let (mut repo, memory) = setup(2);
        let tid = ComponentTid(1);
        repo.register_component_class::<Fragile>(tid).unwrap();

        FAIL_NEXT.with(|f| f.set(true));
        assert!(repo.create_component(tid, EntityUid(1), &memory).is_err());
        assert_eq!(repo.component_count(tid), 0);
        assert_eq!(repo.member_accessor(tid, "weight").unwrap().taken_count(), 0);

        let a = repo.create_component(tid, EntityUid(2), &memory).unwrap();
        let b = repo.create_component(tid, EntityUid(3), &memory).unwrap();
        assert_eq!((a, b), (ComponentSid(1), ComponentSid(2)));

        let accessor = repo.member_accessor(tid, "weight").unwrap();
        for (sid, row) in [(a, 0), (b, 1)] {
            let fragile = repo.get_component_as::<Fragile>(tid, sid).unwrap();
            assert_eq!(
                fragile.weight.byte_offset_in_buffer(),
                accessor.element(row).unwrap().byte_offset_in_buffer()
            );
        }
        assert_eq!(accessor.taken_count(), 2);
        assert!(matches!(
            repo.create_component(tid, EntityUid(4), &memory),
            Err(EcsError::CapacityExceeded { max: 2, .. })
        ));
    }
}
