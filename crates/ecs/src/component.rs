//! Component instances, their shared core and class-level member declarations.

use std::any::Any;
use std::collections::BTreeMap;

use lattice_common::{ComponentSid, ComponentTid, EntityUid};
use lattice_memory::{BufferUse, ComponentType, CompositionType, ElementView};

use crate::error::EcsError;
use crate::stage::ProcessStage;

/// Identity and lifecycle state every component carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentCore {
    tid: ComponentTid,
    sid: ComponentSid,
    entity_uid: EntityUid,
    current_stage: ProcessStage,
}

impl ComponentCore {
    pub fn new(tid: ComponentTid, sid: ComponentSid, entity_uid: EntityUid) -> Self {
        Self {
            tid,
            sid,
            entity_uid,
            current_stage: ProcessStage::Create,
        }
    }

    pub fn tid(&self) -> ComponentTid {
        self.tid
    }

    pub fn sid(&self) -> ComponentSid {
        self.sid
    }

    pub fn entity_uid(&self) -> EntityUid {
        self.entity_uid
    }

    pub fn current_stage(&self) -> ProcessStage {
        self.current_stage
    }

    /// Request a stage transition. The scheduler notices the change after
    /// the running hook returns and refreshes its stage indices.
    pub fn move_stage_to(&mut self, stage: ProcessStage) {
        if stage != self.current_stage {
            tracing::trace!(
                tid = %self.tid,
                sid = %self.sid,
                from = ?self.current_stage,
                to = ?stage,
                "stage change requested"
            );
            self.current_stage = stage;
        }
    }
}

/// A stored component instance.
pub trait Component: Any {
    fn core(&self) -> &ComponentCore;
    fn core_mut(&mut self) -> &mut ComponentCore;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Component {
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Implements the [`Component`] plumbing for a struct with a `core` field.
#[macro_export]
macro_rules! impl_component {
    ($ty:ty) => {
        impl $crate::Component for $ty {
            fn core(&self) -> &$crate::ComponentCore {
                &self.core
            }
            fn core_mut(&mut self) -> &mut $crate::ComponentCore {
                &mut self.core
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

/// A member stored in arena memory, declared once per class.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub buffer_use: BufferUse,
    pub name: &'static str,
    pub composition: CompositionType,
    pub component: ComponentType,
    pub initial: Vec<f64>,
}

impl MemberInfo {
    pub fn new(
        buffer_use: BufferUse,
        name: &'static str,
        composition: CompositionType,
        component: ComponentType,
    ) -> Self {
        Self {
            buffer_use,
            name,
            composition,
            component,
            initial: Vec::new(),
        }
    }

    /// Values written into every freshly claimed row.
    pub fn with_initial(mut self, values: &[f64]) -> Self {
        self.initial = values.to_vec();
        self
    }

    pub fn element_size_in_bytes(&self) -> usize {
        self.composition.number_of_components() * self.component.size_in_bytes()
    }
}

/// The rows claimed for one new instance, keyed by member name.
#[derive(Debug, Default)]
pub struct MemberSlots {
    class: &'static str,
    views: BTreeMap<&'static str, ElementView>,
}

impl MemberSlots {
    pub(crate) fn new(class: &'static str) -> Self {
        Self {
            class,
            views: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, view: ElementView) {
        self.views.insert(name, view);
    }

    /// Move the row for `name` out of the slot set.
    pub fn take(&mut self, name: &'static str) -> Result<ElementView, EcsError> {
        self.views.remove(name).ok_or(EcsError::UnknownMember {
            class: self.class,
            member: name,
        })
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// A concrete component type that can be registered and instantiated.
pub trait ComponentClass: Component + Sized {
    const NAME: &'static str;

    /// Members backed by arena memory. Defaults to none.
    fn members() -> Vec<MemberInfo> {
        Vec::new()
    }

    /// Build an instance from its core and its claimed member rows.
    fn construct(core: ComponentCore, slots: &mut MemberSlots) -> Result<Self, EcsError>;
}
