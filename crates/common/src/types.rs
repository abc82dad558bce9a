use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of an entity. Handed out sequentially starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityUid(pub u32);

impl EntityUid {
    /// Never assigned to a live entity.
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Position of this entity in dense per-entity tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Component type id: identifies one kind of component (Transform, Mesh, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTid(pub u32);

impl ComponentTid {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tid#{}", self.0)
    }
}

/// Per-type sequential id of a component instance. Starts at 1 for each type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentSid(pub u32);

impl ComponentSid {
    /// Slot 0 of every dense table is reserved, so 0 doubles as the
    /// terminator of stage index arrays.
    pub const INVALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the first instance of a component type.
    pub fn is_first(self) -> bool {
        self.0 <= 1
    }
}

impl fmt::Display for ComponentSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sid#{}", self.0)
    }
}
