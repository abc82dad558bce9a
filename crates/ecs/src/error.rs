use lattice_common::{ComponentSid, ComponentTid, EntityUid};
use lattice_memory::MemoryError;

use crate::stage::ProcessStage;

/// Errors from the registry, the repositories and the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("component class {0} is not registered")]
    UnregisteredClass(ComponentTid),
    #[error("component class {tid} is already registered as '{name}'")]
    DuplicateClass { tid: ComponentTid, name: &'static str },
    #[error("component class {tid} is full ({max} instances)")]
    CapacityExceeded { tid: ComponentTid, max: u32 },
    #[error("entity capacity of {0} reached")]
    EntityCapacityExceeded(u32),
    #[error("member '{member}' is not declared by {class}")]
    UnknownMember {
        class: &'static str,
        member: &'static str,
    },
    #[error("attribute '{semantic}' holds {found} vertices, expected {expected}")]
    VertexCountMismatch {
        semantic: String,
        expected: usize,
        found: usize,
    },
    #[error("{child} cannot be parented to {parent}: {reason}")]
    InvalidHierarchy {
        parent: EntityUid,
        child: EntityUid,
        reason: &'static str,
    },
    #[error("{entity} has no component {tid}")]
    MissingComponent { entity: EntityUid, tid: ComponentTid },
    #[error("component {tid}/{sid} is not a {expected}")]
    TypeMismatch {
        tid: ComponentTid,
        sid: ComponentSid,
        expected: &'static str,
    },
    #[error("no instance-id buffer handle during {0:?}")]
    MissingInstanceIds(ProcessStage),
    #[error("{stage:?} failed for {entity}: {message}")]
    StageFailed {
        stage: ProcessStage,
        entity: EntityUid,
        message: String,
    },
    #[error("instance-id provider failed: {0}")]
    Provider(String),
}
