//! Entity/component registry and the staged per-frame scheduler.
//!
//! Component data lives in class-shared accessors inside the
//! [`MemoryManager`](lattice_memory::MemoryManager) arenas; each instance
//! owns one claimed row per declared member. A [`World`] threads the arenas,
//! the repositories and the [`System`] scheduler together.
//!
//! # Invariants
//! - Entity uids and per-type component sids are strictly increasing from 1.
//! - Slot 0 of every dense table is never populated.
//! - `System::process` visits stages in [`ProcessStage::ALL`] order and
//!   instances of one type in ascending sid order. Ordering between types
//!   within a stage follows registration order and is not a contract.
//! - Strictly single-threaded; a failing stage hook aborts the frame.

mod component;
mod entity;
mod error;
mod repository;
mod stage;
mod system;
mod world;

pub mod components;

pub use component::{Component, ComponentClass, ComponentCore, MemberInfo, MemberSlots};
pub use entity::{Entity, EntityRepository};
pub use error::EcsError;
pub use repository::{ClassRegistration, ComponentRepository};
pub use stage::{
    InstanceIdProvider, NullInstanceIdProvider, OnCreate, OnDiscard, OnLoad, OnLogic, OnMount,
    OnPreRender, OnRender, OnUnmount, ProcessStage, ResourceHandle, StageContext,
};
pub use system::System;
pub use world::World;

pub fn crate_info() -> &'static str {
    "lattice-ecs v0.1.0"
}
