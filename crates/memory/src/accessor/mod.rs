//! Typed, strided windows into buffer views.
//!
//! [`AccessorBase`] owns placement, bounds and encoding. [`Accessor`] adds
//! the fixed-shape scalar/vector/matrix API, [`FlexibleAccessor`] a
//! shape-agnostic one. [`ElementView`] is a single claimed row.

mod base;
mod element;
mod flexible;
mod typed;

pub use base::AccessorBase;
pub use element::ElementView;
pub use flexible::FlexibleAccessor;
pub use typed::{Accessor, TypedElement};
