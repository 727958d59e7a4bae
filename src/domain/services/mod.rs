//! Domain Services
//!
//! Stateless business rules operating on domain entities.

pub mod invalidation;

pub use invalidation::{cascade_groups, check, is_dirty, propagate, propagate_to_fixpoint};
