//! Domain layer types and invariants.

pub mod catalog;
pub mod error;
pub mod layout;
pub mod validation;
