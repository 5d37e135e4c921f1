//! Application services layer.

pub mod artifacts;
pub mod catalog;
pub mod error;
pub mod generation;
pub mod render;
pub mod repos;
