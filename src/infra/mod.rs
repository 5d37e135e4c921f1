//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod bootstrap;
pub mod catalog;
pub mod error;
pub mod http;
pub(crate) mod lock;
pub mod staging;
pub mod telemetry;
