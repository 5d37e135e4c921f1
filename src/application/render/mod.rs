//! Supervised execution of the external renderer.

mod invoker;
mod pool;
mod verify;

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

pub use invoker::{RenderCommand, RenderInvoker, RenderOutput};
pub use pool::{Admission, RenderPool, RunningSlot};
pub use verify::verify_outputs;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer program `{}` not found", .program.display())]
    ProgramNotFound {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn renderer")]
    Spawn(#[source] std::io::Error),
    #[error("failed to collect renderer output")]
    Wait(#[source] std::io::Error),
    #[error("process exited with {}\n{stderr}", exit_label(.exit_code))]
    Exited {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("renderer timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },
    #[error("renderer did not produce `{}`: {reason}", .path.display())]
    MissingArtifact { path: PathBuf, reason: String },
    #[error("render pool is full ({capacity} requests admitted)")]
    Saturated { capacity: usize },
    #[error("render pool is shut down")]
    PoolClosed,
}

impl RenderError {
    /// Stable label used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            RenderError::ProgramNotFound { .. } => "program_not_found",
            RenderError::Spawn(_) => "spawn",
            RenderError::Wait(_) => "wait",
            RenderError::Exited { .. } => "exited",
            RenderError::Timeout { .. } => "timeout",
            RenderError::MissingArtifact { .. } => "missing_artifact",
            RenderError::Saturated { .. } => "saturated",
            RenderError::PoolClosed => "pool_closed",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
