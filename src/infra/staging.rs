//! Request-scoped staging of renderer inputs and output directories.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::layout::LayoutDocument;

const SOURCE: &str = "infra::staging";
const MAX_ALLOCATION_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to {op} `{}`", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize staged documents")]
    Serialize(#[from] serde_json::Error),
    #[error("could not claim an unused request id after {attempts} attempts")]
    Exhausted { attempts: usize },
}

impl StagingError {
    fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Identifier of one staged request: milliseconds since the Unix epoch,
/// bumped past the previous allocation so it never repeats in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse().map(Self)
    }
}

/// Lock-free, strictly increasing id source.
#[derive(Debug, Default)]
pub struct RequestIdAllocator {
    last: AtomicU64,
}

impl RequestIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> RequestId {
        let now = now_millis();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current.saturating_add(1));
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return RequestId(candidate),
                Err(observed) => current = observed,
            }
        }
    }
}

fn now_millis() -> u64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or_default()
}

/// A persisted config file plus the empty directory the renderer writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRequest {
    pub id: RequestId,
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Filesystem-backed staging area.
#[derive(Debug)]
pub struct StagingStore {
    config_root: PathBuf,
    output_root: PathBuf,
    ids: RequestIdAllocator,
}

impl StagingStore {
    /// Initialise the store, creating both roots if necessary.
    pub fn new(config_root: PathBuf, output_root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&config_root)?;
        std::fs::create_dir_all(&output_root)?;
        Ok(Self {
            config_root,
            output_root,
            ids: RequestIdAllocator::new(),
        })
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Persist `documents` as the renderer's input and claim a fresh output
    /// directory. Either both exist afterwards or neither does.
    pub async fn stage(&self, documents: &[LayoutDocument]) -> Result<StagedRequest, StagingError> {
        let payload = serde_json::to_vec_pretty(documents)?;
        let (id, output_dir) = self.claim_output_dir().await?;

        let config_path = self.config_root.join(format!("{id}.json"));
        let partial_path = self.config_root.join(format!("{id}.json.partial"));

        if let Err(err) = write_config(&partial_path, &config_path, &payload).await {
            let _ = fs::remove_file(&partial_path).await;
            if let Err(cleanup) = fs::remove_dir_all(&output_dir).await {
                warn!(
                    target = SOURCE,
                    op = "stage",
                    result = "rollback_failed",
                    request_id = %id,
                    error = %cleanup,
                    "Failed to remove output directory after staging error"
                );
            }
            return Err(err);
        }

        debug!(
            target = SOURCE,
            op = "stage",
            result = "ok",
            request_id = %id,
            documents = documents.len(),
            config_path = %config_path.display(),
            "Staged generation request"
        );

        Ok(StagedRequest {
            id,
            config_path,
            output_dir,
        })
    }

    async fn claim_output_dir(&self) -> Result<(RequestId, PathBuf), StagingError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let id = self.ids.allocate();
            let output_dir = self.output_root.join(id.to_string());
            match fs::create_dir(&output_dir).await {
                Ok(()) => return Ok((id, output_dir)),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(
                        target = SOURCE,
                        op = "claim_output_dir",
                        result = "collision",
                        request_id = %id,
                        attempt,
                        "Output directory already exists; allocating another id"
                    );
                }
                Err(err) => return Err(StagingError::io("create directory", &output_dir, err)),
            }
        }

        Err(StagingError::Exhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }
}

async fn write_config(partial: &Path, target: &Path, payload: &[u8]) -> Result<(), StagingError> {
    fs::write(partial, payload)
        .await
        .map_err(|err| StagingError::io("write", partial, err))?;
    fs::rename(partial, target)
        .await
        .map_err(|err| StagingError::io("rename", partial, err))
}
