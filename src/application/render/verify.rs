use std::path::Path;

use imagesize::ImageError;
use tokio::{fs, io::AsyncReadExt};
use tracing::debug;

use crate::application::artifacts::{bbox_file_name, image_file_name};

use super::RenderError;

const HEADER_PROBE_BYTES: u64 = 4096;

/// Check that every document produced its image and overlay: each file must
/// exist, be non-empty and start with a recognizable image header.
pub async fn verify_outputs<S>(output_dir: &Path, indexes: &[S]) -> Result<(), RenderError>
where
    S: AsRef<str> + Sync,
{
    for index in indexes {
        let index = index.as_ref();
        for name in [image_file_name(index), bbox_file_name(index)] {
            check_artifact(&output_dir.join(name)).await?;
        }
    }
    Ok(())
}

async fn check_artifact(path: &Path) -> Result<(), RenderError> {
    let missing = |reason: String| RenderError::MissingArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let file = fs::File::open(path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            missing("file not found".to_string())
        } else {
            missing(format!("unreadable: {err}"))
        }
    })?;

    let metadata = file
        .metadata()
        .await
        .map_err(|err| missing(format!("unreadable: {err}")))?;
    if !metadata.is_file() {
        return Err(missing("not a regular file".to_string()));
    }
    if metadata.len() == 0 {
        return Err(missing("file is empty".to_string()));
    }

    let mut header = Vec::with_capacity(HEADER_PROBE_BYTES as usize);
    file.take(HEADER_PROBE_BYTES)
        .read_to_end(&mut header)
        .await
        .map_err(|err| missing(format!("unreadable: {err}")))?;

    match imagesize::blob_size(&header) {
        Ok(size) => {
            debug!(
                target = "application::render::verify",
                op = "verify_outputs",
                path = %path.display(),
                width = size.width,
                height = size.height,
                "Render artifact verified"
            );
            Ok(())
        }
        Err(ImageError::NotSupported) => Err(missing("unrecognized image header".to_string())),
        Err(ImageError::CorruptedImage) => Err(missing("corrupted image header".to_string())),
        Err(ImageError::IoError(err)) => Err(missing(format!("unreadable: {err}"))),
    }
}
