use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use metrics::{counter, histogram};
use tokio::process::Command;
use tracing::{info, warn};

use crate::{
    config::RenderSettings,
    domain::layout::GenerationCategory,
    infra::telemetry::{RENDER_DURATION_MS, RENDER_FAILED_TOTAL, RENDER_STARTED_TOTAL},
};

use super::RenderError;

const SOURCE: &str = "application::render::invoker";

/// How to launch the renderer: `program [script] <flag> <checkpoint>
/// --config <path> --output_dir <dir>`.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    pub program: PathBuf,
    pub script: Option<PathBuf>,
    pub checkpoint_flag: String,
    pub slide_checkpoint: String,
    pub infographic_checkpoint: String,
    pub timeout: Duration,
}

impl RenderCommand {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            program: settings.program.clone(),
            script: settings.script.clone(),
            checkpoint_flag: settings.checkpoint_flag.clone(),
            slide_checkpoint: settings.slide_checkpoint.clone(),
            infographic_checkpoint: settings.infographic_checkpoint.clone(),
            timeout: settings.timeout,
        }
    }

    pub fn checkpoint(&self, category: GenerationCategory) -> &str {
        match category {
            GenerationCategory::Slide => &self.slide_checkpoint,
            GenerationCategory::Infographic => &self.infographic_checkpoint,
        }
    }

    pub fn args(
        &self,
        category: GenerationCategory,
        config_path: &Path,
        output_dir: &Path,
    ) -> Vec<OsString> {
        let mut args = Vec::with_capacity(7);
        if let Some(script) = self.script.as_ref() {
            args.push(script.clone().into_os_string());
        }
        args.push(self.checkpoint_flag.clone().into());
        args.push(self.checkpoint(category).into());
        args.push("--config".into());
        args.push(config_path.as_os_str().to_owned());
        args.push("--output_dir".into());
        args.push(output_dir.as_os_str().to_owned());
        args
    }
}

/// Captured streams of a successful render. Stdout is diagnostic text only.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct RenderInvoker {
    command: RenderCommand,
}

impl RenderInvoker {
    pub fn new(command: RenderCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &RenderCommand {
        &self.command
    }

    /// Run the renderer to completion. Success is decided by the exit status
    /// alone; both streams are drained concurrently while the child runs. The
    /// child is killed if the timeout fires or the returned future is dropped.
    pub async fn invoke(
        &self,
        config_path: &Path,
        output_dir: &Path,
        category: GenerationCategory,
    ) -> Result<RenderOutput, RenderError> {
        let started_at = Instant::now();
        let checkpoint = self.command.checkpoint(category);

        let child = Command::new(&self.command.program)
            .args(self.command.args(category, config_path, output_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(
                    target = SOURCE,
                    op = "render::invoke",
                    result = "error",
                    error_code = "spawn",
                    program = %self.command.program.display(),
                    error = %err,
                    "Failed to spawn renderer"
                );
                counter!(RENDER_FAILED_TOTAL, "reason" => "spawn").increment(1);
                if err.kind() == ErrorKind::NotFound {
                    RenderError::ProgramNotFound {
                        program: self.command.program.clone(),
                        source: err,
                    }
                } else {
                    RenderError::Spawn(err)
                }
            })?;

        counter!(RENDER_STARTED_TOTAL, "category" => category.as_str()).increment(1);
        info!(
            target = SOURCE,
            op = "render::invoke",
            result = "started",
            category = category.as_str(),
            checkpoint,
            config_path = %config_path.display(),
            output_dir = %output_dir.display(),
            "Renderer started"
        );

        let waited = tokio::time::timeout(self.command.timeout, child.wait_with_output()).await;
        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                counter!(RENDER_FAILED_TOTAL, "reason" => "wait").increment(1);
                return Err(RenderError::Wait(err));
            }
            Err(_) => {
                warn!(
                    target = SOURCE,
                    op = "render::invoke",
                    result = "error",
                    error_code = "timeout",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    category = category.as_str(),
                    "Renderer timed out; child killed"
                );
                counter!(RENDER_FAILED_TOTAL, "reason" => "timeout").increment(1);
                return Err(RenderError::Timeout {
                    after: self.command.timeout,
                });
            }
        };

        let elapsed = started_at.elapsed();
        histogram!(RENDER_DURATION_MS, "category" => category.as_str())
            .record(elapsed.as_millis() as f64);

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let exit_code = output.status.code();
            warn!(
                target = SOURCE,
                op = "render::invoke",
                result = "error",
                error_code = "exited",
                elapsed_ms = elapsed.as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                stderr = %stderr,
                "Renderer exited unsuccessfully"
            );
            counter!(RENDER_FAILED_TOTAL, "reason" => "exited").increment(1);
            return Err(RenderError::Exited { exit_code, stderr });
        }

        info!(
            target = SOURCE,
            op = "render::invoke",
            result = "ok",
            elapsed_ms = elapsed.as_millis() as u64,
            category = category.as_str(),
            stdout_bytes = stdout.len(),
            "Renderer finished"
        );

        Ok(RenderOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}
