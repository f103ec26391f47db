//! External process execution under an `OpContext`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use contracts::{EngineError, OpContext, OperationKind};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Runs one backend binary
///
/// The child is spawned with `kill_on_drop`, so abandoning the run (the
/// context firing, or the attempt being dropped) also kills the process.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    engine: String,
    program: PathBuf,
}

impl CommandRunner {
    pub fn new(engine: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the binary with `args` and wait for it to exit
    ///
    /// # Errors
    /// - [`EngineError::Cancelled`] when `ctx` fires first
    /// - [`EngineError::Process`] on a non-zero exit (stderr attached)
    /// - [`EngineError::Backend`] when the binary cannot be started
    #[instrument(
        name = "engine_command_run",
        skip(self, ctx, args),
        fields(engine = %self.engine, operation = %operation, program = %self.program.display())
    )]
    pub async fn run(
        &self,
        ctx: &OpContext,
        operation: OperationKind,
        args: &[OsString],
    ) -> Result<(), EngineError> {
        if let Some(reason) = ctx.cancel_reason() {
            return Err(EngineError::cancelled(operation, reason));
        }

        debug!(?args, "starting process");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::backend(
                    &self.engine,
                    operation,
                    format!("failed to start '{}': {e}", self.program.display()),
                )
            })?;

        let output = tokio::select! {
            biased;
            reason = ctx.done() => {
                warn!(%reason, "context done, killing process");
                return Err(EngineError::cancelled(operation, reason));
            }
            output = child.wait_with_output() => output?,
        };

        if output.status.success() {
            debug!("process exited successfully");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(status = %output.status, %stderr, "process failed");
        Err(EngineError::Process {
            engine: self.engine.clone(),
            operation,
            program: self.program.display().to_string(),
            status: output.status.to_string(),
            stderr,
        })
    }
}

/// Strip `extension` from `path` when present
///
/// pdftocairo appends the extension itself in `-singlefile` mode.
pub(crate) fn strip_extension(path: &Path, extension: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case(extension) => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}
