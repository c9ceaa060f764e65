//! The image transform seam and its subprocess implementation.
//!
//! The face replacer is an external script:
//!
//! ```text
//! <interpreter> <script> <input> -f <faces> -b <bodies|success> [-p] [-bw] -o <output>
//! ```
//!
//! It exits 0 and writes `<output>` on success. It cannot write GIFs, so GIF
//! input is turned into PNG output.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use faceswap_core::config::TransformConfig;
use faceswap_core::{Command, Operation};
use tracing::{debug, info, warn};

use crate::error::{Result, TransformError};
use crate::temp::{TempFileHandle, TempFileStore};

/// Keep this many characters of stderr in errors and logs.
const STDERR_MAX_CHARS: usize = 2_000;

/// Reference images the tool composites onto the input.
#[derive(Debug, Clone, Default)]
pub struct ReferencePaths {
    pub faces: PathBuf,
    pub bodies: PathBuf,
    pub success: PathBuf,
}

impl ReferencePaths {
    pub fn from_config(config: &TransformConfig) -> Self {
        Self {
            faces: PathBuf::from(&config.faces_path),
            bodies: PathBuf::from(&config.bodies_path),
            success: PathBuf::from(&config.success_path),
        }
    }
}

/// One invocation of the transform. Built fresh per event, never mutated.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub input_path: PathBuf,
    pub command: Command,
    pub faces_path: PathBuf,
    /// Bodies directory, or the success image for [`Operation::Success`].
    pub body_path: PathBuf,
}

impl TransformRequest {
    pub fn new(input_path: &Path, command: Command, refs: &ReferencePaths) -> Self {
        let body_path = match command.operation {
            Operation::SwapFaces | Operation::PhotoBomb => refs.bodies.clone(),
            Operation::Success => refs.success.clone(),
        };
        Self {
            input_path: input_path.to_path_buf(),
            command,
            faces_path: refs.faces.clone(),
            body_path,
        }
    }

    /// Success is a photobomb with a single body image.
    pub fn photobomb(&self) -> bool {
        matches!(
            self.command.operation,
            Operation::PhotoBomb | Operation::Success
        )
    }

    /// Extension the output must carry: the input's, except GIF becomes PNG.
    pub fn output_extension(&self) -> Result<String> {
        let ext = self
            .input_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                TransformError::InvalidRequest(format!(
                    "input {} has no extension",
                    self.input_path.display()
                ))
            })?;
        Ok(if ext == "gif" { "png".to_string() } else { ext })
    }

    /// Script arguments (everything after the script path).
    pub fn args(&self, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.input_path.clone().into(),
            "-f".into(),
            self.faces_path.clone().into(),
            "-b".into(),
            self.body_path.clone().into(),
        ];
        if self.photobomb() {
            args.push("-p".into());
        }
        if self.command.monochrome {
            args.push("-bw".into());
        }
        args.push("-o".into());
        args.push(output_path.into());
        args
    }
}

/// Anything that can turn an input image into a result image.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Run the transform; the returned handle owns the output file.
    async fn invoke(&self, request: &TransformRequest) -> Result<TempFileHandle>;
}

/// Runs the face replacer as a child process with a timeout.
pub struct ScriptTransformer {
    interpreter: String,
    script: String,
    timeout: Duration,
    store: TempFileStore,
}

impl ScriptTransformer {
    pub fn new(config: &TransformConfig, store: TempFileStore) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script: config.script.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            store,
        }
    }

    fn command(&self, request: &TransformRequest, output: &Path) -> tokio::process::Command {
        let mut cmd = if self.interpreter.trim().is_empty() {
            tokio::process::Command::new(&self.script)
        } else {
            let mut cmd = tokio::process::Command::new(&self.interpreter);
            cmd.arg(&self.script);
            cmd
        };
        cmd.args(request.args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, request: &TransformRequest, output: &TempFileHandle) -> Result<()> {
        let child = self.command(request, output.path()).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransformError::Spawn(format!("'{}' not found", self.program()))
            } else {
                TransformError::Spawn(format!("failed to spawn '{}': {e}", self.program()))
            }
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output_res = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(TransformError::Io)?,
            Err(_elapsed) => {
                return Err(TransformError::Timeout {
                    secs: self.timeout.as_secs(),
                }
                .into())
            }
        };

        let stderr = truncate_middle(&String::from_utf8_lossy(&output_res.stderr), STDERR_MAX_CHARS);
        if !output_res.status.success() {
            let code = output_res.status.code().unwrap_or(-1);
            warn!(code, stderr = %stderr, "face replacer failed");
            return Err(TransformError::NonZeroExit { code, stderr }.into());
        }

        debug!(
            stdout = %String::from_utf8_lossy(&output_res.stdout).trim(),
            "face replacer finished"
        );

        if !output.path().is_file() {
            return Err(TransformError::MissingOutput {
                path: output.path().display().to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn program(&self) -> &str {
        if self.interpreter.trim().is_empty() {
            &self.script
        } else {
            &self.interpreter
        }
    }
}

#[async_trait]
impl Transformer for ScriptTransformer {
    async fn invoke(&self, request: &TransformRequest) -> Result<TempFileHandle> {
        let extension = request.output_extension()?;
        let mut output = self.store.reserve(&extension)?;

        info!(
            operation = %request.command.operation,
            monochrome = request.command.monochrome,
            input = %request.input_path.display(),
            output = %output.path().display(),
            "running face replacer"
        );

        match self.run(request, &output).await {
            Ok(()) => Ok(output),
            Err(e) => {
                output.release();
                Err(e)
            }
        }
    }
}

/// Keep the head and tail of long output.
fn truncate_middle(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    let total = s.chars().count();
    if total <= max_chars {
        return s.to_string();
    }
    let half = max_chars / 2;
    let head: String = s.chars().take(half).collect();
    let tail: String = s.chars().skip(total - half).collect();
    format!("{head}\n... [{} chars omitted] ...\n{tail}", total - max_chars)
}
