//! Error types for the faceswap-media crate.

use faceswap_core::FaceswapError;
use thiserror::Error;

/// All errors that can originate from fetching, storing or transforming images.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The remote file could not be downloaded.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Writing, renaming or reserving a scratch file failed.
    #[error("persist error: {0}")]
    Persist(String),

    /// The external transform did not produce an image.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
}

/// Ways the external face replacer can fail.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The executable could not be started at all.
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// The executable ran and exited unsuccessfully.
    #[error("exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    /// Exit code 0, but nothing was written at the output path.
    #[error("no output written to {path}")]
    MissingOutput { path: String },

    /// Operation exceeded its time budget and the child was killed.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Arguments or paths could not be built for this request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying I/O failure while waiting for the child.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for FaceswapError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Fetch(m) => FaceswapError::Fetch(m),
            MediaError::Persist(m) => FaceswapError::Persist(m),
            MediaError::Transform(t) => FaceswapError::Transform(t.to_string()),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, MediaError>;
