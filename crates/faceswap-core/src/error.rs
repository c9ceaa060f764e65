use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceswapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Download failed: {0}")]
    Fetch(String),

    #[error("Could not persist temp file: {0}")]
    Persist(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FaceswapError {
    /// Short error code string used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            FaceswapError::Config(_) => "CONFIG_ERROR",
            FaceswapError::AuthFailed(_) => "AUTH_FAILED",
            FaceswapError::Fetch(_) => "FETCH_ERROR",
            FaceswapError::Persist(_) => "PERSIST_ERROR",
            FaceswapError::Transform(_) => "TRANSFORM_ERROR",
            FaceswapError::Upload(_) => "UPLOAD_ERROR",
            FaceswapError::Channel { .. } => "CHANNEL_ERROR",
            FaceswapError::Io(_) => "IO_ERROR",
        }
    }

    /// Fatal errors stop the process; everything else only aborts one event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FaceswapError::Config(_) | FaceswapError::AuthFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, FaceswapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_config_and_auth_are_fatal() {
        assert!(FaceswapError::Config("x".into()).is_fatal());
        assert!(FaceswapError::AuthFailed("x".into()).is_fatal());
        assert!(!FaceswapError::Fetch("x".into()).is_fatal());
        assert!(!FaceswapError::Transform("x".into()).is_fatal());
        assert!(!FaceswapError::Upload("x".into()).is_fatal());
    }

    #[test]
    fn io_errors_convert() {
        let err: FaceswapError = std::io::Error::other("disk full").into();
        assert_eq!(err.code(), "IO_ERROR");
        assert!(err.to_string().contains("disk full"));
    }
}
