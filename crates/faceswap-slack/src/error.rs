use faceswap_core::FaceswapError;

/// Errors produced by the Slack adapter.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("slack client error: {0}")]
    Client(String),

    /// Slack rejected the bot or app token.
    #[error("slack rejected credentials: {0}")]
    InvalidAuth(String),

    #[error("socket mode error: {0}")]
    Socket(String),

    #[error("{method}: {reason}")]
    Api { method: &'static str, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<SlackError> for FaceswapError {
    fn from(e: SlackError) -> Self {
        match e {
            SlackError::InvalidAuth(m) => FaceswapError::AuthFailed(m),
            other => FaceswapError::Channel {
                channel: "slack".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SlackError>;
