use async_trait::async_trait;

use crate::error::Result;

/// A file ready to be posted back to a channel.
#[derive(Debug, Clone)]
pub struct Upload {
    pub channel_id: String,
    pub file_name: String,
    pub title: String,
    pub bytes: Vec<u8>,
}

/// Outbound half of a chat platform: the two calls the bot makes.
///
/// Implementations must be `Send + Sync` so the dispatcher can hold them
/// behind an `Arc` and tests can swap in a recording fake.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    /// Stable lowercase identifier for the platform (e.g. `"slack"`).
    fn name(&self) -> &str;

    /// Post a plain text message to `channel_id`.
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<()>;

    /// Upload a file into a channel.
    async fn upload_file(&self, upload: Upload) -> Result<()>;
}
