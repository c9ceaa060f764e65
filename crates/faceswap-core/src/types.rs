use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Image types the face replacer can read.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

/// Whether `ext` (with or without a leading dot, any case) is an accepted image type.
pub fn is_accepted_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.contains(&ext.as_str())
}

/// Opaque per-event identifier, only used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received from the realtime stream, reduced to what the
/// dispatcher needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: EventId,
    /// Platform user id of the author.
    pub sender_id: String,
    /// Raw message text, mentions included.
    pub text: String,
    pub channel_id: String,
    /// Present only for file shares.
    pub attached_file: Option<AttachedFile>,
}

impl InboundEvent {
    pub fn new(sender_id: impl Into<String>, channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            sender_id: sender_id.into(),
            text: text.into(),
            channel_id: channel_id.into(),
            attached_file: None,
        }
    }

    pub fn with_file(mut self, file: AttachedFile) -> Self {
        self.attached_file = Some(file);
        self
    }
}

/// File-share metadata carried by an [`InboundEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedFile {
    /// Private download URL; requires the bot token as a bearer credential.
    pub download_url: String,
    /// Lowercase extension without the dot, as declared by the platform.
    pub declared_extension: String,
    /// Original file name, for log context only.
    pub name: Option<String>,
}

impl AttachedFile {
    /// Build from platform metadata, preferring the declared file type and
    /// falling back to the file name's suffix.
    pub fn new(download_url: impl Into<String>, filetype: Option<&str>, name: Option<&str>) -> Self {
        let declared_extension = filetype
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| name.and_then(|n| n.rsplit_once('.')).map(|(_, ext)| ext.to_string()))
            .unwrap_or_default()
            .to_ascii_lowercase();

        Self {
            download_url: download_url.into(),
            declared_extension,
            name: name.map(str::to_string),
        }
    }

    pub fn is_accepted(&self) -> bool {
        is_accepted_extension(&self.declared_extension)
    }
}

/// Image effect requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Replace detected faces; the tool photobombs when it finds none.
    SwapFaces,
    /// Paste a random body regardless of detected faces.
    PhotoBomb,
    /// Photobomb with the single configured success image.
    Success,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::SwapFaces => "swap_faces",
            Operation::PhotoBomb => "photo_bomb",
            Operation::Success => "success",
        };
        f.write_str(name)
    }
}

/// Classified user command: which operation, and whether the output is
/// monochrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub operation: Operation,
    pub monochrome: bool,
}

impl Command {
    pub const fn new(operation: Operation, monochrome: bool) -> Self {
        Self { operation, monochrome }
    }
}

/// Everything the realtime stream can hand the dispatcher.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    Message(InboundEvent),
    /// Transport trouble the connection keeper will recover from.
    ConnectionError(String),
    /// Credentials were rejected; the process cannot continue.
    InvalidAuth(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_ignore_case_and_dot() {
        assert!(is_accepted_extension("jpg"));
        assert!(is_accepted_extension("PNG"));
        assert!(is_accepted_extension(".gif"));
        assert!(!is_accepted_extension("bmp"));
        assert!(!is_accepted_extension("jpeg"));
        assert!(!is_accepted_extension(""));
    }

    #[test]
    fn attached_file_prefers_declared_type() {
        let f = AttachedFile::new("https://files/x", Some("PNG"), Some("cat.jpg"));
        assert_eq!(f.declared_extension, "png");
        assert!(f.is_accepted());
    }

    #[test]
    fn attached_file_falls_back_to_name_suffix() {
        let f = AttachedFile::new("https://files/x", None, Some("holiday.photo.GIF"));
        assert_eq!(f.declared_extension, "gif");

        let f = AttachedFile::new("https://files/x", Some(""), Some("noext"));
        assert_eq!(f.declared_extension, "");
        assert!(!f.is_accepted());
    }

    #[test]
    fn event_ids_are_unique() {
        let a = InboundEvent::new("U1", "C1", "hi");
        let b = InboundEvent::new("U1", "C1", "hi");
        assert_ne!(a.id, b.id);
    }
}
