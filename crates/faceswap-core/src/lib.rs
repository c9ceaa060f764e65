pub mod channel;
pub mod command;
pub mod config;
pub mod error;
pub mod names;
pub mod types;

pub use channel::{ChatOutbound, Upload};
pub use config::FaceswapConfig;
pub use error::{FaceswapError, Result};
pub use names::UploadNamer;
pub use types::{AttachedFile, Command, EventId, InboundEvent, Operation, PlatformEvent};
