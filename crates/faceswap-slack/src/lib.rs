pub mod adapter;
pub mod error;
pub mod listener;
pub mod outbound;

pub use adapter::{event_channel, SlackAdapter};
pub use error::SlackError;
pub use outbound::SlackOutbound;
