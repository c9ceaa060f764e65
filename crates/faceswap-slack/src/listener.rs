//! Socket Mode callbacks: turn Slack pushes into [`PlatformEvent`]s.
//!
//! The callbacks only translate and forward. Handling happens on the other
//! end of the channel, one event at a time.

use std::sync::Arc;

use faceswap_core::{AttachedFile, InboundEvent, PlatformEvent};
use slack_morphism::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Error codes Slack uses when a token is no good.
const AUTH_ERROR_CODES: [&str; 4] = [
    "invalid_auth",
    "not_authed",
    "token_revoked",
    "account_inactive",
];

/// Shared state injected into the Socket Mode listener via `with_user_state`.
#[derive(Clone)]
pub struct ListenerState {
    pub bot_user_id: String,
    pub events: mpsc::Sender<PlatformEvent>,
}

/// The parts of a Slack message event the bot looks at.
#[derive(Debug, Clone, Default)]
pub struct MessageFields {
    pub user: Option<String>,
    pub from_bot: bool,
    pub channel: Option<String>,
    pub text: String,
    pub files: Vec<FileFields>,
}

#[derive(Debug, Clone, Default)]
pub struct FileFields {
    pub url_private_download: Option<String>,
    pub url_private: Option<String>,
    pub filetype: Option<String>,
    pub name: Option<String>,
}

impl MessageFields {
    /// Plain messages and file shares; edits, deletes and joins are dropped.
    pub fn from_event(msg: &SlackMessageEvent) -> Option<Self> {
        match &msg.subtype {
            None | Some(SlackMessageEventType::FileShare) => {}
            Some(_) => return None,
        }

        let content = msg.content.as_ref();
        let files = content
            .and_then(|c| c.files.as_ref())
            .map(|files| {
                files
                    .iter()
                    .map(|f| FileFields {
                        url_private_download: f.url_private_download.as_ref().map(|u| u.to_string()),
                        url_private: f.url_private.as_ref().map(|u| u.to_string()),
                        filetype: f.filetype.as_ref().map(|t| t.0.clone()),
                        name: f.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            user: msg.sender.user.as_ref().map(|u| u.0.clone()),
            from_bot: msg.sender.bot_id.is_some(),
            channel: msg.origin.channel.as_ref().map(|c| c.0.clone()),
            text: content.and_then(|c| c.text.clone()).unwrap_or_default(),
            files,
        })
    }

    /// Build the platform-neutral event. `None` for bot traffic (ours
    /// included) and for messages without a sender or channel.
    pub fn into_inbound(self, bot_user_id: &str) -> Option<InboundEvent> {
        if self.from_bot {
            return None;
        }
        let user = self.user.filter(|u| !u.is_empty())?;
        if user == bot_user_id {
            return None;
        }
        let channel = self.channel.filter(|c| !c.is_empty())?;

        let mut event = InboundEvent::new(user, channel, self.text);
        // Only the first file of a share is processed.
        if let Some(file) = self.files.into_iter().next() {
            if let Some(url) = file.url_private_download.or(file.url_private) {
                event = event.with_file(AttachedFile::new(
                    url,
                    file.filetype.as_deref(),
                    file.name.as_deref(),
                ));
            }
        }
        Some(event)
    }
}

/// True when a Slack error message carries one of the token-rejection codes.
pub fn is_auth_error(message: &str) -> bool {
    AUTH_ERROR_CODES.iter().any(|code| message.contains(code))
}

/// Map a listener error to the event the dispatcher should see.
pub fn classify_error(message: &str) -> PlatformEvent {
    if is_auth_error(message) {
        PlatformEvent::InvalidAuth(message.to_string())
    } else {
        PlatformEvent::ConnectionError(message.to_string())
    }
}

pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = {
        let guard = states.read().await;
        guard
            .get_user_state::<ListenerState>()
            .ok_or("missing listener state")?
            .clone()
    };

    let SlackEventCallbackBody::Message(msg) = event.event else {
        return Ok(());
    };

    let Some(inbound) =
        MessageFields::from_event(&msg).and_then(|fields| fields.into_inbound(&state.bot_user_id))
    else {
        return Ok(());
    };

    debug!(
        event_id = %inbound.id,
        channel = %inbound.channel_id,
        sender = %inbound.sender_id,
        has_file = inbound.attached_file.is_some(),
        "slack message received"
    );

    if state.events.send(PlatformEvent::Message(inbound)).await.is_err() {
        warn!("dispatcher has shut down; dropping slack message");
    }
    Ok(())
}

/// Socket Mode error callback. Runs synchronously, so forwarding is best
/// effort: a busy state lock or a full queue only loses the notification.
pub fn error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> HttpStatusCode {
    let event = classify_error(&err.to_string());
    match &event {
        PlatformEvent::InvalidAuth(reason) => error!(error = %reason, "slack rejected credentials"),
        _ => warn!(error = %err, "slack socket mode error"),
    }

    match states.try_read() {
        Ok(guard) => {
            if let Some(state) = guard.get_user_state::<ListenerState>() {
                if let Err(e) = state.events.try_send(event) {
                    warn!(error = %e, "could not forward socket mode error");
                }
            }
        }
        Err(_) => warn!("listener state busy; socket mode error not forwarded"),
    }

    HttpStatusCode::OK
}
