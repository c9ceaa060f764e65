//! Slack channel adapter.
//!
//! Authenticates the bot token, then drives a Socket Mode listener that
//! feeds [`PlatformEvent`]s into a channel. slack-morphism reconnects the
//! socket on its own when it drops.

use std::sync::Arc;

use faceswap_core::config::SlackConfig;
use faceswap_core::PlatformEvent;
use slack_morphism::prelude::*;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{Result, SlackError};
use crate::listener::{error_handler, handle_push_event, is_auth_error, ListenerState};
use crate::outbound::SlackOutbound;

/// Events buffered between the socket and the dispatcher.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

pub struct SlackAdapter {
    client: Arc<SlackHyperClient>,
    config: SlackConfig,
    bot_user_id: String,
}

impl SlackAdapter {
    /// Build the client and check the bot token with `auth.test`.
    pub async fn connect(config: &SlackConfig) -> Result<Self> {
        let connector =
            SlackClientHyperConnector::new().map_err(|e| SlackError::Client(e.to_string()))?;
        let client = Arc::new(SlackClient::new(connector));

        let token = SlackApiToken::new(config.bot_token.clone().into());
        let auth = client
            .open_session(&token)
            .auth_test()
            .await
            .map_err(|e| startup_error(e.to_string()))?;

        let bot_user_id = auth.user_id.to_string();
        info!(bot_user = ?auth.user, bot_user_id = %bot_user_id, "slack bot authenticated");

        Ok(Self {
            client,
            config: config.clone(),
            bot_user_id,
        })
    }

    /// The bot's own user id, as it appears in `<@…>` mentions.
    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    pub fn outbound(&self) -> SlackOutbound {
        SlackOutbound::new(
            Arc::clone(&self.client),
            &self.config.bot_token,
            &self.config.api_base,
        )
    }

    /// Open the Socket Mode connection and forward events to `events`.
    ///
    /// Returns once the listener stops serving.
    pub async fn run(self, events: mpsc::Sender<PlatformEvent>) -> Result<()> {
        let state = ListenerState {
            bot_user_id: self.bot_user_id.clone(),
            events,
        };

        let callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        let environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(error_handler)
                .with_user_state(state),
        );

        let listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            environment,
            callbacks,
        );

        let app_token = SlackApiToken::new(self.config.app_token.clone().into());
        listener
            .listen_for(&app_token)
            .await
            .map_err(|e| startup_error(e.to_string()))?;

        info!("slack socket mode connected");
        listener.serve().await;
        Ok(())
    }
}

fn startup_error(message: String) -> SlackError {
    if is_auth_error(&message) {
        SlackError::InvalidAuth(message)
    } else {
        SlackError::Socket(message)
    }
}

/// Queue between the socket listener and the dispatcher.
pub fn event_channel() -> (mpsc::Sender<PlatformEvent>, mpsc::Receiver<PlatformEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_split_on_auth_codes() {
        assert!(matches!(
            startup_error("Slack API error: invalid_auth".into()),
            SlackError::InvalidAuth(_)
        ));
        assert!(matches!(
            startup_error("dns error".into()),
            SlackError::Socket(_)
        ));
    }

    #[test]
    fn invalid_auth_maps_to_fatal_core_error() {
        let core: faceswap_core::FaceswapError = SlackError::InvalidAuth("not_authed".into()).into();
        assert!(core.is_fatal());
        let core: faceswap_core::FaceswapError = SlackError::Socket("reset".into()).into();
        assert!(!core.is_fatal());
    }
}
