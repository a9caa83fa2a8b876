//! Seam to the external rich-presence client.
//!
//! The Discord IPC library exposes connect/activity/clear calls that can all
//! fail; everything above this module talks to the [`PresenceClient`] trait
//! so the synchronizer is testable without a live socket.

use discord_rich_presence::activity::{Activity, Assets, Timestamps};
use discord_rich_presence::{DiscordIpc, DiscordIpcClient};

use super::payload::PresencePayload;
use crate::error::BridgeError;

/// Connection lifecycle of the external client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
    Error,
}

/// Fallible rich-presence client interface.
pub trait PresenceClient: Send {
    fn initialize(&mut self) -> Result<(), BridgeError>;
    fn set_presence(&mut self, payload: &PresencePayload) -> Result<(), BridgeError>;
    fn clear_presence(&mut self) -> Result<(), BridgeError>;
    fn dispose(&mut self);
}

/// Real client backed by the Discord rich-presence IPC socket.
pub struct DiscordPresence {
    client: DiscordIpcClient,
}

impl DiscordPresence {
    pub fn new(app_id: &str) -> Result<Self, BridgeError> {
        let client = DiscordIpcClient::new(app_id).map_err(ipc_error)?;
        Ok(Self { client })
    }
}

impl PresenceClient for DiscordPresence {
    fn initialize(&mut self) -> Result<(), BridgeError> {
        self.client.connect().map_err(ipc_error)
    }

    fn set_presence(&mut self, payload: &PresencePayload) -> Result<(), BridgeError> {
        let mut assets = Assets::new()
            .large_image(&payload.large_image)
            .large_text(&payload.large_text);
        if let (Some(image), Some(text)) = (&payload.small_image, &payload.small_text) {
            assets = assets.small_image(image).small_text(text);
        }

        let activity = Activity::new()
            .details(&payload.details)
            .state(&payload.state)
            .assets(assets)
            .timestamps(Timestamps::new().start(payload.start_unix));

        self.client.set_activity(activity).map_err(ipc_error)
    }

    fn clear_presence(&mut self) -> Result<(), BridgeError> {
        self.client.clear_activity().map_err(ipc_error)
    }

    fn dispose(&mut self) {
        // Close failures only mean the pipe is already gone.
        let _ = self.client.close();
    }
}

fn ipc_error(err: Box<dyn std::error::Error>) -> BridgeError {
    BridgeError::Presence(err.to_string())
}
