//! User-facing bridge settings.
//!
//! Constructed once at startup and handed to each component by reference;
//! nothing in the core reads configuration from a global.

use serde::{Deserialize, Serialize};

/// Settings for the GSI listener, presence display, and process polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Host the ingestion endpoint binds to.
    pub host: String,
    /// Port the ingestion endpoint binds to.
    pub port: u16,
    /// Discord application id used for the rich-presence IPC handshake.
    pub discord_app_id: String,
    /// Show "Map: ..." in the presence details line.
    pub show_map: bool,
    /// Show "Mode: ..." in the presence details line.
    pub show_mode: bool,
    /// Show "Score: CT x - T y" in the presence state line.
    pub show_score: bool,
    /// Process names treated as "the game is running".
    pub process_names: Vec<String>,
    /// Process poll cadence in seconds.
    pub poll_interval_secs: u64,
    /// Minimum spacing between outbound presence dispatches, in milliseconds.
    pub min_dispatch_interval_ms: u64,
}

impl BridgeSettings {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            discord_app_id: String::new(),
            show_map: true,
            show_mode: true,
            show_score: true,
            process_names: vec![
                "cs2".to_string(),
                "cs2.exe".to_string(),
                "csgo".to_string(),
                "csgo.exe".to_string(),
            ],
            poll_interval_secs: 5,
            min_dispatch_interval_ms: 1000,
        }
    }
}
