//! Settings loading.

use fraglight_types::BridgeSettings;
use tracing::warn;

/// Load settings from the per-user config file, falling back to defaults
/// when the file is missing or unreadable.
pub fn load() -> BridgeSettings {
    match confy::load("fraglight", None) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(%err, "failed loading settings; using defaults");
            BridgeSettings::default()
        }
    }
}
