//! Presence payload construction and change-detection fingerprinting.

use std::hash::{DefaultHasher, Hash, Hasher};

use fraglight_types::BridgeSettings;

use crate::gsi::{Activity, NormalizedSnapshot, Team, UNKNOWN, display_mode};
use crate::tracker::MatchState;

pub const GAME_LABEL: &str = "Counter-Strike 2";
pub const LARGE_IMAGE_KEY: &str = "cs2_logo";

/// One candidate rich-presence update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresencePayload {
    pub details: String,
    pub state: String,
    pub large_image: String,
    pub large_text: String,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
    /// Unix timestamp for the elapsed display. Excluded from the
    /// fingerprint so heartbeats alone never count as a change.
    pub start_unix: i64,
}

impl PresencePayload {
    /// Timestamp-excluding fingerprint used purely for change detection.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.details.hash(&mut hasher);
        self.state.hash(&mut hasher);
        self.large_image.hash(&mut hasher);
        self.small_image.hash(&mut hasher);
        self.small_text.hash(&mut hasher);
        hasher.finish()
    }
}

/// Fixed payload shown while the game sits in the main menu.
pub fn menu_payload(start_unix: i64) -> PresencePayload {
    PresencePayload {
        details: "In Main Menu".to_string(),
        state: "Waiting for a match".to_string(),
        large_image: LARGE_IMAGE_KEY.to_string(),
        large_text: GAME_LABEL.to_string(),
        small_image: None,
        small_text: None,
        start_unix,
    }
}

/// Build the presence payload for the current tracked state.
pub fn build_payload(
    match_state: &MatchState,
    snapshot: &NormalizedSnapshot,
    settings: &BridgeSettings,
) -> PresencePayload {
    if !match_state.in_match {
        return menu_payload(match_state.start_unix);
    }

    let map = match_state.last_known_map.as_str();

    let mut details_parts = Vec::new();
    if settings.show_map && map != UNKNOWN {
        details_parts.push(format!("Map: {map}"));
    }
    if settings.show_mode {
        let mode = display_mode(&snapshot.mode);
        if mode != UNKNOWN {
            details_parts.push(format!("Mode: {mode}"));
        }
    }
    let details = if details_parts.is_empty() {
        format!("Playing {GAME_LABEL}")
    } else {
        details_parts.join(" | ")
    };

    let mut state_parts = Vec::new();
    if let Some(team) = team_segment(snapshot) {
        state_parts.push(team);
    }
    if settings.show_score {
        state_parts.push(format!(
            "Score: CT {} - T {}",
            snapshot.ct_score, snapshot.t_score
        ));
    }
    let state = if state_parts.is_empty() {
        "In a match".to_string()
    } else {
        state_parts.join(" | ")
    };

    let small_image = map_image_key(map);
    let small_text = small_image.as_ref().map(|_| map.to_string());

    PresencePayload {
        details,
        state,
        large_image: LARGE_IMAGE_KEY.to_string(),
        large_text: GAME_LABEL.to_string(),
        small_image,
        small_text,
        start_unix: match_state.start_unix,
    }
}

/// Team / alive-dead composition, in priority order:
/// dead-while-observed spectator, plain spectator, then real team with an
/// optional `(Dead)` suffix.
fn team_segment(snapshot: &NormalizedSnapshot) -> Option<String> {
    let dead = snapshot.has_player_state && !snapshot.player_alive;

    if snapshot.team == Team::Spectator {
        if snapshot.activity == Activity::Playing && dead {
            if snapshot.player_team.is_real() {
                return Some(format!("Team: {} (Dead)", snapshot.player_team));
            }
            return Some("Dead".to_string());
        }
        return Some("Spectating".to_string());
    }

    let mut segment = format!("Team: {}", snapshot.team);
    if dead {
        segment.push_str(" (Dead)");
    }
    Some(segment)
}

/// Derive the small-image key from a map name.
///
/// Names in the recognized families (`de_`, `cs_`, `ar_`, `gg_`) keep the
/// prefix; other underscored names (workshop-style) keep only the segment
/// after the *last* underscore, so `workshop_foo_bar` yields `bar` and
/// `workshop_123456_de_dust2` yields `dust2` without the `de_` family
/// prefix. The literal "Unknown" map has no image.
pub fn map_image_key(map: &str) -> Option<String> {
    if map.is_empty() || map == UNKNOWN {
        return None;
    }
    let lower = map.to_ascii_lowercase();
    for family in ["de_", "cs_", "ar_", "gg_"] {
        if lower.starts_with(family) {
            return Some(lower);
        }
    }
    match lower.rsplit_once('_') {
        Some((_, tail)) if !tail.is_empty() => Some(tail.to_string()),
        _ => Some(lower),
    }
}
