//! Match-lifecycle state machine.
//!
//! Tracks whether the player is on a loaded map (vs. main menu) and which
//! map it was, emitting [`MatchSignal`]s on transitions. The tracked map is
//! sticky: noisy frames that drop map data mid-match (the ESC menu case)
//! must not flicker presence back to the main menu.

use chrono::Utc;
use tracing::info;

use crate::gsi::{NormalizedSnapshot, UNKNOWN};

/// Signals emitted when the match lifecycle changes. Callers treat a
/// non-empty batch as "a transition fired this cycle".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSignal {
    EnteredMatch { map: String },
    LeftMatch { map: String },
    MapChanged { from: String, to: String },
}

/// Mutable match-lifecycle state. Owned by the presence synchronizer and
/// only ever touched under its lock.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub in_match: bool,
    /// Sticky last map while in match; `"Unknown"` otherwise. Never blank
    /// while `in_match` is true.
    pub last_known_map: String,
    /// Unix timestamp for the presence "elapsed" display. Reset only when
    /// the game process is (re)detected, not on match transitions.
    pub start_unix: i64,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            in_match: false,
            last_known_map: UNKNOWN.to_string(),
            start_unix: Utc::now().timestamp(),
        }
    }
}

impl MatchState {
    /// Back to "not in match", clearing the sticky map.
    pub fn reset(&mut self) {
        self.in_match = false;
        self.last_known_map = UNKNOWN.to_string();
    }

    /// Restart the elapsed-time clock. Called on game-process detection.
    pub fn restart_clock(&mut self) {
        self.start_unix = Utc::now().timestamp();
    }
}

/// Advance the match state machine with one normalized snapshot.
///
/// Transition table on (`in_match`, `has_map_data`):
/// - (false, true): enter match
/// - (true, false): leave match
/// - (true, true): stay; emit `MapChanged` when the map differs
/// - (false, false): stay in menu
pub fn advance_match_state(
    state: &mut MatchState,
    snapshot: &NormalizedSnapshot,
) -> Vec<MatchSignal> {
    let has_map_data = snapshot.has_map_data();
    let mut signals = Vec::new();

    match (state.in_match, has_map_data) {
        (false, true) => {
            state.in_match = true;
            state.last_known_map = snapshot.map.clone();
            info!(map = %snapshot.map, "entered match");
            signals.push(MatchSignal::EnteredMatch {
                map: snapshot.map.clone(),
            });
        }
        (true, false) => {
            let map = std::mem::replace(&mut state.last_known_map, UNKNOWN.to_string());
            state.in_match = false;
            info!(%map, "left match");
            signals.push(MatchSignal::LeftMatch { map });
        }
        (true, true) => {
            // Opening the ESC menu flips activity to Menu while map data is
            // still present; the match stays active.
            if state.last_known_map != snapshot.map {
                let from = std::mem::replace(&mut state.last_known_map, snapshot.map.clone());
                info!(%from, to = %snapshot.map, "map changed");
                signals.push(MatchSignal::MapChanged {
                    from,
                    to: snapshot.map.clone(),
                });
            }
        }
        (false, false) => {}
    }

    signals
}
