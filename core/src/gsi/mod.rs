//! Typed model for Game State Integration pushes.
//!
//! The game posts one JSON object per heartbeat/change. Every section is
//! optional (the integration descriptor selects which data categories the
//! game includes), so the whole schema decodes with defaults and ignores
//! unknown keys.

mod lenient;
mod modes;
mod normalize;

pub use lenient::parse_snapshot;
pub use modes::display_mode;
pub use normalize::{NormalizedSnapshot, UNKNOWN};

use std::fmt;

use serde::{Deserialize, Deserializer};

/// One received game-state push, immutable once parsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub map: Option<MapInfo>,
    #[serde(default)]
    pub player: Option<PlayerInfo>,
}

/// The `map` data category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub round: i64,
    #[serde(default)]
    pub team_ct: TeamScore,
    #[serde(default)]
    pub team_t: TeamScore,
}

/// Per-team score block nested under `map`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamScore {
    #[serde(default)]
    pub score: i64,
}

/// The `player_id` data category, plus the optional `player_state` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub steamid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub state: Option<PlayerState>,
}

/// The `player_state` data category. Health drives the alive/dead display;
/// the rest is carried so callers can read the full push.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerState {
    #[serde(default = "default_health")]
    pub health: i64,
    #[serde(default)]
    pub armor: i64,
    #[serde(default)]
    pub flashed: i64,
    #[serde(default)]
    pub burning: i64,
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub round_kills: i64,
    #[serde(default)]
    pub round_killhs: i64,
    /// Team reported inside player-state. May diverge from the top-level
    /// team while dead or spectating.
    #[serde(default)]
    pub team: Team,
}

fn default_health() -> i64 {
    100
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            health: default_health(),
            armor: 0,
            flashed: 0,
            burning: 0,
            money: 0,
            round_kills: 0,
            round_killhs: 0,
            team: Team::default(),
        }
    }
}

/// What the player client is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Menu,
    Playing,
    TextInput,
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Unknown activities fold to Menu, the documented default.
        Ok(match raw.to_ascii_lowercase().as_str() {
            "playing" => Activity::Playing,
            "textinput" => Activity::TextInput,
            _ => Activity::Menu,
        })
    }
}

/// The side the player is on. `Spectator` is the default for absent or
/// unrecognized values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Team {
    Ct,
    T,
    #[default]
    Spectator,
}

impl Team {
    pub fn is_real(self) -> bool {
        matches!(self, Team::Ct | Team::T)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Ct => write!(f, "CT"),
            Team::T => write!(f, "T"),
            Team::Spectator => write!(f, "Spectator"),
        }
    }
}

impl<'de> Deserialize<'de> for Team {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "ct" => Team::Ct,
            "t" => Team::T,
            _ => Team::Spectator,
        })
    }
}
