//! Pure transform from a raw [`Snapshot`] to the stable state model consumed
//! by the match tracker and presence builder.

use super::{Activity, Snapshot, Team};

pub const UNKNOWN: &str = "Unknown";

/// One snapshot with defaults filled in and derived flags computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSnapshot {
    pub map: String,
    pub mode: String,
    pub activity: Activity,
    pub team: Team,
    pub ct_score: i64,
    pub t_score: i64,
    pub has_player_state: bool,
    /// True unless health is zero while player-state is present.
    pub player_alive: bool,
    /// Team reported inside player-state; may diverge from `team`.
    pub player_team: Team,
}

impl NormalizedSnapshot {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let (map, mode, ct_score, t_score) = match &snapshot.map {
            Some(map) => (
                non_empty_or_unknown(&map.name),
                non_empty_or_unknown(&map.mode),
                map.team_ct.score,
                map.team_t.score,
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string(), 0, 0),
        };

        let (activity, team, state) = match &snapshot.player {
            Some(player) => (player.activity, player.team, player.state.as_ref()),
            None => (Activity::Menu, Team::Spectator, None),
        };

        Self {
            map,
            mode,
            activity,
            team,
            ct_score,
            t_score,
            has_player_state: state.is_some(),
            player_alive: state.map(|s| s.health != 0).unwrap_or(true),
            player_team: state.map(|s| s.team).unwrap_or_default(),
        }
    }

    /// Whether this snapshot carries a real map name.
    pub fn has_map_data(&self) -> bool {
        !self.map.is_empty() && self.map != UNKNOWN
    }
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsi::parse_snapshot;

    #[test]
    fn empty_snapshot_normalizes_to_documented_defaults() {
        let normalized = NormalizedSnapshot::from_snapshot(&Snapshot::default());
        assert_eq!(normalized.map, "Unknown");
        assert_eq!(normalized.mode, "Unknown");
        assert_eq!(normalized.activity, Activity::Menu);
        assert_eq!(normalized.team, Team::Spectator);
        assert_eq!(normalized.ct_score, 0);
        assert_eq!(normalized.t_score, 0);
        assert!(!normalized.has_player_state);
        assert!(normalized.player_alive);
        assert!(!normalized.has_map_data());
    }

    #[test]
    fn zero_health_with_state_means_dead() {
        let snapshot =
            parse_snapshot(r#"{"player": {"team": "T", "state": {"health": 0}}}"#).unwrap();
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        assert!(normalized.has_player_state);
        assert!(!normalized.player_alive);
    }

    #[test]
    fn missing_state_means_alive() {
        let snapshot = parse_snapshot(r#"{"player": {"team": "CT"}}"#).unwrap();
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        assert!(!normalized.has_player_state);
        assert!(normalized.player_alive);
    }

    #[test]
    fn scores_come_from_team_blocks() {
        let snapshot = parse_snapshot(
            r#"{"map": {"name": "de_ancient", "team_ct": {"score": 11}, "team_t": {"score": 9}}}"#,
        )
        .unwrap();
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        assert_eq!(normalized.ct_score, 11);
        assert_eq!(normalized.t_score, 9);
        assert!(normalized.has_map_data());
    }

    #[test]
    fn player_state_team_is_kept_separately() {
        let snapshot = parse_snapshot(
            r#"{"player": {"team": "SPECTATOR", "activity": "playing",
                "state": {"health": 0, "team": "T"}}}"#,
        )
        .unwrap();
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        assert_eq!(normalized.team, Team::Spectator);
        assert_eq!(normalized.player_team, Team::T);
    }

    #[test]
    fn empty_map_name_counts_as_unknown() {
        let snapshot = parse_snapshot(r#"{"map": {"name": ""}}"#).unwrap();
        let normalized = NormalizedSnapshot::from_snapshot(&snapshot);
        assert_eq!(normalized.map, "Unknown");
        assert!(!normalized.has_map_data());
    }
}
