//! Lenient decoding of game-state pushes.
//!
//! GSI payloads vary more than the documented schema: key casing differs
//! between game builds and some pushes carry trailing commas. Decoding runs
//! in three steps: strip trailing commas, fold every object key to ASCII
//! lowercase, then deserialize into [`Snapshot`] (unknown keys ignored,
//! missing keys defaulted).

use serde_json::Value;

use super::Snapshot;
use crate::error::BridgeError;

/// Parse one push body into a [`Snapshot`].
pub fn parse_snapshot(body: &str) -> Result<Snapshot, BridgeError> {
    let cleaned = strip_trailing_commas(body);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| BridgeError::Payload(e.to_string()))?;
    let folded = fold_keys_lowercase(value);
    serde_json::from_value(folded).map_err(|e| BridgeError::Payload(e.to_string()))
}

/// Remove commas that directly precede a closing `}` or `]`, outside string
/// literals.
fn strip_trailing_commas(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            out.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                out.push(b'"');
            }
            b',' => {
                let next = bytes[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
                if !matches!(next, Some(b'}') | Some(b']')) {
                    out.push(b',');
                }
            }
            _ => out.push(b),
        }
    }
    // Only ASCII commas were removed, so the bytes are still valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

fn fold_keys_lowercase(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), fold_keys_lowercase(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys_lowercase).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsi::{Activity, Team};

    #[test]
    fn parses_a_full_push() {
        let body = r#"{
            "map": {
                "name": "de_dust2",
                "mode": "competitive",
                "round": 7,
                "team_ct": { "score": 4 },
                "team_t": { "score": 3 }
            },
            "player": {
                "steamid": "76561198000000000",
                "name": "player-one",
                "activity": "playing",
                "team": "CT",
                "state": { "health": 87, "armor": 100, "money": 4500, "round_kills": 2 }
            }
        }"#;

        let snapshot = parse_snapshot(body).unwrap();
        let map = snapshot.map.unwrap();
        assert_eq!(map.name, "de_dust2");
        assert_eq!(map.team_ct.score, 4);
        assert_eq!(map.team_t.score, 3);
        let player = snapshot.player.unwrap();
        assert_eq!(player.activity, Activity::Playing);
        assert_eq!(player.team, Team::Ct);
        let state = player.state.unwrap();
        assert_eq!(state.health, 87);
        assert_eq!(state.round_kills, 2);
    }

    #[test]
    fn field_matching_is_case_insensitive() {
        let body = r#"{"Map": {"Name": "de_mirage", "Mode": "Casual"}}"#;
        let snapshot = parse_snapshot(body).unwrap();
        let map = snapshot.map.unwrap();
        assert_eq!(map.name, "de_mirage");
        assert_eq!(map.mode, "Casual");
    }

    #[test]
    fn tolerates_trailing_commas() {
        let body = r#"{"map": {"name": "de_inferno", "round": 1,}, "player": {"team": "T",},}"#;
        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.map.unwrap().name, "de_inferno");
        assert_eq!(snapshot.player.unwrap().team, Team::T);
    }

    #[test]
    fn commas_inside_strings_survive() {
        let body = r#"{"player": {"name": "a,}b"}}"#;
        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.player.unwrap().name, "a,}b");
    }

    #[test]
    fn unknown_fields_and_sections_are_ignored() {
        let body = r#"{"provider": {"appid": 730}, "round": {"phase": "live"}, "map": {"name": "de_nuke", "phase": "live"}}"#;
        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.map.unwrap().name, "de_nuke");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_snapshot("{not json").unwrap_err();
        assert!(matches!(err, BridgeError::Payload(_)));
    }

    #[test]
    fn unknown_enum_values_fold_to_defaults() {
        let body = r#"{"player": {"activity": "freezetime", "team": "TERRORIST_B"}}"#;
        let player = parse_snapshot(body).unwrap().player.unwrap();
        assert_eq!(player.activity, Activity::Menu);
        assert_eq!(player.team, Team::Spectator);
    }
}
