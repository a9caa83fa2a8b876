//! Raw GSI mode identifiers mapped to display labels.

use phf::phf_map;

/// Process-lifetime constant table. Keys are lowercased raw identifiers.
static GAME_MODES: phf::Map<&'static str, &'static str> = phf_map! {
    "casual" => "Casual",
    "competitive" => "Competitive",
    "scrimcomp2v2" => "Wingman",
    "scrimcomp5v5" => "Premier",
    "gungameprogressive" => "Arms Race",
    "gungametrbomb" => "Demolition",
    "deathmatch" => "Deathmatch",
    "teamdeathmatch" => "Team Deathmatch",
    "survival" => "Danger Zone",
    "coopmission" => "Guardian",
    "cooperative" => "Guardian",
    "custom" => "Custom",
};

/// Resolve a raw mode identifier to its display label.
///
/// Lookup is case-insensitive; unrecognized identifiers fall back to the raw
/// value with its first letter capitalized.
pub fn display_mode(raw: &str) -> String {
    if raw.is_empty() || raw.eq_ignore_ascii_case("unknown") {
        return "Unknown".to_string();
    }
    let key = raw.to_ascii_lowercase();
    match GAME_MODES.get(key.as_str()) {
        Some(label) => (*label).to_string(),
        None => capitalize(raw),
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
