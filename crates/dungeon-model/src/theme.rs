//! Themes
//!
//! The closed set of dungeon themes and the static vocabulary each carries.
//! Branching numbers live in the engine's configuration, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dungeon theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Fantasy,
    #[serde(rename = "sci-fi")]
    SciFi,
    Horror,
    Cyberpunk,
}

/// Static vocabulary for a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeProfile {
    pub name: &'static str,
    pub blurb: &'static str,
    pub adjectives: &'static [&'static str],
    pub room_kinds: &'static [&'static str],
    pub items: &'static [&'static str],
    /// (name, role) pairs
    pub npcs: &'static [(&'static str, &'static str)],
}

const FANTASY: ThemeProfile = ThemeProfile {
    name: "Fantasy",
    blurb: "A mystical world of magic, dragons, and ancient artifacts",
    adjectives: &["mystical", "ancient", "enchanted", "moss-covered", "torchlit"],
    room_kinds: &["chamber", "hallway", "cavern", "temple", "tower"],
    items: &["sword", "shield", "potion", "scroll", "gem", "coin purse", "torch", "dagger"],
    npcs: &[
        ("Guard Captain", "warrior"),
        ("Wise Sage", "scholar"),
        ("Traveling Merchant", "trader"),
    ],
};

const SCI_FI: ThemeProfile = ThemeProfile {
    name: "Sci-Fi",
    blurb: "A futuristic world of technology, space, and advanced AI",
    adjectives: &["futuristic", "humming", "holographic", "sterile", "flickering"],
    room_kinds: &["bridge", "corridor", "lab", "cockpit", "control room"],
    items: &["data pad", "energy cell", "laser pistol", "scanner", "med kit", "oxygen tank"],
    npcs: &[("Security Officer", "guard"), ("Tech Specialist", "engineer")],
};

const HORROR: ThemeProfile = ThemeProfile {
    name: "Horror",
    blurb: "A dark and terrifying world of monsters and supernatural threats",
    adjectives: &["dark", "ominous", "creaking", "haunted", "damp"],
    room_kinds: &["basement", "attic", "cellar", "crypt", "parlor"],
    items: &["old key", "torn journal", "candle", "cursed amulet", "bone fragment"],
    npcs: &[("Mad Survivor", "survivor"), ("Cultist", "fanatic")],
};

const CYBERPUNK: ThemeProfile = ThemeProfile {
    name: "Cyberpunk",
    blurb: "A neon-lit dystopian future with advanced technology and corporate power",
    adjectives: &["neon", "synthetic", "rain-slick", "buzzing", "grimy"],
    room_kinds: &["alley", "cybernetics lab", "data center", "underground bar", "stairwell"],
    items: &["credit chip", "neural interface", "holo-display", "encrypted drive"],
    npcs: &[("Data Broker", "hacker"), ("Corp Security", "guard")],
};

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Fantasy, Theme::SciFi, Theme::Horror, Theme::Cyberpunk];

    /// Returns the static vocabulary for this theme.
    pub fn profile(self) -> &'static ThemeProfile {
        match self {
            Theme::Fantasy => &FANTASY,
            Theme::SciFi => &SCI_FI,
            Theme::Horror => &HORROR,
            Theme::Cyberpunk => &CYBERPUNK,
        }
    }

    /// Key used for this theme in configuration tables.
    pub fn key(self) -> &'static str {
        match self {
            Theme::Fantasy => "fantasy",
            Theme::SciFi => "sci-fi",
            Theme::Horror => "horror",
            Theme::Cyberpunk => "cyberpunk",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a string names no theme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: '{0}' (expected fantasy, sci-fi, horror or cyberpunk)")]
pub struct ParseThemeError(pub String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fantasy" => Ok(Theme::Fantasy),
            "sci-fi" | "scifi" | "sci_fi" => Ok(Theme::SciFi),
            "horror" => Ok(Theme::Horror),
            "cyberpunk" => Ok(Theme::Cyberpunk),
            _ => Err(ParseThemeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse() {
        assert_eq!("Fantasy".parse::<Theme>().unwrap(), Theme::Fantasy);
        assert_eq!("scifi".parse::<Theme>().unwrap(), Theme::SciFi);
        assert_eq!("sci-fi".parse::<Theme>().unwrap(), Theme::SciFi);
        assert!("western".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_key_roundtrip() {
        for theme in Theme::ALL {
            assert_eq!(theme.key().parse::<Theme>().unwrap(), theme);
        }
    }

    #[test]
    fn test_theme_serialization() {
        assert_eq!(serde_json::to_string(&Theme::SciFi).unwrap(), r#""sci-fi""#);
        assert_eq!(serde_json::to_string(&Theme::Horror).unwrap(), r#""horror""#);
    }

    #[test]
    fn test_profiles_are_populated() {
        for theme in Theme::ALL {
            let p = theme.profile();
            assert!(!p.adjectives.is_empty());
            assert!(!p.room_kinds.is_empty());
            assert!(!p.items.is_empty());
            assert!(!p.npcs.is_empty());
        }
    }
}
