//! Configuration loading for a dungeon session.
//!
//! All settings are loaded from a TOML configuration file. Every section is
//! optional; a missing theme table takes that theme's built-in defaults.

use dungeon_model::{Direction, Theme};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::OllamaConfig;

/// Complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DungeonConfig {
    #[serde(default)]
    pub session: SessionConfig,
    /// Optional language-model content source
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Per-theme generation tuning
    #[serde(default)]
    pub themes: ThemeTable,
}

impl DungeonConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Tuning for one theme.
    pub fn theme(&self, theme: Theme) -> &ThemeConfig {
        self.themes.get(theme)
    }

    /// The tuning of the session's configured theme.
    pub fn active_theme(&self) -> &ThemeConfig {
        self.theme(self.session.theme)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for theme in Theme::ALL {
            self.theme(theme)
                .validate()
                .map_err(|reason| ConfigError::Invalid { theme, reason })?;
        }
        Ok(())
    }
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World seed. Drawn from the clock when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub theme: Theme,
    /// Deadline for one content request
    pub content_timeout_ms: u64,
    pub save_dir: PathBuf,
    /// Autosave after this many turns. 0 turns it off.
    pub autosave_every: u32,
    /// JSONL world journal. Disabled when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_path: Option<PathBuf>,
}

impl SessionConfig {
    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            theme: Theme::Fantasy,
            content_timeout_ms: 5000,
            save_dir: PathBuf::from("saves"),
            autosave_every: 10,
            journal_path: None,
        }
    }
}

/// `[themes.*]` tables, one per theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeTable {
    pub fantasy: ThemeConfig,
    #[serde(rename = "sci-fi")]
    pub sci_fi: ThemeConfig,
    pub horror: ThemeConfig,
    pub cyberpunk: ThemeConfig,
}

impl ThemeTable {
    pub fn get(&self, theme: Theme) -> &ThemeConfig {
        match theme {
            Theme::Fantasy => &self.fantasy,
            Theme::SciFi => &self.sci_fi,
            Theme::Horror => &self.horror,
            Theme::Cyberpunk => &self.cyberpunk,
        }
    }
}

impl Default for ThemeTable {
    fn default() -> Self {
        Self {
            fantasy: ThemeConfig::defaults_for(Theme::Fantasy),
            sci_fi: ThemeConfig::defaults_for(Theme::SciFi),
            horror: ThemeConfig::defaults_for(Theme::Horror),
            cyberpunk: ThemeConfig::defaults_for(Theme::Cyberpunk),
        }
    }
}

/// Branching and budget settings for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Lower bound on new exits per expansion
    pub min_exits: u32,
    /// Upper bound on new exits per expansion
    pub max_exits: u32,
    /// Total room budget for a session
    pub max_rooms: usize,
    /// Rooms at this depth are never expanded
    pub max_depth: u32,
    pub weights: DirectionWeights,
}

impl ThemeConfig {
    pub fn defaults_for(theme: Theme) -> Self {
        match theme {
            Theme::Fantasy => Self::default(),
            Theme::SciFi => Self {
                max_rooms: 250,
                weights: DirectionWeights {
                    up: 0.5,
                    down: 0.5,
                    ..DirectionWeights::default()
                },
                ..Self::default()
            },
            Theme::Horror => Self {
                max_exits: 3,
                max_rooms: 150,
                max_depth: 30,
                weights: DirectionWeights {
                    up: 0.2,
                    down: 0.7,
                    ..DirectionWeights::default()
                },
                ..Self::default()
            },
            Theme::Cyberpunk => Self {
                max_rooms: 300,
                weights: DirectionWeights {
                    up: 0.6,
                    down: 0.3,
                    ..DirectionWeights::default()
                },
                ..Self::default()
            },
        }
    }

    /// Checks the ranges. The error is a human-readable reason.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_exits > self.max_exits {
            return Err(format!(
                "min_exits ({}) exceeds max_exits ({})",
                self.min_exits, self.max_exits
            ));
        }
        if self.max_exits as usize > Direction::ALL.len() {
            return Err(format!("max_exits ({}) exceeds 6", self.max_exits));
        }
        if self.max_rooms == 0 {
            return Err("max_rooms must be at least 1".into());
        }
        self.weights.validate()
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            min_exits: 1,
            max_exits: 4,
            max_rooms: 200,
            max_depth: 40,
            weights: DirectionWeights::default(),
        }
    }
}

/// Relative likelihood of each direction being chosen for a new exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionWeights {
    pub north: f32,
    pub south: f32,
    pub east: f32,
    pub west: f32,
    pub up: f32,
    pub down: f32,
}

impl DirectionWeights {
    pub fn get(&self, direction: Direction) -> f32 {
        match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    fn validate(&self) -> Result<(), String> {
        for direction in Direction::ALL {
            let weight = self.get(direction);
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("weight for {} must be a non-negative number", direction));
            }
        }
        let horizontal = self.north + self.south + self.east + self.west;
        if horizontal <= 0.0 {
            return Err("at least one horizontal direction needs a positive weight".into());
        }
        let total: f32 = Direction::ALL.into_iter().map(|d| self.get(d)).sum();
        if !total.is_finite() {
            return Err("direction weights are too large to add up".into());
        }
        Ok(())
    }
}

impl Default for DirectionWeights {
    fn default() -> Self {
        Self {
            north: 1.0,
            south: 1.0,
            east: 1.0,
            west: 1.0,
            up: 0.3,
            down: 0.4,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid [themes.{theme}] settings: {reason}")]
    Invalid { theme: Theme, reason: String },
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Dungeon Configuration

[session]
# seed = 42
theme = "fantasy"
content_timeout_ms = 5000
save_dir = "saves"
autosave_every = 10
# journal_path = "journal.jsonl"

[ollama]
enabled = false
base_url = "http://localhost:11434"
model = "mistral-small:22b"
temperature = 0.85
num_predict = 300

[themes.fantasy]
min_exits = 1
max_exits = 4
max_rooms = 200
max_depth = 40

[themes.fantasy.weights]
north = 1.0
south = 1.0
east = 1.0
west = 1.0
up = 0.3
down = 0.4

[themes.sci-fi]
min_exits = 1
max_exits = 4
max_rooms = 250
max_depth = 40

[themes.sci-fi.weights]
north = 1.0
south = 1.0
east = 1.0
west = 1.0
up = 0.5
down = 0.5

[themes.horror]
min_exits = 1
max_exits = 3
max_rooms = 150
max_depth = 30

[themes.horror.weights]
north = 1.0
south = 1.0
east = 1.0
west = 1.0
up = 0.2
down = 0.7

[themes.cyberpunk]
min_exits = 1
max_exits = 4
max_rooms = 300
max_depth = 40

[themes.cyberpunk.weights]
north = 1.0
south = 1.0
east = 1.0
west = 1.0
up = 0.6
down = 0.3
"#
    .to_string()
}
