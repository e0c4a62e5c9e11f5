//! Spatially consistent dungeon engine.
//!
//! Rooms are generated lazily as the player explores, and every link between
//! two rooms agrees with their 3-D coordinates: going a direction and then its
//! opposite always leads back, and no coordinate ever holds two rooms.

pub mod command;
pub mod config;
pub mod content;
pub mod exploration;
pub mod generator;
pub mod journal;
pub mod map;
pub mod navigator;
pub mod persistence;
pub mod registry;
pub mod session;

pub use command::{Command, CommandError};
pub use config::{default_config_toml, ConfigError, DirectionWeights, DungeonConfig, ThemeConfig};
pub use content::{
    ContentGenerationError, ContentPipeline, ContentSource, OllamaConfig, OllamaContent,
    RoomContext, TemplateContent, TimeoutContent,
};
pub use exploration::{ExplorationState, ExplorationStats, RoomView, TrackerError};
pub use generator::{ExpansionReport, NewExit, WorldGenerator};
pub use journal::{Journal, JournalError};
pub use map::{render_map, MapRows, Viewport};
pub use navigator::{Feasibility, LinkOutcome, NavigationError, SpatialNavigator};
pub use persistence::{Autosave, SaveError, SaveStore, AUTOSAVE};
pub use registry::{InvariantViolation, RegistryError, Room, RoomDraft, RoomRegistry};
pub use session::{DungeonSession, MoveOutcome, SessionError};
