//! Shared world-graph types and serialization for the dungeon engine.
//!
//! This crate contains pure data structures with no generation logic.
//! It is a dependency for the engine crate and for anything that reads
//! save files.

pub mod content;
pub mod direction;
pub mod event;
pub mod id;
pub mod snapshot;
pub mod theme;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export coordinate model
pub use direction::{Coordinate, Direction, ParseDirectionError};

// Re-export room identity
pub use id::RoomId;

// Re-export theme types
pub use theme::{ParseThemeError, Theme, ThemeProfile};

// Re-export content types
pub use content::{ContentError, ContentPayload, Npc};

// Re-export event types
pub use event::{EventDetail, EventType, WorldEvent};

// Re-export snapshot types
pub use snapshot::{
    DungeonSnapshot, ExplorationRecord, RoomRecord, SnapshotError, SNAPSHOT_FORMAT_VERSION,
};
