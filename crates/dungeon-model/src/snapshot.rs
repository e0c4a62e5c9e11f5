//! Snapshot Types
//!
//! Serialization structs for the committed dungeon graph and the exploration
//! state. A snapshot is always taken between turns, never mid-expansion.
//!
//! Rooms are ordered by id and exits by direction, so serializing,
//! deserializing and serializing again yields identical bytes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{ContentPayload, Coordinate, Direction, RoomId, Theme};

/// Current save format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Errors reading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// One committed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: RoomId,
    pub coordinate: Coordinate,
    pub theme: Theme,
    pub depth: u32,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub visited: bool,
    #[serde(default)]
    pub exits: BTreeMap<Direction, RoomId>,
    pub content: ContentPayload,
}

/// Exploration bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationRecord {
    pub current_room: RoomId,
    pub visited: BTreeSet<RoomId>,
    pub rooms_committed: usize,
    #[serde(default)]
    pub moves: u64,
}

/// Full save: graph plus exploration state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonSnapshot {
    pub format_version: u32,
    pub theme: Theme,
    pub seed: u64,
    pub max_rooms: usize,
    pub origin: RoomId,
    pub rooms: Vec<RoomRecord>,
    pub exploration: ExplorationRecord,
}

impl DungeonSnapshot {
    /// Sorts rooms by id so output is canonical.
    pub fn normalize(&mut self) {
        self.rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
    }

    pub fn room(&self, room_id: RoomId) -> Option<&RoomRecord> {
        self.rooms.iter().find(|r| r.room_id == room_id)
    }

    /// Pretty JSON, as written to save files.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses JSON and checks the format version.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: DungeonSnapshot = serde_json::from_str(json)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.format_version,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_snapshot_json_idempotent() {
        let snapshot = fixtures::two_room_snapshot();
        let first = snapshot.to_json().unwrap();
        let parsed = DungeonSnapshot::from_json(&first).unwrap();
        let second = parsed.to_json().unwrap();
        assert_eq!(first, second);
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_exits_serialize_by_direction_name() {
        let snapshot = fixtures::two_room_snapshot();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"north\""));
        assert!(json.contains("\"south\""));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut snapshot = fixtures::two_room_snapshot();
        snapshot.format_version = SNAPSHOT_FORMAT_VERSION + 1;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            DungeonSnapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_normalize_orders_rooms() {
        let mut snapshot = fixtures::two_room_snapshot();
        snapshot.rooms.reverse();
        snapshot.normalize();
        assert!(snapshot.rooms[0].room_id < snapshot.rooms[1].room_id);
    }
}
