//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // dungeon-model = { path = "../dungeon-model", features = ["test-fixtures"] }
//!
//! use dungeon_model::fixtures;
//!
//! let snapshot = fixtures::two_room_snapshot();
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    ContentPayload, Coordinate, Direction, DungeonSnapshot, ExplorationRecord, Npc, RoomId,
    RoomRecord, Theme, SNAPSHOT_FORMAT_VERSION,
};

/// Deterministic id from a small integer.
pub fn room_id(n: u8) -> RoomId {
    RoomId::from_random_bytes([n; 16])
}

/// A minimal valid payload.
pub fn sample_payload(title: &str) -> ContentPayload {
    ContentPayload::validated(
        title,
        format!("You stand in the {}.", title.to_lowercase()),
        vec!["torch".to_string()],
        vec![Npc::new("Wise Sage", "scholar")],
    )
    .unwrap_or_else(|e| panic!("fixture payload invalid: {}", e))
}

/// Origin at (0,0,0) joined north to a second room at (0,1,0).
///
/// The player stands in the origin; only the origin is visited.
pub fn two_room_snapshot() -> DungeonSnapshot {
    let origin = room_id(1);
    let north = room_id(2);

    let origin_room = RoomRecord {
        room_id: origin,
        coordinate: Coordinate::ORIGIN,
        theme: Theme::Fantasy,
        depth: 0,
        expanded: true,
        visited: true,
        exits: BTreeMap::from([(Direction::North, north)]),
        content: sample_payload("Entrance Hall"),
    };
    let north_room = RoomRecord {
        room_id: north,
        coordinate: Coordinate::new(0, 1, 0),
        theme: Theme::Fantasy,
        depth: 1,
        expanded: false,
        visited: false,
        exits: BTreeMap::from([(Direction::South, origin)]),
        content: sample_payload("Mossy Chamber"),
    };

    DungeonSnapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        theme: Theme::Fantasy,
        seed: 42,
        max_rooms: 50,
        origin,
        rooms: vec![origin_room, north_room],
        exploration: ExplorationRecord {
            current_room: origin,
            visited: BTreeSet::from([origin]),
            rooms_committed: 2,
            moves: 0,
        },
    }
}
