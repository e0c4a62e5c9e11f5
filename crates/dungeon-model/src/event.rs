//! World Events
//!
//! Records of what happened to the dungeon graph, one JSON object per line in
//! the session journal.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, Direction, RoomId};

/// Event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RoomCreated,
    RoomsMerged,
    LinkConflict,
    Moved,
    ContentFallback,
}

impl EventType {
    pub fn all() -> &'static [EventType] {
        &[
            EventType::RoomCreated,
            EventType::RoomsMerged,
            EventType::LinkConflict,
            EventType::Moved,
            EventType::ContentFallback,
        ]
    }
}

/// Event payload. Serialized with a `type` tag matching [`EventType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetail {
    RoomCreated {
        room: RoomId,
        from: RoomId,
        direction: Direction,
        coordinate: Coordinate,
        depth: u32,
        title: String,
    },
    /// Two generation paths met at an existing room.
    RoomsMerged {
        room: RoomId,
        from: RoomId,
        direction: Direction,
        coordinate: Coordinate,
    },
    LinkConflict { from: RoomId, direction: Direction },
    Moved {
        from: RoomId,
        to: RoomId,
        direction: Direction,
        first_visit: bool,
    },
    ContentFallback { room: RoomId, reason: String },
}

impl EventDetail {
    pub fn event_type(&self) -> EventType {
        match self {
            EventDetail::RoomCreated { .. } => EventType::RoomCreated,
            EventDetail::RoomsMerged { .. } => EventType::RoomsMerged,
            EventDetail::LinkConflict { .. } => EventType::LinkConflict,
            EventDetail::Moved { .. } => EventType::Moved,
            EventDetail::ContentFallback { .. } => EventType::ContentFallback,
        }
    }
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub event_id: String,
    /// Player move count when the event happened.
    pub turn: u64,
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl WorldEvent {
    pub fn new(event_id: impl Into<String>, turn: u64, detail: EventDetail) -> Self {
        Self {
            event_id: event_id.into(),
            turn,
            detail,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.detail.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::room_id;

    #[test]
    fn test_event_serializes_flat_with_tag() {
        let event = WorldEvent::new(
            "evt_00000001",
            3,
            EventDetail::LinkConflict {
                from: room_id(1),
                direction: Direction::North,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "link_conflict");
        assert_eq!(json["direction"], "north");
        assert_eq!(json["turn"], 3);

        let parsed: WorldEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.event_type(), EventType::LinkConflict);
    }

    #[test]
    fn test_all_event_types() {
        assert_eq!(EventType::all().len(), 5);
    }
}
