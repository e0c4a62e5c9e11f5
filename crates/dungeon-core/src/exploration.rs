//! Exploration Tracker
//!
//! Where the player is, where they have been, and how much of the dungeon
//! exists. Changes only on a confirmed move or a confirmed commit.

use std::collections::BTreeSet;

use dungeon_model::{Coordinate, Direction, ExplorationRecord, Npc, RoomId};
use serde::Serialize;

use crate::registry::{RegistryError, Room, RoomRegistry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// No committed exit from the current room in that direction.
    #[error("you can't go {direction} from here")]
    NotLinked { from: RoomId, direction: Direction },
    /// The exit exists but leads somewhere other than the requested room.
    #[error("{from} --{direction}--> does not lead to {requested}")]
    WrongTarget {
        from: RoomId,
        direction: Direction,
        requested: RoomId,
    },
    #[error("saved position {0} was never visited")]
    CurrentNotVisited(RoomId),
    /// The visited set and the rooms' visited flags disagree.
    #[error("room {0} disagrees with the saved visited set")]
    VisitedMismatch(RoomId),
    #[error("saved exploration counts {recorded} rooms but the dungeon has {actual}")]
    CommitCountMismatch { recorded: usize, actual: usize },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Counts for the `stats` verb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExplorationStats {
    pub visited: usize,
    pub total_committed: usize,
    pub budget: usize,
    /// Visited share of committed rooms, 0..=100.
    pub exploration_percent: f32,
    pub moves: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationState {
    current: RoomId,
    visited: BTreeSet<RoomId>,
    rooms_committed: usize,
    moves: u64,
}

impl ExplorationState {
    /// Fresh state standing in the origin, which counts as visited.
    pub fn new(origin: RoomId) -> Self {
        Self {
            current: origin,
            visited: BTreeSet::from([origin]),
            rooms_committed: 1,
            moves: 0,
        }
    }

    pub fn current(&self) -> RoomId {
        self.current
    }

    pub fn visited(&self) -> &BTreeSet<RoomId> {
        &self.visited
    }

    pub fn has_visited(&self, room_id: RoomId) -> bool {
        self.visited.contains(&room_id)
    }

    pub fn rooms_committed(&self) -> usize {
        self.rooms_committed
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Moves into `target` through the current room's `direction` exit.
    ///
    /// Revisiting is fine; only the position and move count change.
    pub fn visit(
        &mut self,
        registry: &mut RoomRegistry,
        direction: Direction,
        target: RoomId,
    ) -> Result<(), TrackerError> {
        let from = self.current;
        match registry.require(from)?.exit(direction) {
            None => return Err(TrackerError::NotLinked { from, direction }),
            Some(linked) if linked != target => {
                return Err(TrackerError::WrongTarget {
                    from,
                    direction,
                    requested: target,
                })
            }
            Some(_) => {}
        }

        registry.mark_visited(target)?;
        self.visited.insert(target);
        self.current = target;
        self.moves += 1;
        Ok(())
    }

    /// Counts rooms committed by an expansion.
    pub fn record_commit(&mut self, count: usize) {
        self.rooms_committed += count;
    }

    pub fn stats(&self, budget: usize) -> ExplorationStats {
        let exploration_percent = if self.rooms_committed == 0 {
            0.0
        } else {
            self.visited.len() as f32 / self.rooms_committed as f32 * 100.0
        };
        ExplorationStats {
            visited: self.visited.len(),
            total_committed: self.rooms_committed,
            budget,
            exploration_percent,
            moves: self.moves,
        }
    }

    pub fn to_record(&self) -> ExplorationRecord {
        ExplorationRecord {
            current_room: self.current,
            visited: self.visited.clone(),
            rooms_committed: self.rooms_committed,
            moves: self.moves,
        }
    }

    /// Rebuilds state from a record, checking it against the registry.
    pub fn from_record(
        record: &ExplorationRecord,
        registry: &RoomRegistry,
    ) -> Result<Self, TrackerError> {
        registry.require(record.current_room)?;
        if !record.visited.contains(&record.current_room) {
            return Err(TrackerError::CurrentNotVisited(record.current_room));
        }
        for &room in &record.visited {
            if !registry.require(room)?.is_visited() {
                return Err(TrackerError::VisitedMismatch(room));
            }
        }
        if let Some(stray) = registry
            .rooms()
            .find(|room| room.is_visited() && !record.visited.contains(&room.id()))
        {
            return Err(TrackerError::VisitedMismatch(stray.id()));
        }
        if record.rooms_committed != registry.len() {
            return Err(TrackerError::CommitCountMismatch {
                recorded: record.rooms_committed,
                actual: registry.len(),
            });
        }

        Ok(Self {
            current: record.current_room,
            visited: record.visited.clone(),
            rooms_committed: record.rooms_committed,
            moves: record.moves,
        })
    }
}

/// What `look` shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub room_id: RoomId,
    pub title: String,
    pub description: String,
    pub items: Vec<String>,
    pub npcs: Vec<Npc>,
    /// Committed exits in direction order.
    pub exits: Vec<Direction>,
    pub coordinate: Option<Coordinate>,
    pub depth: u32,
    pub ascii_art: Option<String>,
}

impl RoomView {
    pub fn of(room: &Room) -> Self {
        let content = room.content();
        Self {
            room_id: room.id(),
            title: content.title().to_string(),
            description: content.description().to_string(),
            items: content.items().to_vec(),
            npcs: content.npcs().to_vec(),
            exits: room.exits().keys().copied().collect(),
            coordinate: room.coordinate(),
            depth: room.depth(),
            ascii_art: content.ascii_art().map(str::to_string),
        }
    }

    /// Exits as "north, up".
    pub fn exit_list(&self) -> String {
        if self.exits.is_empty() {
            return "none".to_string();
        }
        self.exits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
