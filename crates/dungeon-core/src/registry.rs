//! Room Registry
//!
//! Owns every room and the coordinate -> room index. All mutations validate
//! first and write second, so a rejected call leaves the graph untouched.

use dungeon_model::{ContentPayload, Coordinate, Direction, RoomId, RoomRecord, Theme};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An exit slot already leads somewhere else.
    #[error("{room} already has a {direction} exit to {occupant}")]
    EdgeConflict {
        room: RoomId,
        direction: Direction,
        occupant: RoomId,
    },
    #[error("room {0} cannot link to itself")]
    SelfLink(RoomId),
    #[error("coordinate {coordinate} is already owned by {occupant}")]
    CoordinateConflict {
        coordinate: Coordinate,
        occupant: RoomId,
    },
    #[error("room {room} is already placed at {existing}")]
    AlreadyAssigned { room: RoomId, existing: Coordinate },
    #[error("linking {from} {direction} to {to} does not match their coordinates")]
    GeometryMismatch {
        from: RoomId,
        direction: Direction,
        to: RoomId,
    },
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),
    #[error("room {0} has exits and cannot be discarded")]
    HasExits(RoomId),
    #[error("registry is inconsistent: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A broken structural guarantee. Seeing one means the navigator has a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("origin room {0} is missing")]
    MissingOrigin(RoomId),
    #[error("origin room {room} sits at {found} instead of (0,0,0)")]
    OriginMisplaced { room: RoomId, found: Coordinate },
    #[error("{room} --{direction}--> {target} has no reverse edge")]
    MissingReverse {
        room: RoomId,
        direction: Direction,
        target: RoomId,
    },
    #[error("{room} --{direction}--> unknown room {target}")]
    DanglingExit {
        room: RoomId,
        direction: Direction,
        target: RoomId,
    },
    #[error("{room} --{direction}--> {target} disagrees with their coordinates")]
    GeometryMismatch {
        room: RoomId,
        direction: Direction,
        target: RoomId,
    },
    #[error("committed room {0} has no coordinate")]
    UnplacedRoom(RoomId),
    #[error("coordinate index disagrees with room records at {0}")]
    IndexMismatch(Coordinate),
    #[error("room {0} appears twice")]
    DuplicateRoom(RoomId),
    #[error("room {0} is not reachable from the origin")]
    Unreachable(RoomId),
}

/// What a new room starts with before it is placed.
#[derive(Debug, Clone)]
pub struct RoomDraft {
    pub theme: Theme,
    pub depth: u32,
    pub content: ContentPayload,
}

/// A room in the dungeon graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    id: RoomId,
    coordinate: Option<Coordinate>,
    theme: Theme,
    depth: u32,
    expanded: bool,
    visited: bool,
    exits: BTreeMap<Direction, RoomId>,
    content: ContentPayload,
}

impl Room {
    fn from_draft(id: RoomId, draft: RoomDraft) -> Self {
        Self {
            id,
            coordinate: None,
            theme: draft.theme,
            depth: draft.depth,
            expanded: false,
            visited: false,
            exits: BTreeMap::new(),
            content: draft.content,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Generation depth from the origin.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether the generator has already populated this room's exits.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn exit(&self, direction: Direction) -> Option<RoomId> {
        self.exits.get(&direction).copied()
    }

    pub fn exits(&self) -> &BTreeMap<Direction, RoomId> {
        &self.exits
    }

    pub fn content(&self) -> &ContentPayload {
        &self.content
    }

    pub fn to_record(&self) -> Option<RoomRecord> {
        Some(RoomRecord {
            room_id: self.id,
            coordinate: self.coordinate?,
            theme: self.theme,
            depth: self.depth,
            expanded: self.expanded,
            visited: self.visited,
            exits: self.exits.clone(),
            content: self.content.clone(),
        })
    }
}

/// Registry of all rooms and the bidirectional id <-> coordinate index.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    by_coordinate: HashMap<Coordinate, RoomId>,
    origin: RoomId,
    ids: SmallRng,
}

impl RoomRegistry {
    /// Creates a registry holding only the origin room at (0,0,0).
    ///
    /// `id_seed` drives room id allocation.
    pub fn with_origin(id_seed: u64, theme: Theme, content: ContentPayload) -> Self {
        let mut ids = SmallRng::seed_from_u64(id_seed);
        let origin = RoomId::from_random_bytes(ids.gen());
        let mut room = Room::from_draft(
            origin,
            RoomDraft {
                theme,
                depth: 0,
                content,
            },
        );
        room.coordinate = Some(Coordinate::ORIGIN);

        Self {
            rooms: HashMap::from([(origin, room)]),
            by_coordinate: HashMap::from([(Coordinate::ORIGIN, origin)]),
            origin,
            ids,
        }
    }

    /// Allocates a fresh room with no coordinate and no exits.
    pub fn create_room(&mut self, draft: RoomDraft) -> RoomId {
        let id = loop {
            let candidate = RoomId::from_random_bytes(self.ids.gen());
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(id, Room::from_draft(id, draft));
        id
    }

    /// Places a room. Placing it again at the same coordinate is a no-op.
    pub fn assign_coordinate(
        &mut self,
        room_id: RoomId,
        coordinate: Coordinate,
    ) -> Result<(), RegistryError> {
        let room = self.require(room_id)?;
        if let Some(existing) = room.coordinate {
            if existing == coordinate {
                return Ok(());
            }
            return Err(RegistryError::AlreadyAssigned {
                room: room_id,
                existing,
            });
        }
        if let Some(&occupant) = self.by_coordinate.get(&coordinate) {
            return Err(RegistryError::CoordinateConflict {
                coordinate,
                occupant,
            });
        }

        self.by_coordinate.insert(coordinate, room_id);
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.coordinate = Some(coordinate);
        }
        Ok(())
    }

    /// Installs `a --direction--> b` and `b --opposite--> a` together.
    ///
    /// Re-committing an identical edge succeeds without change.
    pub fn commit_edge(
        &mut self,
        room_a: RoomId,
        direction: Direction,
        room_b: RoomId,
    ) -> Result<(), RegistryError> {
        if room_a == room_b {
            return Err(RegistryError::SelfLink(room_a));
        }
        let reverse = direction.opposite();
        let a = self.require(room_a)?;
        let b = self.require(room_b)?;

        match a.exit(direction) {
            Some(occupant) if occupant != room_b => {
                return Err(RegistryError::EdgeConflict {
                    room: room_a,
                    direction,
                    occupant,
                });
            }
            _ => {}
        }
        match b.exit(reverse) {
            Some(occupant) if occupant != room_a => {
                return Err(RegistryError::EdgeConflict {
                    room: room_b,
                    direction: reverse,
                    occupant,
                });
            }
            _ => {}
        }
        if let (Some(ca), Some(cb)) = (a.coordinate, b.coordinate) {
            if ca.step(direction) != cb {
                return Err(RegistryError::GeometryMismatch {
                    from: room_a,
                    direction,
                    to: room_b,
                });
            }
        }

        if let Some(a) = self.rooms.get_mut(&room_a) {
            a.exits.insert(direction, room_b);
        }
        if let Some(b) = self.rooms.get_mut(&room_b) {
            b.exits.insert(reverse, room_a);
        }
        Ok(())
    }

    /// Removes a room that never got linked, freeing its coordinate.
    pub fn discard_unlinked(&mut self, room_id: RoomId) -> Result<(), RegistryError> {
        let room = self.require(room_id)?;
        if !room.exits.is_empty() || self.origin == room_id {
            return Err(RegistryError::HasExits(room_id));
        }
        if let Some(room) = self.rooms.remove(&room_id) {
            if let Some(coordinate) = room.coordinate {
                self.by_coordinate.remove(&coordinate);
            }
        }
        Ok(())
    }

    pub fn lookup_by_coordinate(&self, coordinate: Coordinate) -> Option<RoomId> {
        self.by_coordinate.get(&coordinate).copied()
    }

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// Like [`room`](Self::room) but an unknown id is an error.
    pub fn require(&self, room_id: RoomId) -> Result<&Room, RegistryError> {
        self.rooms
            .get(&room_id)
            .ok_or(RegistryError::UnknownRoom(room_id))
    }

    pub fn coordinate_of(&self, room_id: RoomId) -> Option<Coordinate> {
        self.rooms.get(&room_id).and_then(|r| r.coordinate)
    }

    /// The room at (0,0,0). Never removed.
    pub fn origin(&self) -> RoomId {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub(crate) fn mark_visited(&mut self, room_id: RoomId) -> Result<(), RegistryError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RegistryError::UnknownRoom(room_id))?;
        room.visited = true;
        Ok(())
    }

    pub(crate) fn mark_expanded(&mut self, room_id: RoomId) -> Result<(), RegistryError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RegistryError::UnknownRoom(room_id))?;
        room.expanded = true;
        Ok(())
    }

    /// Checks every structural guarantee of the committed graph.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let origin = self.origin();
        let origin_room = self
            .rooms
            .get(&origin)
            .ok_or(InvariantViolation::MissingOrigin(origin))?;
        match origin_room.coordinate {
            Some(Coordinate::ORIGIN) => {}
            Some(found) => {
                return Err(InvariantViolation::OriginMisplaced {
                    room: origin,
                    found,
                })
            }
            None => return Err(InvariantViolation::UnplacedRoom(origin)),
        }

        for (&coordinate, &id) in &self.by_coordinate {
            match self.rooms.get(&id) {
                Some(room) if room.coordinate == Some(coordinate) => {}
                _ => return Err(InvariantViolation::IndexMismatch(coordinate)),
            }
        }
        for room in self.rooms.values() {
            let coordinate = room
                .coordinate
                .ok_or(InvariantViolation::UnplacedRoom(room.id))?;
            if self.by_coordinate.get(&coordinate) != Some(&room.id) {
                return Err(InvariantViolation::IndexMismatch(coordinate));
            }
        }

        for room in self.rooms.values() {
            let from = room
                .coordinate
                .ok_or(InvariantViolation::UnplacedRoom(room.id))?;
            for (&direction, &target) in &room.exits {
                let other = self
                    .rooms
                    .get(&target)
                    .ok_or(InvariantViolation::DanglingExit {
                        room: room.id,
                        direction,
                        target,
                    })?;
                if other.exit(direction.opposite()) != Some(room.id) {
                    return Err(InvariantViolation::MissingReverse {
                        room: room.id,
                        direction,
                        target,
                    });
                }
                if other.coordinate != Some(from.step(direction)) {
                    return Err(InvariantViolation::GeometryMismatch {
                        room: room.id,
                        direction,
                        target,
                    });
                }
            }
        }

        // Connectivity (BFS from origin)
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(origin);
        queue.push_back(origin);
        while let Some(current) = queue.pop_front() {
            if let Some(room) = self.rooms.get(&current) {
                for &next in room.exits.values() {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        if let Some(lost) = self.rooms.keys().find(|id| !seen.contains(id)) {
            return Err(InvariantViolation::Unreachable(*lost));
        }

        Ok(())
    }

    /// Serializable records, sorted by room id.
    pub fn records(&self) -> Vec<RoomRecord> {
        let mut records: Vec<RoomRecord> =
            self.rooms.values().filter_map(Room::to_record).collect();
        records.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        records
    }

    /// Rebuilds a registry from saved records and checks it.
    pub fn from_records(
        id_seed: u64,
        origin: RoomId,
        records: &[RoomRecord],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            rooms: HashMap::new(),
            by_coordinate: HashMap::new(),
            origin,
            ids: SmallRng::seed_from_u64(id_seed),
        };
        for record in records {
            if registry.rooms.contains_key(&record.room_id) {
                return Err(InvariantViolation::DuplicateRoom(record.room_id).into());
            }
            if let Some(&occupant) = registry.by_coordinate.get(&record.coordinate) {
                return Err(RegistryError::CoordinateConflict {
                    coordinate: record.coordinate,
                    occupant,
                });
            }
            registry.by_coordinate.insert(record.coordinate, record.room_id);
            registry.rooms.insert(
                record.room_id,
                Room {
                    id: record.room_id,
                    coordinate: Some(record.coordinate),
                    theme: record.theme,
                    depth: record.depth,
                    expanded: record.expanded,
                    visited: record.visited,
                    exits: record.exits.clone(),
                    content: record.content.clone(),
                },
            );
        }
        registry.verify()?;
        Ok(registry)
    }
}
