//! Spatial Navigator
//!
//! The only writer of links between rooms. Every link it commits keeps the
//! graph reciprocal and the coordinate index injective:
//!
//! - target occupied and already linked: returned as is
//! - target occupied, not linked: the two paths converge on the existing room
//! - target free: a new room is generated, placed and linked in one step
//!
//! A contradiction is reported as [`NavigationError::SpatialConflict`] and
//! never resolved by overwriting.

use dungeon_model::{Coordinate, Direction, RoomId};
use tracing::{debug, warn};

use crate::registry::{RegistryError, RoomDraft, RoomRegistry};

/// Errors from [`SpatialNavigator::link`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// The link would contradict an existing one. Pick another direction.
    #[error("cannot link {from} {direction}: {cause}")]
    SpatialConflict {
        from: RoomId,
        direction: Direction,
        #[source]
        cause: RegistryError,
    },
    #[error("room {0} has no coordinate")]
    Unplaced(RoomId),
    /// The room generator refused to build at this coordinate.
    #[error("generation at {0} was declined")]
    Declined(Coordinate),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// How a successful link was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The exit already existed.
    Existing(RoomId),
    /// The exit now leads to a room that was already at the target coordinate.
    Merged(RoomId),
    /// A new room was generated at the target coordinate.
    Created(RoomId),
}

impl LinkOutcome {
    pub fn room_id(self) -> RoomId {
        match self {
            LinkOutcome::Existing(id) | LinkOutcome::Merged(id) | LinkOutcome::Created(id) => id,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, LinkOutcome::Created(_))
    }
}

/// What linking in a direction would do, without doing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    AlreadyLinked(RoomId),
    /// The target coordinate holds a room that can accept the reverse exit.
    Converges(RoomId),
    /// Nothing at the target coordinate.
    Open(Coordinate),
    /// Linking would contradict an existing exit.
    Blocked { occupant: RoomId },
}

/// Consistency layer over the registry.
pub struct SpatialNavigator<'a> {
    registry: &'a mut RoomRegistry,
}

impl<'a> SpatialNavigator<'a> {
    pub fn new(registry: &'a mut RoomRegistry) -> Self {
        Self { registry }
    }

    /// Predicts the outcome of [`link`](Self::link) for `direction`.
    pub fn feasibility(
        &self,
        from: RoomId,
        direction: Direction,
    ) -> Result<Feasibility, NavigationError> {
        feasibility(self.registry, from, direction)
    }

    /// Links `from` to whatever lies one step in `direction`.
    ///
    /// `generate` is only called when the target coordinate is empty; it gets
    /// that coordinate and returns the new room's draft, or `None` to decline.
    pub fn link<F>(
        &mut self,
        from: RoomId,
        direction: Direction,
        generate: F,
    ) -> Result<LinkOutcome, NavigationError>
    where
        F: FnOnce(Coordinate) -> Option<RoomDraft>,
    {
        let target = self.target_of(from, direction)?;

        if let Some(existing) = self.registry.lookup_by_coordinate(target) {
            return self.converge(from, direction, existing);
        }
        if let Some(occupant) = self.registry.require(from)?.exit(direction) {
            // An exit that leads off-lattice; the registry forbids this.
            return Err(self.conflict(from, direction, occupant));
        }

        let draft = generate(target).ok_or(NavigationError::Declined(target))?;
        let new_room = self.registry.create_room(draft);

        if let Err(err) = self.registry.assign_coordinate(new_room, target) {
            self.registry.discard_unlinked(new_room)?;
            return match err {
                RegistryError::CoordinateConflict { occupant, .. } => {
                    debug!(%target, occupant = %occupant.short(), "target claimed during generation, converging");
                    self.converge(from, direction, occupant)
                }
                other => Err(other.into()),
            };
        }

        if let Err(err) = self.registry.commit_edge(from, direction, new_room) {
            self.registry.discard_unlinked(new_room)?;
            return Err(self.classify(from, direction, err));
        }

        debug!(
            from = %from.short(),
            %direction,
            room = %new_room.short(),
            coordinate = %target,
            "room created"
        );
        Ok(LinkOutcome::Created(new_room))
    }

    fn target_of(&self, from: RoomId, direction: Direction) -> Result<Coordinate, NavigationError> {
        let origin = self
            .registry
            .require(from)?
            .coordinate()
            .ok_or(NavigationError::Unplaced(from))?;
        Ok(origin.step(direction))
    }

    fn converge(
        &mut self,
        from: RoomId,
        direction: Direction,
        existing: RoomId,
    ) -> Result<LinkOutcome, NavigationError> {
        if self.registry.require(from)?.exit(direction) == Some(existing) {
            return Ok(LinkOutcome::Existing(existing));
        }
        match self.registry.commit_edge(from, direction, existing) {
            Ok(()) => {
                debug!(from = %from.short(), %direction, room = %existing.short(), "paths converged");
                Ok(LinkOutcome::Merged(existing))
            }
            Err(err) => Err(self.classify(from, direction, err)),
        }
    }

    fn classify(&self, from: RoomId, direction: Direction, err: RegistryError) -> NavigationError {
        match err {
            RegistryError::EdgeConflict { .. }
            | RegistryError::SelfLink(_)
            | RegistryError::GeometryMismatch { .. } => {
                warn!(from = %from.short(), %direction, error = %err, "spatial conflict");
                NavigationError::SpatialConflict {
                    from,
                    direction,
                    cause: err,
                }
            }
            other => other.into(),
        }
    }

    fn conflict(&self, from: RoomId, direction: Direction, occupant: RoomId) -> NavigationError {
        self.classify(
            from,
            direction,
            RegistryError::EdgeConflict {
                room: from,
                direction,
                occupant,
            },
        )
    }
}

/// Read-only prediction shared by the navigator and the generator.
pub fn feasibility(
    registry: &RoomRegistry,
    from: RoomId,
    direction: Direction,
) -> Result<Feasibility, NavigationError> {
    let room = registry.require(from)?;
    let target = room
        .coordinate()
        .ok_or(NavigationError::Unplaced(from))?
        .step(direction);

    match (registry.lookup_by_coordinate(target), room.exit(direction)) {
        (Some(existing), Some(linked)) if existing == linked => {
            Ok(Feasibility::AlreadyLinked(existing))
        }
        (_, Some(linked)) => Ok(Feasibility::Blocked { occupant: linked }),
        (Some(existing), None) => {
            let reverse = registry.require(existing)?.exit(direction.opposite());
            match reverse {
                Some(occupant) if occupant != from => Ok(Feasibility::Blocked { occupant }),
                _ => Ok(Feasibility::Converges(existing)),
            }
        }
        (None, None) => Ok(Feasibility::Open(target)),
    }
}
