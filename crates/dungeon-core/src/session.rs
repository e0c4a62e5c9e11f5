//! Dungeon Session
//!
//! The explicit context a game loop drives: registry, exploration state,
//! generator and journal. One command runs to completion before the next;
//! snapshots are only taken between commands.

use dungeon_model::{
    Direction, DungeonSnapshot, EventDetail, RoomId, Theme, SNAPSHOT_FORMAT_VERSION,
};
use tracing::{error, info, warn};

use crate::config::DungeonConfig;
use crate::content::{ContentPipeline, RoomContext};
use crate::exploration::{ExplorationState, ExplorationStats, RoomView, TrackerError};
use crate::generator::{ExpansionReport, WorldGenerator};
use crate::journal::{Journal, JournalError};
use crate::map::{render_map, MapRows, Viewport};
use crate::navigator::NavigationError;
use crate::registry::{InvariantViolation, RegistryError, RoomRegistry};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The player asked for an exit that does not exist.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    /// The graph broke a structural guarantee. The session must stop.
    #[error("dungeon invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl SessionError {
    /// Whether the game loop must abort without saving.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::Tracker(TrackerError::NotLinked { .. }))
    }
}

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub room: RoomId,
    pub first_visit: bool,
    /// What entering the room generated.
    pub expansion: ExpansionReport,
}

pub struct DungeonSession {
    config: DungeonConfig,
    seed: u64,
    registry: RoomRegistry,
    exploration: ExplorationState,
    generator: WorldGenerator,
    journal: Journal,
}

/// Independent RNG streams per purpose, shifted by the room count so a
/// restored session does not replay ids it already handed out.
fn derive_seed(seed: u64, stream: u64, rooms: usize) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (rooms as u64).rotate_left(32)
}

const ID_STREAM: u64 = 1;
const LAYOUT_STREAM: u64 = 2;

/// Appends to `session.journal_path` when set.
fn open_journal(config: &DungeonConfig) -> Result<Journal, JournalError> {
    match &config.session.journal_path {
        Some(path) => Journal::append(path),
        None => Ok(Journal::null()),
    }
}

impl DungeonSession {
    /// Creates the origin room and expands it.
    pub fn new(
        config: DungeonConfig,
        seed: u64,
        mut content: ContentPipeline,
    ) -> Result<Self, SessionError> {
        let theme = config.session.theme;
        let (entrance, _) = content.produce(theme, &RoomContext::origin());
        let mut registry =
            RoomRegistry::with_origin(derive_seed(seed, ID_STREAM, 0), theme, entrance);
        let origin = registry.origin();
        registry.mark_visited(origin)?;

        let generator = WorldGenerator::new(
            theme,
            config.active_theme().clone(),
            content,
            derive_seed(seed, LAYOUT_STREAM, 0),
        );

        let journal = open_journal(&config)?;
        let mut session = Self {
            config,
            seed,
            registry,
            exploration: ExplorationState::new(origin),
            generator,
            journal,
        };
        session.expand(origin)?;
        info!(%theme, seed, rooms = session.registry.len(), "dungeon created");
        Ok(session)
    }

    /// Rebuilds a session from a snapshot, verifying the graph.
    ///
    /// Theme and budget come from the snapshot; branching settings from
    /// `config`.
    pub fn restore(
        config: DungeonConfig,
        snapshot: &DungeonSnapshot,
        content: ContentPipeline,
    ) -> Result<Self, SessionError> {
        let rooms = snapshot.rooms.len();
        let registry = RoomRegistry::from_records(
            derive_seed(snapshot.seed, ID_STREAM, rooms),
            snapshot.origin,
            &snapshot.rooms,
        )?;
        let exploration = ExplorationState::from_record(&snapshot.exploration, &registry)?;

        let mut theme_config = config.theme(snapshot.theme).clone();
        theme_config.max_rooms = snapshot.max_rooms;
        let generator = WorldGenerator::new(
            snapshot.theme,
            theme_config,
            content,
            derive_seed(snapshot.seed, LAYOUT_STREAM, rooms),
        );

        let mut config = config;
        config.session.theme = snapshot.theme;
        let journal = open_journal(&config)?;
        info!(theme = %snapshot.theme, rooms, "dungeon restored");
        Ok(Self {
            config,
            seed: snapshot.seed,
            registry,
            exploration,
            generator,
            journal,
        })
    }

    pub fn config(&self) -> &DungeonConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn theme(&self) -> Theme {
        self.generator.theme()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn exploration(&self) -> &ExplorationState {
        &self.exploration
    }

    pub fn current_room(&self) -> RoomId {
        self.exploration.current()
    }

    pub fn content_fallbacks(&self) -> u64 {
        self.generator.content().fallback_count()
    }

    /// Follows a committed exit, expanding the room on first entry.
    pub fn move_to(&mut self, direction: Direction) -> Result<MoveOutcome, SessionError> {
        let from = self.exploration.current();
        let target = self
            .registry
            .require(from)?
            .exit(direction)
            .ok_or(TrackerError::NotLinked { from, direction })?;
        let first_visit = !self.exploration.has_visited(target);

        self.exploration
            .visit(&mut self.registry, direction, target)?;
        self.note(EventDetail::Moved {
            from,
            to: target,
            direction,
            first_visit,
        });

        let expansion = self.expand(target)?;
        Ok(MoveOutcome {
            room: target,
            first_visit,
            expansion,
        })
    }

    pub fn look(&self) -> Result<RoomView, SessionError> {
        let room = self.registry.require(self.exploration.current())?;
        Ok(RoomView::of(room))
    }

    /// Map of visited rooms around the player.
    pub fn map(&self, viewport: Viewport) -> MapRows<'_> {
        render_map(
            &self.registry,
            self.exploration.visited(),
            self.exploration.current(),
            viewport,
        )
    }

    pub fn stats(&self) -> ExplorationStats {
        self.exploration.stats(self.generator.max_rooms())
    }

    /// Builds rooms breadth-first from the origin up to `target` rooms.
    pub fn pregenerate(&mut self, target: usize) -> Result<ExpansionReport, SessionError> {
        let report = self.generator.pregenerate(&mut self.registry, target)?;
        self.after_expansion(&report)?;
        Ok(report)
    }

    /// Serializable copy of the committed graph and exploration state.
    pub fn snapshot(&self) -> DungeonSnapshot {
        DungeonSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            theme: self.generator.theme(),
            seed: self.seed,
            max_rooms: self.generator.max_rooms(),
            origin: self.registry.origin(),
            rooms: self.registry.records(),
            exploration: self.exploration.to_record(),
        }
    }

    pub fn flush_journal(&mut self) -> Result<(), SessionError> {
        Ok(self.journal.flush()?)
    }

    fn expand(&mut self, room: RoomId) -> Result<ExpansionReport, SessionError> {
        let report = self.generator.expand(&mut self.registry, room)?;
        if report.rooms_expanded > 0 {
            self.after_expansion(&report)?;
        }
        Ok(report)
    }

    /// Books an expansion and checks the graph.
    fn after_expansion(&mut self, report: &ExpansionReport) -> Result<(), SessionError> {
        self.exploration.record_commit(report.created.len());

        for exit in &report.created {
            let Some(room) = self.registry.room(exit.room) else {
                continue;
            };
            if let Some(coordinate) = room.coordinate() {
                let detail = EventDetail::RoomCreated {
                    room: exit.room,
                    from: exit.from,
                    direction: exit.direction,
                    coordinate,
                    depth: room.depth(),
                    title: room.content().title().to_string(),
                };
                self.note(detail);
            }
        }
        for exit in &report.merged {
            if let Some(coordinate) = self.registry.coordinate_of(exit.room) {
                self.note(EventDetail::RoomsMerged {
                    room: exit.room,
                    from: exit.from,
                    direction: exit.direction,
                    coordinate,
                });
            }
        }
        for &(from, direction) in &report.conflicts {
            self.note(EventDetail::LinkConflict { from, direction });
        }
        for (room, err) in &report.fallbacks {
            self.note(EventDetail::ContentFallback {
                room: *room,
                reason: err.to_string(),
            });
        }

        if let Err(violation) = self.registry.verify() {
            error!(%violation, "dungeon graph is inconsistent");
            return Err(violation.into());
        }
        Ok(())
    }

    fn note(&mut self, detail: EventDetail) {
        let turn = self.exploration.moves();
        if let Err(e) = self.journal.record(turn, detail) {
            warn!(error = %e, "journal write failed");
        }
    }
}
