//! World Generator
//!
//! Decides which exits a room gets and drives the [`SpatialNavigator`] to
//! commit them. Expansion is lazy: a room's exits are populated the first time
//! it is entered, or ahead of time by [`WorldGenerator::pregenerate`].
//!
//! Conflicts are skipped, never retried. A room may end up with fewer exits
//! than it asked for.

use std::collections::{HashSet, VecDeque};

use dungeon_model::{Direction, RoomId, Theme};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::ThemeConfig;
use crate::content::{ContentGenerationError, ContentPipeline, RoomContext};
use crate::navigator::{feasibility, Feasibility, LinkOutcome, NavigationError, SpatialNavigator};
use crate::registry::{RoomDraft, RoomRegistry};

/// One exit committed during an expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewExit {
    pub from: RoomId,
    pub direction: Direction,
    pub room: RoomId,
}

/// What an expansion (or a batch of them) did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionReport {
    pub rooms_expanded: usize,
    pub created: Vec<NewExit>,
    /// Exits that joined an already existing room.
    pub merged: Vec<NewExit>,
    /// Directions dropped because linking them would contradict the graph.
    pub conflicts: Vec<(RoomId, Direction)>,
    /// Directions dropped because the room budget was spent.
    pub declined: Vec<(RoomId, Direction)>,
    /// Content failures that were replaced by template text.
    pub fallbacks: Vec<(RoomId, ContentGenerationError)>,
}

impl ExpansionReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.merged.is_empty()
    }

    fn absorb(&mut self, other: ExpansionReport) {
        self.rooms_expanded += other.rooms_expanded;
        self.created.extend(other.created);
        self.merged.extend(other.merged);
        self.conflicts.extend(other.conflicts);
        self.declined.extend(other.declined);
        self.fallbacks.extend(other.fallbacks);
    }
}

/// Raw new-exit range for a room at `depth`, before theme clamping.
///
/// Rooms near the entrance branch freely; the deep levels thin out to
/// corridors.
pub fn depth_exit_range(depth: u32) -> (u32, u32) {
    match depth {
        0..=5 => (2, 3),
        6..=10 => (1, 3),
        11..=15 => (1, 2),
        16..=25 => (0, 2),
        _ => (0, 1),
    }
}

/// Probability that a room past the origin gets no new exits.
pub fn dead_end_chance(depth: u32) -> f64 {
    (f64::from(depth) * 0.01).min(0.15)
}

pub struct WorldGenerator {
    theme: Theme,
    config: ThemeConfig,
    content: ContentPipeline,
    rng: SmallRng,
}

impl WorldGenerator {
    pub fn new(theme: Theme, config: ThemeConfig, content: ContentPipeline, seed: u64) -> Self {
        Self {
            theme,
            config,
            content,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentPipeline {
        &self.content
    }

    /// Total room budget.
    pub fn max_rooms(&self) -> usize {
        self.config.max_rooms
    }

    /// Populates the exits of `room_id` once. Later calls are no-ops.
    pub fn expand(
        &mut self,
        registry: &mut RoomRegistry,
        room_id: RoomId,
    ) -> Result<ExpansionReport, NavigationError> {
        let limit = self.config.max_rooms;
        self.expand_within(registry, room_id, limit)
    }

    /// Breadth-first expansion from the origin until the dungeon holds
    /// `min(target, max_rooms)` rooms or nothing is left to expand.
    pub fn pregenerate(
        &mut self,
        registry: &mut RoomRegistry,
        target: usize,
    ) -> Result<ExpansionReport, NavigationError> {
        let limit = target.min(self.config.max_rooms);
        let mut report = ExpansionReport::default();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(registry.origin());
        queue.push_back(registry.origin());

        while let Some(room_id) = queue.pop_front() {
            if registry.len() >= limit {
                break;
            }
            report.absorb(self.expand_within(registry, room_id, limit)?);
            let room = registry.require(room_id)?;
            for &next in room.exits().values() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        info!(
            rooms = registry.len(),
            target = limit,
            created = report.created.len(),
            merged = report.merged.len(),
            "pregeneration finished"
        );
        Ok(report)
    }

    fn expand_within(
        &mut self,
        registry: &mut RoomRegistry,
        room_id: RoomId,
        limit: usize,
    ) -> Result<ExpansionReport, NavigationError> {
        let room = registry.require(room_id)?;
        let mut report = ExpansionReport::default();
        if room.is_expanded() {
            return Ok(report);
        }

        let depth = room.depth();
        let from_title = room.content().title().to_string();
        let is_origin = room_id == registry.origin();
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| room.exit(d).is_none())
            .collect();

        let wanted = if depth >= self.config.max_depth {
            debug!(room = %room_id.short(), depth, "max depth reached");
            0
        } else {
            self.desired_exits(depth, is_origin)
        };
        let order = self.weighted_order(open);

        let mut opened = 0;
        for direction in order {
            if opened >= wanted {
                break;
            }

            match feasibility(registry, room_id, direction)? {
                Feasibility::AlreadyLinked(_) => continue,
                Feasibility::Blocked { occupant } => {
                    debug!(room = %room_id.short(), %direction, occupant = %occupant.short(), "direction blocked");
                    report.conflicts.push((room_id, direction));
                    continue;
                }
                Feasibility::Open(_) if registry.len() >= limit => {
                    report.declined.push((room_id, direction));
                    continue;
                }
                Feasibility::Open(_) | Feasibility::Converges(_) => {}
            }

            let mut failure = None;
            let theme = self.theme;
            let content = &mut self.content;
            let title = from_title.clone();

            let result = SpatialNavigator::new(registry).link(room_id, direction, |target| {
                let context = RoomContext {
                    coordinate: target,
                    depth: depth + 1,
                    arrived_by: Some(direction),
                    from_title: Some(title),
                };
                let (payload, err) = content.produce(theme, &context);
                failure = err;
                Some(RoomDraft {
                    theme,
                    depth: depth + 1,
                    content: payload,
                })
            });

            match result {
                Ok(LinkOutcome::Created(room)) => {
                    opened += 1;
                    report.created.push(NewExit {
                        from: room_id,
                        direction,
                        room,
                    });
                    if let Some(err) = failure {
                        report.fallbacks.push((room, err));
                    }
                }
                Ok(LinkOutcome::Merged(room)) => {
                    opened += 1;
                    report.merged.push(NewExit {
                        from: room_id,
                        direction,
                        room,
                    });
                }
                Ok(LinkOutcome::Existing(_)) => {}
                Err(NavigationError::SpatialConflict { .. }) => {
                    report.conflicts.push((room_id, direction));
                }
                Err(NavigationError::Declined(_)) => {
                    report.declined.push((room_id, direction));
                }
                Err(other) => return Err(other),
            }
        }

        registry.mark_expanded(room_id)?;
        report.rooms_expanded = 1;
        debug!(
            room = %room_id.short(),
            depth,
            wanted,
            created = report.created.len(),
            merged = report.merged.len(),
            conflicts = report.conflicts.len(),
            "room expanded"
        );
        Ok(report)
    }

    /// New-exit count for one expansion.
    fn desired_exits(&mut self, depth: u32, is_origin: bool) -> usize {
        let (lo, hi) = depth_exit_range(depth);
        let lo = lo.clamp(self.config.min_exits, self.config.max_exits);
        let hi = hi.clamp(lo, self.config.max_exits);
        let mut count = self.rng.gen_range(lo..=hi);

        if is_origin {
            count = count.max(1);
        } else if self.rng.gen_bool(dead_end_chance(depth)) {
            count = 0;
        }
        count as usize
    }

    /// Weighted sampling without replacement. Zero-weight directions are
    /// never chosen.
    fn weighted_order(&mut self, mut candidates: Vec<Direction>) -> Vec<Direction> {
        let weights = self.config.weights;
        candidates.retain(|&d| weights.get(d) > 0.0);

        let mut order = Vec::with_capacity(candidates.len());
        while !candidates.is_empty() {
            let total: f32 = candidates.iter().map(|&d| weights.get(d)).sum();
            let mut roll = self.rng.gen_range(0.0..total);
            let mut index = candidates.len() - 1;
            for (i, &d) in candidates.iter().enumerate() {
                let w = weights.get(d);
                if roll < w {
                    index = i;
                    break;
                }
                roll -= w;
            }
            order.push(candidates.remove(index));
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectionWeights;
    use crate::content::{ContentSource, TemplateContent};
    use dungeon_model::{ContentPayload, Coordinate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Template content that counts how often it is asked.
    struct Counting(Arc<AtomicUsize>);

    impl ContentSource for Counting {
        fn generate_content(
            &self,
            theme: Theme,
            context: &RoomContext,
        ) -> Result<ContentPayload, ContentGenerationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(TemplateContent.render(theme, context))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn registry(seed: u64) -> RoomRegistry {
        let origin = TemplateContent.render(Theme::Fantasy, &RoomContext::origin());
        RoomRegistry::with_origin(seed, Theme::Fantasy, origin)
    }

    fn generator(config: ThemeConfig, seed: u64) -> WorldGenerator {
        WorldGenerator::new(Theme::Fantasy, config, ContentPipeline::templates(), seed)
    }

    #[test]
    fn test_depth_tiers() {
        assert_eq!(depth_exit_range(0), (2, 3));
        assert_eq!(depth_exit_range(5), (2, 3));
        assert_eq!(depth_exit_range(6), (1, 3));
        assert_eq!(depth_exit_range(15), (1, 2));
        assert_eq!(depth_exit_range(25), (0, 2));
        assert_eq!(depth_exit_range(26), (0, 1));
    }

    #[test]
    fn test_dead_end_chance_is_capped() {
        assert_eq!(dead_end_chance(0), 0.0);
        assert!((dead_end_chance(5) - 0.05).abs() < 1e-9);
        assert_eq!(dead_end_chance(100), 0.15);
    }

    #[test]
    fn test_origin_expansion_opens_exits() {
        let mut reg = registry(1);
        let origin = reg.origin();
        let mut gen = generator(ThemeConfig::default(), 1);

        let report = gen.expand(&mut reg, origin).unwrap();
        let exits = reg.room(origin).unwrap().exits().len();
        assert!((2..=3).contains(&exits), "origin got {} exits", exits);
        assert_eq!(report.created.len(), exits);
        assert!(reg.room(origin).unwrap().is_expanded());
        for exit in &report.created {
            assert_eq!(reg.room(exit.room).unwrap().depth(), 1);
        }
        reg.verify().unwrap();
    }

    #[test]
    fn test_expand_twice_is_noop() {
        let mut reg = registry(2);
        let origin = reg.origin();
        let mut gen = generator(ThemeConfig::default(), 2);
        gen.expand(&mut reg, origin).unwrap();
        let rooms = reg.len();

        let again = gen.expand(&mut reg, origin).unwrap();
        assert!(again.is_empty());
        assert_eq!(again.rooms_expanded, 0);
        assert_eq!(reg.len(), rooms);
    }

    #[test]
    fn test_budget_declines_new_rooms() {
        let mut reg = registry(3);
        let origin = reg.origin();
        let config = ThemeConfig {
            max_rooms: 1,
            ..ThemeConfig::default()
        };
        let mut gen = generator(config, 3);

        let report = gen.expand(&mut reg, origin).unwrap();
        assert!(report.created.is_empty());
        assert!(!report.declined.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_max_depth_zero_never_branches() {
        let mut reg = registry(4);
        let origin = reg.origin();
        let config = ThemeConfig {
            max_depth: 0,
            ..ThemeConfig::default()
        };
        let mut gen = generator(config, 4);

        let report = gen.expand(&mut reg, origin).unwrap();
        assert!(report.is_empty());
        assert!(reg.room(origin).unwrap().is_expanded());
    }

    #[test]
    fn test_zero_weight_directions_are_never_used() {
        let config = ThemeConfig {
            weights: DirectionWeights {
                up: 0.0,
                down: 0.0,
                ..DirectionWeights::default()
            },
            ..ThemeConfig::default()
        };
        let mut reg = registry(5);
        let mut gen = generator(config, 5);
        gen.pregenerate(&mut reg, 60).unwrap();

        for room in reg.rooms() {
            assert_eq!(room.coordinate().map(|c| c.z), Some(0));
        }
    }

    #[test]
    fn test_pregenerate_reaches_target_and_stays_consistent() {
        let mut reg = registry(6);
        let mut gen = generator(ThemeConfig::default(), 6);

        let report = gen.pregenerate(&mut reg, 40).unwrap();
        assert!(reg.len() <= 40);
        assert!(reg.len() >= 20, "only {} rooms", reg.len());
        assert_eq!(report.created.len() + 1, reg.len());
        reg.verify().unwrap();
    }

    #[test]
    fn test_pregenerate_respects_budget() {
        let mut reg = registry(7);
        let config = ThemeConfig {
            max_rooms: 10,
            ..ThemeConfig::default()
        };
        let mut gen = generator(config, 7);
        gen.pregenerate(&mut reg, 500).unwrap();
        assert!(reg.len() <= 10);
    }

    #[test]
    fn test_merges_are_counted() {
        // A tight horizontal lattice forces paths to meet.
        let config = ThemeConfig {
            min_exits: 3,
            max_exits: 4,
            weights: DirectionWeights {
                up: 0.0,
                down: 0.0,
                ..DirectionWeights::default()
            },
            ..ThemeConfig::default()
        };
        let mut reg = registry(8);
        let mut gen = generator(config, 8);
        let report = gen.pregenerate(&mut reg, 80).unwrap();

        assert!(!report.merged.is_empty());
        let occupied: HashSet<Coordinate> = reg.rooms().filter_map(|r| r.coordinate()).collect();
        assert_eq!(occupied.len(), reg.len());
        reg.verify().unwrap();
    }

    #[test]
    fn test_blocked_direction_skips_generation() {
        let mut reg = registry(9);
        let origin = reg.origin();
        let draft = || {
            Some(RoomDraft {
                theme: Theme::Fantasy,
                depth: 1,
                content: TemplateContent.render(Theme::Fantasy, &RoomContext::origin()),
            })
        };

        // Walk east, north, west so a room sits at (0,1,0) with its south
        // slot taken by an unplaced room.
        let mut nav = SpatialNavigator::new(&mut reg);
        let east = nav.link(origin, Direction::East, |_| draft()).unwrap().room_id();
        let corner = nav.link(east, Direction::North, |_| draft()).unwrap().room_id();
        let above = nav.link(corner, Direction::West, |_| draft()).unwrap().room_id();
        let squatter = reg.create_room(draft().unwrap());
        reg.commit_edge(above, Direction::South, squatter).unwrap();
        assert_eq!(
            feasibility(&reg, origin, Direction::North).unwrap(),
            Feasibility::Blocked { occupant: squatter }
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let config = ThemeConfig {
            min_exits: 1,
            max_exits: 1,
            weights: DirectionWeights {
                north: 1.0,
                south: 0.0,
                east: 0.0,
                west: 0.0,
                up: 0.0,
                down: 0.0,
            },
            ..ThemeConfig::default()
        };
        let content = ContentPipeline::with_primary(Box::new(Counting(Arc::clone(&calls))));
        let mut gen = WorldGenerator::new(Theme::Fantasy, config, content, 9);
        let rooms = reg.len();

        let report = gen.expand(&mut reg, origin).unwrap();
        assert_eq!(report.conflicts, vec![(origin, Direction::North)]);
        assert!(report.created.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(reg.len(), rooms);
        assert_eq!(reg.room(origin).unwrap().exit(Direction::North), None);
    }

    #[test]
    fn test_converging_direction_skips_generation() {
        let mut reg = registry(10);
        let origin = reg.origin();
        let draft = || {
            Some(RoomDraft {
                theme: Theme::Fantasy,
                depth: 1,
                content: TemplateContent.render(Theme::Fantasy, &RoomContext::origin()),
            })
        };
        let mut nav = SpatialNavigator::new(&mut reg);
        let east = nav.link(origin, Direction::East, |_| draft()).unwrap().room_id();
        let corner = nav.link(east, Direction::North, |_| draft()).unwrap().room_id();
        let above = nav.link(corner, Direction::West, |_| draft()).unwrap().room_id();

        let calls = Arc::new(AtomicUsize::new(0));
        let config = ThemeConfig {
            min_exits: 1,
            max_exits: 1,
            weights: DirectionWeights {
                north: 1.0,
                south: 0.0,
                east: 0.0,
                west: 0.0,
                up: 0.0,
                down: 0.0,
            },
            ..ThemeConfig::default()
        };
        let content = ContentPipeline::with_primary(Box::new(Counting(Arc::clone(&calls))));
        let mut gen = WorldGenerator::new(Theme::Fantasy, config, content, 10);

        let report = gen.expand(&mut reg, origin).unwrap();
        assert_eq!(report.merged.len(), 1);
        assert_eq!(report.merged[0].room, above);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        reg.verify().unwrap();
    }
}
