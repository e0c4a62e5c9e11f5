//! ASCII map of the explored dungeon.
//!
//! One z-slice, north at the top, centered on the player. Rows are built on
//! demand by [`MapRows`]; cloning the iterator restarts the map.
//!
//! ```text
//! S-#
//! | |
//! #-@
//! ```

use std::collections::BTreeSet;
use std::iter::FusedIterator;

use dungeon_model::{Coordinate, Direction, RoomId};

use crate::registry::{Room, RoomRegistry};

/// Map window, in rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    /// Slice to draw. Defaults to the current room's level.
    pub z: Option<i32>,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            z: None,
        }
    }

    pub fn at_level(mut self, z: i32) -> Self {
        self.z = Some(z);
        self
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(9, 7)
    }
}

pub const CURRENT: char = '@';
pub const START: char = 'S';
pub const ROOM: char = '#';
pub const STAIRS_UP: char = '^';
pub const STAIRS_DOWN: char = 'v';
pub const STAIRS_BOTH: char = '%';

/// Lazy, finite sequence of map rows.
#[derive(Clone)]
pub struct MapRows<'a> {
    registry: &'a RoomRegistry,
    visited: &'a BTreeSet<RoomId>,
    current: RoomId,
    left: i32,
    top: i32,
    z: i32,
    width: usize,
    row: usize,
    rows: usize,
}

/// Starts a map of the rooms in `visited`, centered on `current`.
pub fn render_map<'a>(
    registry: &'a RoomRegistry,
    visited: &'a BTreeSet<RoomId>,
    current: RoomId,
    viewport: Viewport,
) -> MapRows<'a> {
    let center = registry.coordinate_of(current).unwrap_or(Coordinate::ORIGIN);
    let width = viewport.width.max(1);
    let height = viewport.height.max(1);
    MapRows {
        registry,
        visited,
        current,
        left: center.x - (width / 2) as i32,
        top: center.y + (height / 2) as i32,
        z: viewport.z.unwrap_or(center.z),
        width,
        row: 0,
        rows: height * 2 - 1,
    }
}

impl<'a> MapRows<'a> {
    /// A visited room at (x, y) on this slice.
    fn visited_at(&self, x: i32, y: i32) -> Option<&'a Room> {
        let id = self.registry.lookup_by_coordinate(Coordinate::new(x, y, self.z))?;
        if !self.visited.contains(&id) {
            return None;
        }
        self.registry.room(id)
    }

    fn glyph(&self, room: &Room) -> char {
        if room.id() == self.current {
            return CURRENT;
        }
        if room.id() == self.registry.origin() {
            return START;
        }
        match (
            room.exit(Direction::Up).is_some(),
            room.exit(Direction::Down).is_some(),
        ) {
            (true, true) => STAIRS_BOTH,
            (true, false) => STAIRS_UP,
            (false, true) => STAIRS_DOWN,
            (false, false) => ROOM,
        }
    }

    /// Is there a committed exit between two neighbouring cells, seen from
    /// either visited side?
    fn connected(&self, (x, y): (i32, i32), direction: Direction) -> bool {
        let step = Coordinate::new(x, y, self.z).step(direction);
        let here = self
            .visited_at(x, y)
            .is_some_and(|room| room.exit(direction).is_some());
        let there = self
            .visited_at(step.x, step.y)
            .is_some_and(|room| room.exit(direction.opposite()).is_some());
        here || there
    }

    fn room_row(&self, y: i32) -> String {
        let mut line = String::with_capacity(self.width * 2);
        for i in 0..self.width {
            let x = self.left + i as i32;
            line.push(self.visited_at(x, y).map_or(' ', |room| self.glyph(room)));
            if i + 1 < self.width {
                line.push(if self.connected((x, y), Direction::East) { '-' } else { ' ' });
            }
        }
        line
    }

    fn connector_row(&self, y: i32) -> String {
        let mut line = String::with_capacity(self.width * 2);
        for i in 0..self.width {
            let x = self.left + i as i32;
            line.push(if self.connected((x, y), Direction::South) { '|' } else { ' ' });
            if i + 1 < self.width {
                line.push(' ');
            }
        }
        line
    }
}

impl Iterator for MapRows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.row >= self.rows {
            return None;
        }
        let y = self.top - (self.row / 2) as i32;
        let line = if self.row % 2 == 0 {
            self.room_row(y)
        } else {
            self.connector_row(y)
        };
        self.row += 1;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rows - self.row;
        (left, Some(left))
    }
}

impl ExactSizeIterator for MapRows<'_> {}
impl FusedIterator for MapRows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::SpatialNavigator;
    use crate::registry::RoomDraft;
    use dungeon_model::{ContentPayload, Theme};

    fn draft() -> Option<RoomDraft> {
        Some(RoomDraft {
            theme: Theme::Fantasy,
            depth: 1,
            content: ContentPayload::validated("Room", "A room.", vec![], vec![]).unwrap(),
        })
    }

    /// origin -> east -> north, plus an unvisited room west of the origin.
    fn world() -> (RoomRegistry, BTreeSet<RoomId>, RoomId) {
        let payload = ContentPayload::validated("Start", "The start.", vec![], vec![]).unwrap();
        let mut reg = RoomRegistry::with_origin(5, Theme::Fantasy, payload);
        let origin = reg.origin();
        let mut nav = SpatialNavigator::new(&mut reg);
        let east = nav.link(origin, Direction::East, |_| draft()).unwrap().room_id();
        let corner = nav.link(east, Direction::North, |_| draft()).unwrap().room_id();
        nav.link(origin, Direction::West, |_| draft()).unwrap();
        let visited = BTreeSet::from([origin, east, corner]);
        (reg, visited, corner)
    }

    #[test]
    fn test_map_draws_visited_rooms_and_connectors() {
        let (reg, visited, corner) = world();
        let rows: Vec<String> = render_map(&reg, &visited, corner, Viewport::new(3, 3)).collect();
        // Centered on the corner at (1,1): x spans 0..=2, y spans 2 down to 0.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "     ");
        assert_eq!(rows[2], "  @  ");
        assert_eq!(rows[3], "  |  ");
        assert_eq!(rows[4], "S-#  ");
    }

    #[test]
    fn test_unvisited_rooms_are_hidden() {
        let (reg, visited, _corner) = world();
        let origin = reg.origin();
        let rows: Vec<String> = render_map(&reg, &visited, origin, Viewport::new(3, 1)).collect();
        // The west room exists but was never visited; its connector still shows.
        assert_eq!(rows, vec![" -@-#".to_string()]);
    }

    #[test]
    fn test_map_is_restartable() {
        let (reg, visited, corner) = world();
        let rows = render_map(&reg, &visited, corner, Viewport::default());
        let first: Vec<String> = rows.clone().collect();
        let second: Vec<String> = rows.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 13);
        assert!(first.iter().all(|row| row.chars().count() == 17));
    }

    #[test]
    fn test_other_level_is_empty() {
        let (reg, visited, corner) = world();
        let rows = render_map(&reg, &visited, corner, Viewport::new(3, 3).at_level(1));
        assert!(rows.into_iter().all(|row| row.trim().is_empty()));
    }
}
