//! Coordinate Model
//!
//! Directions, their inverse, and the integer displacement each one applies.
//!
//! # Example
//!
//! ```
//! use dungeon_model::{Coordinate, Direction};
//!
//! let there = Coordinate::ORIGIN.step(Direction::North);
//! assert_eq!(there, Coordinate::new(0, 1, 0));
//! assert_eq!(there.step(Direction::North.opposite()), Coordinate::ORIGIN);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A direction a room exit can face.
///
/// +Y is north, +X is east, +Z is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// Every direction, in canonical order.
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns the direction that leads back.
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Returns the (dx, dy, dz) displacement of one step in this direction.
    pub fn displacement(self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 1, 0),
            Direction::South => (0, -1, 0),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }

    /// Single-letter abbreviation used by the command line.
    pub fn short(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::South => 's',
            Direction::East => 'e',
            Direction::West => 'w',
            Direction::Up => 'u',
            Direction::Down => 'd',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
            Direction::East => write!(f, "east"),
            Direction::West => write!(f, "west"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Error returned when a string names no direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction: '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// An integer position in the dungeon lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    /// Where the origin room lives.
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The coordinate one step away in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.displacement();
        self.offset(dx, dy, dz)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn test_displacements_cancel() {
        for d in Direction::ALL {
            let (dx, dy, dz) = d.displacement();
            let (ox, oy, oz) = d.opposite().displacement();
            assert_eq!((dx + ox, dy + oy, dz + oz), (0, 0, 0));
        }
    }

    #[test]
    fn test_displacements_unique() {
        let mut seen = std::collections::HashSet::new();
        for d in Direction::ALL {
            assert!(seen.insert(d.displacement()), "duplicate vector for {}", d);
        }
    }

    #[test]
    fn test_step_and_back() {
        let start = Coordinate::new(3, -2, 1);
        for d in Direction::ALL {
            assert_eq!(start.step(d).step(d.opposite()), start);
        }
    }

    #[test]
    fn test_north_is_positive_y() {
        assert_eq!(Coordinate::ORIGIN.step(Direction::North), Coordinate::new(0, 1, 0));
        assert_eq!(Coordinate::ORIGIN.step(Direction::Down), Coordinate::new(0, 0, -1));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("north".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("W".parse::<Direction>().unwrap(), Direction::West);
        assert_eq!(" up ".parse::<Direction>().unwrap(), Direction::Up);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serialization() {
        assert_eq!(serde_json::to_string(&Direction::East).unwrap(), r#""east""#);
        let d: Direction = serde_json::from_str(r#""down""#).unwrap();
        assert_eq!(d, Direction::Down);
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(1, -4, 0).to_string(), "(1, -4, 0)");
    }
}
