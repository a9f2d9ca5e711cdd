//! Colors and triangular tiles.
//!
//! This module contains:
//! - The six tile colors, one of which is a wildcard
//! - The `Tile` value type with its three named sides
//! - The four-character wire encoding used by the text protocol

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while decoding a tile or color from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("Tile must be exactly 4 characters, got {0:?}")]
    WrongLength(String),

    #[error("Unknown color letter {0:?}")]
    UnknownColor(char),

    #[error("Tile points must be a digit from 1 to 9, got {0:?}")]
    InvalidPoints(char),
}

/// Side colors of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    /// Joker color, fits next to anything
    White,
}

impl Color {
    /// All colors in wire-letter order
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::White,
    ];

    /// Whether this color is the wildcard
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Color::White)
    }

    /// Whether two sides with these colors may border each other
    pub fn is_valid_next_to(&self, other: Color) -> bool {
        *self == other || self.is_wildcard() || other.is_wildcard()
    }

    /// Single-letter wire code
    pub fn letter(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Purple => 'P',
            Color::White => 'W',
        }
    }

    /// Parse a single wire letter
    pub fn from_letter(letter: char) -> Result<Self, TileError> {
        match letter {
            'R' => Ok(Color::Red),
            'B' => Ok(Color::Blue),
            'G' => Ok(Color::Green),
            'Y' => Ok(Color::Yellow),
            'P' => Ok(Color::Purple),
            'W' => Ok(Color::White),
            other => Err(TileError::UnknownColor(other)),
        }
    }
}

/// One of the three named sides of a triangle.
///
/// Sides are named so that like-named sides of two neighbouring spaces always
/// touch, whatever the orientation of the spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Flat,
    Clockwise1,
    Clockwise2,
}

impl Side {
    /// All sides in cyclic order
    pub const ALL: [Side; 3] = [Side::Flat, Side::Clockwise1, Side::Clockwise2];
}

/// A triangular tile with three colored sides and a point value.
///
/// Tiles are immutable; rotating returns a new tile. Serialized as its
/// four-character wire form (e.g. `"RGB3"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    pub flat: Color,
    pub cw1: Color,
    pub cw2: Color,
    pub points: u8,
}

impl Tile {
    /// Create a tile from its sides in flat, clockwise1, clockwise2 order
    pub const fn new(flat: Color, cw1: Color, cw2: Color, points: u8) -> Self {
        Self {
            flat,
            cw1,
            cw2,
            points,
        }
    }

    /// Color of a named side
    pub fn side(&self, side: Side) -> Color {
        match side {
            Side::Flat => self.flat,
            Side::Clockwise1 => self.cw1,
            Side::Clockwise2 => self.cw2,
        }
    }

    /// The tile turned one third clockwise
    pub fn rotate120(&self) -> Tile {
        Tile::new(self.cw2, self.flat, self.cw1, self.points)
    }

    /// The tile turned two thirds clockwise
    pub fn rotate240(&self) -> Tile {
        self.rotate120().rotate120()
    }

    /// This tile in each of its three orientations, starting with itself
    pub fn rotations(&self) -> [Tile; 3] {
        [*self, self.rotate120(), self.rotate240()]
    }

    /// Whether `other` is this tile in some orientation
    pub fn is_equivalent(&self, other: &Tile) -> bool {
        self.rotations().contains(other)
    }

    /// Whether any side is the wildcard color
    pub fn is_joker(&self) -> bool {
        Side::ALL.iter().any(|&s| self.side(s).is_wildcard())
    }

    /// Four-character wire form
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse the four-character wire form
    pub fn decode(text: &str) -> Result<Tile, TileError> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != 4 {
            return Err(TileError::WrongLength(text.to_string()));
        }

        let flat = Color::from_letter(chars[0])?;
        let cw1 = Color::from_letter(chars[1])?;
        let cw2 = Color::from_letter(chars[2])?;
        let points = match chars[3].to_digit(10) {
            Some(d) if d > 0 => d as u8,
            _ => return Err(TileError::InvalidPoints(chars[3])),
        };

        Ok(Tile::new(flat, cw1, cw2, points))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.flat.letter(),
            self.cw1.letter(),
            self.cw2.letter(),
            self.points
        )
    }
}

impl FromStr for Tile {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tile::decode(s)
    }
}

impl TryFrom<String> for Tile {
    type Error = TileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tile::decode(&value)
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.encode()
    }
}
