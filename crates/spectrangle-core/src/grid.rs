//! Triangular grid coordinates.
//!
//! The board is a big triangle cut into 36 small ones. Row `r` (0..6) holds
//! `2r + 1` spaces, with columns running from `-r` to `r`. Spaces are numbered
//! row by row, so the index of `(r, c)` is `r + r² + c`.
//!
//! Spaces alternate between pointing up and pointing down. Every space has
//! three sides named like the sides of a tile, and like-named sides of two
//! neighbouring spaces touch.

use crate::tile::Side;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows on the board
pub const ROWS: i32 = 6;

/// Number of spaces on the board
pub const BOARD_SIZE: usize = 36;

/// Raised for indices or coordinates that are not on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Index {0} is out of range")]
pub struct IndexOutOfRange(pub i64);

/// Row/column position of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriCoord {
    /// Row from the apex (0..6)
    pub row: i32,
    /// Column relative to the row's center (-row..=row)
    pub col: i32,
}

impl TriCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Coordinate of a board index
    pub fn from_index(index: i64) -> Result<Self, IndexOutOfRange> {
        if !(0..BOARD_SIZE as i64).contains(&index) {
            return Err(IndexOutOfRange(index));
        }
        let row = (index as f64).sqrt().floor() as i64;
        let col = index - (row * row + row);
        Ok(Self::new(row as i32, col as i32))
    }

    /// Board index of this coordinate.
    ///
    /// Columns outside `-row..=row` are rejected too; they would otherwise
    /// alias a space on the neighbouring row.
    pub fn to_index(&self) -> Result<usize, IndexOutOfRange> {
        let (row, col) = (self.row as i64, self.col as i64);
        let index = row + row * row + col;
        if !(0..ROWS as i64).contains(&row) || col.abs() > row {
            return Err(IndexOutOfRange(index));
        }
        if !(0..BOARD_SIZE as i64).contains(&index) {
            return Err(IndexOutOfRange(index));
        }
        Ok(index as usize)
    }

    /// Whether the space's tip points up (flat side at the bottom)
    pub fn points_up(&self) -> bool {
        (self.row + self.col).rem_euclid(2) == 0
    }

    /// Coordinate across the given side, which may be off the board
    pub fn across(&self, side: Side) -> TriCoord {
        let (r, c) = (self.row, self.col);
        if self.points_up() {
            match side {
                Side::Flat => TriCoord::new(r + 1, c),
                Side::Clockwise1 => TriCoord::new(r, c - 1),
                Side::Clockwise2 => TriCoord::new(r, c + 1),
            }
        } else {
            match side {
                Side::Flat => TriCoord::new(r - 1, c),
                Side::Clockwise1 => TriCoord::new(r, c + 1),
                Side::Clockwise2 => TriCoord::new(r, c - 1),
            }
        }
    }

    /// Neighbour index across each side, `None` where the side faces the edge
    pub fn neighbors(&self) -> [(Side, Option<usize>); 3] {
        Side::ALL.map(|side| (side, self.across(side).to_index().ok()))
    }
}

/// Coordinate of a board index
pub fn index_to_coordinate(index: i64) -> Result<TriCoord, IndexOutOfRange> {
    TriCoord::from_index(index)
}

/// Board index of a row/column pair
pub fn coordinate_to_index(row: i32, col: i32) -> Result<usize, IndexOutOfRange> {
    TriCoord::new(row, col).to_index()
}
