//! Game board representation, placement rules and scoring.
//!
//! This module contains:
//! - `BoardSpace` with its fixed score multiplier
//! - `Board`, the 36-space triangular grid
//! - Move validation and scoring

use crate::grid::{IndexOutOfRange, TriCoord, BOARD_SIZE};
use crate::moves::Move;
use crate::tile::{Side, Tile};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score multipliers of the bonus spaces, by index
pub const BONUS_SPACES: [(usize, u32); 9] = [
    (2, 3),
    (10, 2),
    (11, 4),
    (13, 4),
    (14, 2),
    (20, 4),
    (26, 3),
    (30, 2),
    (34, 3),
];

/// Errors raised by board operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    IndexOutOfRange(#[from] IndexOutOfRange),

    #[error("Invalid move: {0:?}")]
    InvalidMove(Move),
}

/// A single space on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSpace {
    pub id: usize,
    /// Fixed at construction, 1 for normal spaces
    pub multiplier: u32,
    pub tile: Option<Tile>,
}

impl BoardSpace {
    fn new(id: usize) -> Self {
        let multiplier = BONUS_SPACES
            .iter()
            .find(|(index, _)| *index == id)
            .map_or(1, |(_, m)| *m);
        Self {
            id,
            multiplier,
            tile: None,
        }
    }

    pub fn is_bonus(&self) -> bool {
        self.multiplier > 1
    }

    pub fn is_occupied(&self) -> bool {
        self.tile.is_some()
    }
}

/// The triangular game board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    spaces: Vec<BoardSpace>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            spaces: (0..BOARD_SIZE).map(BoardSpace::new).collect(),
        }
    }

    /// Space at an index
    pub fn space(&self, index: usize) -> Result<&BoardSpace, BoardError> {
        self.spaces
            .get(index)
            .ok_or(BoardError::IndexOutOfRange(IndexOutOfRange(index as i64)))
    }

    /// All spaces in index order
    pub fn spaces(&self) -> &[BoardSpace] {
        &self.spaces
    }

    /// True until the first tile is placed
    pub fn is_empty(&self) -> bool {
        self.spaces.iter().all(|s| !s.is_occupied())
    }

    pub fn occupied_count(&self) -> usize {
        self.spaces.iter().filter(|s| s.is_occupied()).count()
    }

    /// Occupied neighbours of an index, paired with the tile the placed
    /// tile would have to match across each shared side
    fn occupied_neighbors(&self, index: usize) -> Vec<(Side, Tile)> {
        let Ok(coord) = TriCoord::from_index(index as i64) else {
            return Vec::new();
        };
        coord
            .neighbors()
            .into_iter()
            .filter_map(|(side, neighbor)| {
                let tile = self.spaces[neighbor?].tile?;
                Some((side, tile))
            })
            .collect()
    }

    /// Whether a move may be played on the current board
    pub fn is_move_valid(&self, mv: &Move) -> bool {
        let Some(space) = self.spaces.get(mv.index) else {
            return false;
        };

        // First tile of the match may not land on a bonus space
        if self.is_empty() {
            return !space.is_bonus();
        }

        if space.is_occupied() {
            return false;
        }

        let neighbors = self.occupied_neighbors(mv.index);
        !neighbors.is_empty()
            && neighbors
                .iter()
                .all(|(side, other)| mv.tile.side(*side).is_valid_next_to(other.side(*side)))
    }

    /// Place a tile and return the points it scores.
    ///
    /// Score is `points × multiplier × max(1, occupied neighbours)`. Invalid
    /// moves leave the board untouched.
    pub fn make_move(&mut self, mv: &Move) -> Result<u32, BoardError> {
        if mv.index >= BOARD_SIZE {
            return Err(IndexOutOfRange(mv.index as i64).into());
        }
        if !self.is_move_valid(mv) {
            return Err(BoardError::InvalidMove(*mv));
        }

        let neighbors = self.occupied_neighbors(mv.index).len().max(1) as u32;
        let space = &mut self.spaces[mv.index];
        let score = mv.tile.points as u32 * space.multiplier * neighbors;
        space.tile = Some(mv.tile);
        Ok(score)
    }

    /// Every valid placement of a tile, over all rotations and indices
    pub fn valid_moves(&self, tile: &Tile) -> Vec<Move> {
        tile.rotations()
            .into_iter()
            .flat_map(|rotated| (0..BOARD_SIZE).map(move |index| Move::new(rotated, index)))
            .filter(|mv| self.is_move_valid(mv))
            .collect()
    }

    /// Whether any tile of a hand can be placed somewhere
    pub fn has_valid_moves(&self, hand: &[Tile]) -> bool {
        hand.iter().any(|tile| {
            tile.rotations().iter().any(|rotated| {
                (0..BOARD_SIZE).any(|index| self.is_move_valid(&Move::new(*rotated, index)))
            })
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
