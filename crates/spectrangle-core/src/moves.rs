//! Placement requests.

use crate::tile::Tile;
use serde::{Deserialize, Serialize};

/// A tile, in a chosen orientation, aimed at a board index.
///
/// A move is only a request; the board decides whether it is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub tile: Tile,
    pub index: usize,
}

impl Move {
    pub const fn new(tile: Tile, index: usize) -> Self {
        Self { tile, index }
    }
}
