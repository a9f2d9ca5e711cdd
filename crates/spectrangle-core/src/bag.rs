//! The stock of undealt tiles.

use crate::tile::{Color, Color::*, Tile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of tiles a player holds
pub const MAX_HAND_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BagError {
    #[error("The tile bag is empty")]
    EmptyBag,
}

/// How a bag picks the next tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BagOrder {
    /// Uniformly random, seeded from entropy
    #[default]
    Random,
    /// Uniformly random from a fixed seed (for deterministic replays)
    Seeded(u64),
    /// Insertion order, first in first out
    Ordered,
}

/// Multiset of tiles not yet dealt
#[derive(Debug, Clone)]
pub struct TileBag {
    tiles: Vec<Tile>,
    rng: Option<StdRng>,
}

const fn t(flat: Color, cw1: Color, cw2: Color, points: u8) -> Tile {
    Tile::new(flat, cw1, cw2, points)
}

/// The 36 tiles a match starts with
pub const STARTING_TILES: [Tile; 36] = [
    // Single color
    t(Red, Red, Red, 6),
    t(Blue, Blue, Blue, 6),
    t(Green, Green, Green, 6),
    t(Yellow, Yellow, Yellow, 6),
    // Two colors
    t(Red, Red, Yellow, 5),
    t(Red, Red, Purple, 5),
    t(Blue, Blue, Red, 5),
    t(Blue, Blue, Purple, 5),
    t(Green, Green, Red, 5),
    t(Green, Green, Blue, 5),
    t(Yellow, Yellow, Green, 5),
    t(Yellow, Yellow, Blue, 5),
    t(Purple, Purple, Yellow, 5),
    t(Purple, Purple, Blue, 5),
    t(Red, Red, Blue, 4),
    t(Red, Red, Green, 4),
    t(Blue, Blue, Green, 4),
    t(Blue, Blue, Yellow, 4),
    t(Green, Green, Yellow, 4),
    t(Green, Green, Purple, 4),
    t(Yellow, Yellow, Red, 4),
    t(Yellow, Yellow, Purple, 4),
    t(Purple, Purple, Red, 4),
    t(Purple, Purple, Green, 4),
    // Three colors
    t(Yellow, Blue, Purple, 3),
    t(Red, Green, Yellow, 3),
    t(Blue, Green, Purple, 3),
    t(Green, Red, Blue, 3),
    t(Blue, Red, Purple, 2),
    t(Yellow, Purple, Red, 2),
    t(Yellow, Green, Blue, 2),
    t(Green, Yellow, Purple, 1),
    t(Red, Yellow, Blue, 1),
    t(Purple, Red, Green, 1),
    t(Yellow, Purple, Blue, 1),
    // Joker
    t(White, White, White, 1),
];

impl TileBag {
    /// Empty bag drawing in random order
    pub fn new() -> Self {
        Self::with_order(BagOrder::Random)
    }

    /// Empty bag drawing in the given order
    pub fn with_order(order: BagOrder) -> Self {
        let rng = match order {
            BagOrder::Random => Some(StdRng::from_entropy()),
            BagOrder::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            BagOrder::Ordered => None,
        };
        Self {
            tiles: Vec::with_capacity(STARTING_TILES.len()),
            rng,
        }
    }

    /// Bag that draws its tiles in exactly this order
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut bag = Self::with_order(BagOrder::Ordered);
        bag.tiles.extend(tiles);
        bag
    }

    /// Seed the bag with the full starting set
    pub fn add_all_starting_tiles(&mut self) {
        self.tiles.extend_from_slice(&STARTING_TILES);
    }

    /// Return a tile to the bag
    pub fn put_back(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    /// Remove and return one tile
    pub fn draw(&mut self) -> Result<Tile, BagError> {
        if self.tiles.is_empty() {
            return Err(BagError::EmptyBag);
        }
        let tile = match self.rng.as_mut() {
            Some(rng) => {
                let index = rng.gen_range(0..self.tiles.len());
                self.tiles.swap_remove(index)
            }
            None => self.tiles.remove(0),
        };
        Ok(tile)
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileBag {
    fn default() -> Self {
        Self::new()
    }
}
