//! Spectrangle - a triangle tile-matching game engine
//!
//! This crate provides the rules of the game, independent of any network
//! session:
//! - Colors and three-sided tiles with their wire encoding
//! - The triangular coordinate system of the board
//! - Board representation with move validation and scoring
//! - The tile bag
//!
//! # Modules
//!
//! - [`tile`]: Colors, sides and tiles
//! - [`grid`]: Index/coordinate conversion and adjacency
//! - [`board`]: Placement rules and scoring
//! - [`bag`]: Undealt tiles and the starting set
//! - [`moves`]: Placement requests

pub mod bag;
pub mod board;
pub mod grid;
pub mod moves;
pub mod tile;

// Re-export commonly used types
pub use bag::{BagError, BagOrder, TileBag, MAX_HAND_SIZE, STARTING_TILES};
pub use board::{Board, BoardError, BoardSpace, BONUS_SPACES};
pub use grid::{coordinate_to_index, index_to_coordinate, IndexOutOfRange, TriCoord, BOARD_SIZE};
pub use moves::Move;
pub use tile::{Color, Side, Tile, TileError};
