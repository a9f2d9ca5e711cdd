//! A peer's seat in one match: hand and score.

use crate::peer::ClientPeer;
use spectrangle_core::{Tile, TileBag, MAX_HAND_SIZE};
use std::sync::Arc;

/// A participant of a running match
#[derive(Debug)]
pub struct Player {
    pub peer: Arc<ClientPeer>,
    pub name: String,
    pub hand: Vec<Tile>,
    /// Can go negative after the end-of-match deduction
    pub score: i32,
}

impl Player {
    pub fn new(peer: Arc<ClientPeer>) -> Self {
        let name = peer.display_name();
        Self {
            peer,
            name,
            hand: Vec::with_capacity(MAX_HAND_SIZE),
            score: 0,
        }
    }

    /// Position in the hand of a tile equal to `tile` up to rotation
    pub fn find_tile(&self, tile: &Tile) -> Option<usize> {
        self.hand.iter().position(|held| held.is_equivalent(tile))
    }

    /// Take a tile out of the hand, matching up to rotation
    pub fn remove_tile(&mut self, tile: &Tile) -> Option<Tile> {
        let index = self.find_tile(tile)?;
        Some(self.hand.remove(index))
    }

    /// Draw until the hand is full or the bag is empty
    pub fn refill(&mut self, bag: &mut TileBag) {
        while self.hand.len() < MAX_HAND_SIZE {
            match bag.draw() {
                Ok(tile) => self.hand.push(tile),
                Err(_) => break,
            }
        }
    }

    /// Total points still held
    pub fn hand_value(&self) -> i32 {
        self.hand.iter().map(|t| t.points as i32).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::channel_pair;

    fn player() -> Player {
        let (connection, _remote) = channel_pair();
        Player::new(Arc::new(ClientPeer::new(Arc::new(connection))))
    }

    fn tile(code: &str) -> Tile {
        Tile::decode(code).unwrap()
    }

    #[test]
    fn test_refill_stops_at_four() {
        let mut bag = TileBag::from_tiles(["RRR6", "BBB6", "GGG6", "YYY6", "WWW1"].map(tile));
        let mut player = player();
        player.refill(&mut bag);
        assert_eq!(player.hand.len(), 4);
        assert_eq!(bag.remaining(), 1);
        assert_eq!(player.hand_value(), 24);
    }

    #[test]
    fn test_refill_short_when_bag_runs_out() {
        let mut bag = TileBag::from_tiles([tile("RGB3")]);
        let mut player = player();
        player.refill(&mut bag);
        assert_eq!(player.hand, vec![tile("RGB3")]);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_remove_matches_rotations() {
        let mut player = player();
        player.hand = vec![tile("RGB3"), tile("WWW1")];

        assert_eq!(player.find_tile(&tile("BRG3")), Some(0));
        assert_eq!(player.find_tile(&tile("RBG3")), None);
        assert_eq!(player.remove_tile(&tile("GBR3")), Some(tile("RGB3")));
        assert_eq!(player.hand, vec![tile("WWW1")]);
        assert_eq!(player.remove_tile(&tile("GBR3")), None);
    }
}
