//! Match turn engine.
//!
//! A `Game` owns the players, board and bag of one match. It never blocks:
//! [`Game::advance`] looks at the current player's posted intent once and acts
//! on it, and [`Game::run`] calls it on a fixed tick.

use crate::peer::{ClientPeer, Intent, PeerState};
use crate::player::Player;
use crate::protocol::ServerMessage;
use spectrangle_core::{Board, Move, Tile, TileBag};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a match ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// Played out: final scores in turn order and the top scorers
    Finished {
        scores: Vec<(String, i32)>,
        winners: Vec<String>,
    },
    /// Abandoned because a player disconnected
    Aborted { left: String },
}

/// One running match
pub struct Game {
    id: Uuid,
    /// In turn order
    players: Vec<Player>,
    board: Board,
    bag: TileBag,
    current: usize,
    over: Arc<AtomicBool>,
    outcome: Option<GameOutcome>,
}

impl Game {
    /// Set up a match and prompt the first player.
    ///
    /// `bag` must already hold the starting tiles. Each player is dealt a full
    /// hand in the given order, then draws one reference tile; the turn order
    /// is by descending reference points, ties keeping the given order. The
    /// reference tiles go back into the bag.
    pub fn start(peers: Vec<Arc<ClientPeer>>, mut bag: TileBag) -> Self {
        let mut players: Vec<Player> = peers
            .into_iter()
            .map(|peer| {
                peer.reset(PeerState::AwaitingTurn);
                Player::new(peer)
            })
            .collect();

        for player in &mut players {
            player.refill(&mut bag);
        }

        let start = ServerMessage::Start {
            names: players.iter().map(|p| p.name.clone()).collect(),
        };

        let references: Vec<Option<Tile>> = players.iter().map(|_| bag.draw().ok()).collect();
        let mut seated: Vec<(Player, u8)> = players
            .into_iter()
            .zip(&references)
            .map(|(player, tile)| (player, tile.map_or(0, |t| t.points)))
            .collect();
        seated.sort_by_key(|(_, points)| Reverse(*points));
        for tile in references.into_iter().flatten() {
            bag.put_back(tile);
        }
        let players: Vec<Player> = seated.into_iter().map(|(player, _)| player).collect();

        let mut game = Self {
            id: Uuid::new_v4(),
            players,
            board: Board::new(),
            bag,
            current: 0,
            over: Arc::new(AtomicBool::new(false)),
            outcome: None,
        };

        let order = ServerMessage::Order {
            names: game.players.iter().map(|p| p.name.clone()).collect(),
        };
        info!(game = %game.id, "Match started: {}", order);
        game.broadcast(&start);
        game.broadcast(&order);
        game.prompt_current();
        game
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bag(&self) -> &TileBag {
        &self.bag
    }

    /// Player whose turn it is
    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn is_over(&self) -> bool {
        self.over.load(Ordering::Acquire)
    }

    /// Flag shared with whoever watches for the end of the match
    pub fn over_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.over)
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Peers taking part, in turn order
    pub fn peers(&self) -> Vec<Arc<ClientPeer>> {
        self.players.iter().map(|p| Arc::clone(&p.peer)).collect()
    }

    fn broadcast(&self, message: &ServerMessage) {
        for player in &self.players {
            player.peer.send(message);
        }
    }

    /// One iteration of the turn loop
    pub fn advance(&mut self) {
        if self.is_over() {
            return;
        }

        if let Some(gone) = self.players.iter().position(|p| p.peer.is_dead()) {
            self.abort(gone);
            return;
        }

        match self.players[self.current].peer.state() {
            PeerState::VerifyMove => self.process_move(),
            PeerState::VerifySkip => self.process_skip(),
            _ => {}
        }
    }

    /// Drive the match on a fixed tick until it is over
    pub async fn run(mut self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        while !self.is_over() {
            interval.tick().await;
            self.advance();
        }
        info!(game = %self.id, outcome = ?self.outcome, "Match over");
    }

    /// Hand the turn to the current player: move if anything fits, otherwise
    /// skip or exchange. Nothing fits and nothing left to draw ends the match.
    fn prompt_current(&mut self) {
        let next = if self.board.has_valid_moves(&self.players[self.current].hand) {
            PeerState::DecideMove
        } else if self.bag.is_empty() {
            self.finish();
            return;
        } else {
            PeerState::DecideSkip
        };

        let player = &self.players[self.current];
        if !player.peer.transition(PeerState::AwaitingTurn, next) {
            warn!(game = %self.id, player = %player.name, state = ?player.peer.state(), "Could not prompt player");
        }
        debug!(game = %self.id, player = %player.name, ?next, "Turn");
    }

    fn next_turn(&mut self) {
        self.current = (self.current + 1) % self.players.len();
        self.prompt_current();
    }

    fn process_move(&mut self) {
        let peer = Arc::clone(&self.players[self.current].peer);
        let Some(Intent::Move(mv)) = peer.intent_in(PeerState::VerifyMove) else {
            return;
        };

        match self.try_place(&mv) {
            Some(points) => {
                let player = &self.players[self.current];
                info!(game = %self.id, player = %player.name, tile = %mv.tile, index = mv.index, points, "Placed");
                self.broadcast(&ServerMessage::Move {
                    name: player.name.clone(),
                    tile: mv.tile,
                    index: mv.index,
                    points,
                });
                peer.transition(PeerState::VerifyMove, PeerState::AwaitingTurn);
                self.next_turn();
            }
            None => {
                peer.send(&ServerMessage::InvalidMove);
                peer.transition(PeerState::VerifyMove, PeerState::DecideMove);
            }
        }
    }

    /// Check a move against the hand and the board, and apply it
    fn try_place(&mut self, mv: &Move) -> Option<u32> {
        let player = &mut self.players[self.current];
        let slot = player.find_tile(&mv.tile)?;
        let points = match self.board.make_move(mv) {
            Ok(points) => points,
            Err(e) => {
                debug!(game = %self.id, player = %player.name, "Rejected: {}", e);
                return None;
            }
        };
        player.hand.remove(slot);
        player.score += points as i32;
        player.refill(&mut self.bag);
        Some(points)
    }

    fn process_skip(&mut self) {
        let peer = Arc::clone(&self.players[self.current].peer);
        let Some(Intent::Skip(exchange)) = peer.intent_in(PeerState::VerifySkip) else {
            return;
        };

        let player = &mut self.players[self.current];
        let message = match exchange {
            None => ServerMessage::Skip {
                name: player.name.clone(),
            },
            Some(tile) => {
                let Some(old) = player.remove_tile(&tile) else {
                    peer.send(&ServerMessage::InvalidMove);
                    peer.transition(PeerState::VerifySkip, PeerState::DecideSkip);
                    return;
                };
                // The given-up tile leaves the match, so exchanges drain the bag
                let new = self.bag.draw().ok();
                if let Some(new) = new {
                    player.hand.push(new);
                }
                ServerMessage::Replace {
                    name: player.name.clone(),
                    old,
                    new,
                }
            }
        };

        info!(game = %self.id, "{}", message);
        self.broadcast(&message);
        peer.transition(PeerState::VerifySkip, PeerState::AwaitingTurn);
        self.next_turn();
    }

    /// A participant disconnected: tell the others and stop without scoring
    fn abort(&mut self, gone: usize) {
        let name = self.players[gone].name.clone();
        warn!(game = %self.id, player = %name, "Player left, abandoning match");

        let message = ServerMessage::PlayerLeft { name: name.clone() };
        for (i, player) in self.players.iter().enumerate() {
            if i != gone {
                player.peer.send(&message);
                player.peer.reset(PeerState::AwaitingRequest);
            }
        }

        self.outcome = Some(GameOutcome::Aborted { left: name });
        self.over.store(true, Ordering::Release);
    }

    /// Deduct what is left in each hand, announce the result and hand every
    /// peer back to the lobby
    fn finish(&mut self) {
        for player in &mut self.players {
            player.score -= player.hand_value();
        }

        let scores: Vec<(String, i32)> = self
            .players
            .iter()
            .map(|p| (p.name.clone(), p.score))
            .collect();
        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        let winners: Vec<String> = scores
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(name, _)| name.clone())
            .collect();

        info!(game = %self.id, ?scores, ?winners, "Match finished");
        self.broadcast(&ServerMessage::End {
            scores: scores.clone(),
        });
        self.broadcast(&ServerMessage::Winner {
            names: winners.clone(),
        });

        for player in &self.players {
            player.peer.reset(PeerState::AwaitingRequest);
        }
        self.outcome = Some(GameOutcome::Finished { scores, winners });
        self.over.store(true, Ordering::Release);
    }
}
