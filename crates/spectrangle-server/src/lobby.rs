//! Lobby: name registration and matchmaking.
//!
//! New peers reach the lobby through a mailbox with room for a single peer.
//! Whoever accepts connections holds a [`LobbyHandle`] and waits for the slot
//! to be free before depositing the next peer; the lobby empties it once per
//! iteration. Everything else the lobby learns by looking at peer states.

use crate::game::Game;
use crate::peer::{ClientPeer, PeerState};
use crate::protocol::{ServerMessage, PLAYER_COUNTS};
use spectrangle_core::{BagOrder, TileBag};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("Lobby has shut down")]
    Closed,

    #[error("Lobby has not collected the previous client yet")]
    Busy,
}

/// Sending side of the lobby's mailbox
#[derive(Clone)]
pub struct LobbyHandle {
    tx: mpsc::Sender<Arc<ClientPeer>>,
}

impl LobbyHandle {
    /// Wait until the mailbox is free, then deposit a new peer
    pub async fn add_new_client(&self, peer: Arc<ClientPeer>) -> Result<(), LobbyError> {
        self.tx.send(peer).await.map_err(|_| LobbyError::Closed)
    }

    /// Blocking variant for acceptors running outside the async runtime
    pub fn add_new_client_blocking(&self, peer: Arc<ClientPeer>) -> Result<(), LobbyError> {
        self.tx.blocking_send(peer).map_err(|_| LobbyError::Closed)
    }

    /// Deposit a peer only if the mailbox is free right now
    pub fn try_add_new_client(&self, peer: Arc<ClientPeer>) -> Result<(), LobbyError> {
        self.tx.try_send(peer).map_err(|e| match e {
            TrySendError::Full(_) => LobbyError::Busy,
            TrySendError::Closed(_) => LobbyError::Closed,
        })
    }
}

/// What the lobby remembers about a match it started
struct MatchHandle {
    id: Uuid,
    peers: Vec<Arc<ClientPeer>>,
    over: Arc<AtomicBool>,
}

/// The single matchmaking coordinator
pub struct Lobby {
    inbox: mpsc::Receiver<Arc<ClientPeer>>,
    inbox_closed: bool,
    /// Every peer not currently in a match, in arrival order
    waiting: Vec<Arc<ClientPeer>>,
    matches: Vec<MatchHandle>,
    bag_order: BagOrder,
    matches_started: u64,
}

impl Lobby {
    pub fn new(bag_order: BagOrder) -> (Self, LobbyHandle) {
        let (tx, inbox) = mpsc::channel(1);
        let lobby = Self {
            inbox,
            inbox_closed: false,
            waiting: Vec::new(),
            matches: Vec::new(),
            bag_order,
            matches_started: 0,
        };
        (lobby, LobbyHandle { tx })
    }

    /// Peers outside any match
    pub fn waiting(&self) -> &[Arc<ClientPeer>] {
        &self.waiting
    }

    /// Matches started and not yet seen to be over
    pub fn running_matches(&self) -> usize {
        self.matches.len()
    }

    /// One lobby iteration. Returns the matches started during it; the
    /// caller is responsible for driving them.
    pub fn advance(&mut self) -> Vec<Game> {
        self.drain_mailbox();
        let vacated = self.drop_dead_peers();
        self.verify_names();
        let started = self.matchmake(vacated);
        self.collect_finished();
        started
    }

    /// Run the lobby on a fixed tick, spawning a task per match.
    ///
    /// Returns once every handle is gone and no peer is left.
    pub async fn run(mut self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        info!("Lobby running");
        loop {
            interval.tick().await;
            for game in self.advance() {
                tokio::spawn(game.run(tick));
            }
            if self.inbox_closed && self.waiting.is_empty() && self.matches.is_empty() {
                break;
            }
        }
        info!("Lobby stopped");
    }

    fn drain_mailbox(&mut self) {
        loop {
            match self.inbox.try_recv() {
                Ok(peer) => {
                    debug!(peer = %peer.id(), "Joined lobby");
                    self.waiting.push(peer);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.inbox_closed = true;
                    break;
                }
            }
        }
    }

    /// Forget dead peers; returns the player counts whose queue lost someone
    fn drop_dead_peers(&mut self) -> BTreeSet<u8> {
        let mut vacated = BTreeSet::new();
        self.waiting.retain(|peer| {
            let alive = !peer.is_dead();
            if !alive {
                info!(peer = %peer.id(), name = ?peer.name(), "Left lobby");
                if peer.state() == PeerState::WaitingForPlayers {
                    vacated.extend(peer.requested_players());
                }
            }
            alive
        });
        vacated
    }

    /// Names held by live peers, waiting or playing
    fn registered_names(&self) -> HashSet<String> {
        self.waiting
            .iter()
            .chain(self.matches.iter().flat_map(|m| m.peers.iter()))
            .filter(|peer| !peer.is_dead())
            .filter_map(|peer| peer.name())
            .collect()
    }

    fn verify_names(&mut self) {
        let mut taken = self.registered_names();

        for peer in &self.waiting {
            let Some(name) = peer.proposed_name() else {
                continue;
            };

            if taken.contains(&name) {
                if peer.reject_name() {
                    info!(peer = %peer.id(), %name, "Name taken");
                    peer.send(&ServerMessage::InvalidName);
                }
            } else if peer.accept_name() {
                info!(peer = %peer.id(), %name, "Welcome");
                taken.insert(name);
                peer.send(&ServerMessage::Welcome);
            }
        }
    }

    /// Peers queued for an `n`-player match, in arrival order
    fn queued(&self, n: u8) -> Vec<Arc<ClientPeer>> {
        self.waiting
            .iter()
            .filter(|peer| {
                peer.state() == PeerState::WaitingForPlayers && peer.requested_players() == Some(n)
            })
            .cloned()
            .collect()
    }

    fn matchmake(&mut self, mut changed: BTreeSet<u8>) -> Vec<Game> {
        for peer in &self.waiting {
            if let Some(n) = peer.requested_players() {
                if peer.transition(PeerState::StartWaiting, PeerState::WaitingForPlayers) {
                    changed.insert(n);
                }
            }
        }

        for n in changed {
            let group = self.queued(n);
            let message = ServerMessage::Waiting {
                names: group.iter().map(|p| p.display_name()).collect(),
            };
            for peer in &group {
                peer.send(&message);
            }
        }

        let mut started = Vec::new();
        for n in PLAYER_COUNTS {
            loop {
                let group = self.queued(n);
                if group.len() < n as usize {
                    break;
                }
                let chosen: Vec<Arc<ClientPeer>> = group.into_iter().take(n as usize).collect();
                self.waiting
                    .retain(|peer| !chosen.iter().any(|c| Arc::ptr_eq(c, peer)));
                started.push(self.launch(chosen));
            }
        }
        started
    }

    fn launch(&mut self, peers: Vec<Arc<ClientPeer>>) -> Game {
        let order = match self.bag_order {
            BagOrder::Seeded(seed) => BagOrder::Seeded(seed.wrapping_add(self.matches_started)),
            other => other,
        };
        self.matches_started += 1;

        let mut bag = TileBag::with_order(order);
        bag.add_all_starting_tiles();
        let game = Game::start(peers, bag);

        self.matches.push(MatchHandle {
            id: game.id(),
            peers: game.peers(),
            over: game.over_flag(),
        });
        game
    }

    fn collect_finished(&mut self) {
        let (done, running): (Vec<MatchHandle>, Vec<MatchHandle>) = std::mem::take(&mut self.matches)
            .into_iter()
            .partition(|m| m.over.load(Ordering::Acquire));
        self.matches = running;

        for handle in done {
            debug!(game = %handle.id, "Collecting players");
            self.waiting
                .extend(handle.peers.into_iter().filter(|peer| !peer.is_dead()));
        }
    }
}
