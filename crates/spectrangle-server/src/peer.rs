//! One connected client and its protocol state machine.
//!
//! A `ClientPeer` is shared between its own reader thread, which turns incoming
//! lines into intents, and whichever coordinator (lobby or match) currently
//! looks after it. All mutable fields live in one slot behind a mutex. The
//! reader only moves the peer out of states where it is waiting for the
//! client; the coordinator only acts on an intent through [`ClientPeer::intent_in`],
//! which yields nothing unless the peer still sits in the state the intent
//! belongs to.

use crate::connection::Connection;
use crate::protocol::{ClientCommand, ServerMessage};
use spectrangle_core::{Move, Tile};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a peer is in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    /// Waiting for `connect <name>`
    AwaitingConnect,
    /// Name proposed, lobby has not decided yet
    VerifyName,
    /// Named and idle, waiting for `request <n>`
    AwaitingRequest,
    /// Request posted, lobby has not queued it yet
    StartWaiting,
    /// Queued for a match
    WaitingForPlayers,
    /// In a match, someone else's turn
    AwaitingTurn,
    /// Our turn and we have a legal placement
    DecideMove,
    /// Placement posted, match has not checked it yet
    VerifyMove,
    /// Our turn but nothing fits: skip or exchange
    DecideSkip,
    /// Skip or exchange posted
    VerifySkip,
}

/// What the client asked for, pending a coordinator decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Name(String),
    PlayerCount(u8),
    Move(Move),
    /// `None` for a plain skip, the tile to give up for an exchange
    Skip(Option<Tile>),
}

#[derive(Debug)]
struct PeerSlot {
    state: PeerState,
    name: Option<String>,
    intent: Option<Intent>,
}

/// A connected client
pub struct ClientPeer {
    id: Uuid,
    connection: Arc<dyn Connection>,
    slot: Mutex<PeerSlot>,
}

impl ClientPeer {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection,
            slot: Mutex::new(PeerSlot {
                state: PeerState::AwaitingConnect,
                name: None,
                intent: None,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, PeerSlot> {
        // The slot holds plain data, a panic elsewhere cannot leave it torn
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Accepted name, if any
    pub fn name(&self) -> Option<String> {
        self.slot().name.clone()
    }

    /// Accepted name, or the id for peers that have none yet
    pub fn display_name(&self) -> String {
        self.name().unwrap_or_else(|| self.id.to_string())
    }

    pub fn state(&self) -> PeerState {
        self.slot().state
    }

    pub fn is_dead(&self) -> bool {
        self.connection.is_dead()
    }

    pub fn kill(&self) {
        self.connection.kill_connection();
    }

    pub fn send(&self, message: &ServerMessage) {
        debug!(peer = %self.id, "-> {}", message);
        self.connection.send_message(&message.to_string());
    }

    /// Read lines until the connection dies. Runs on the peer's own thread.
    pub fn run(&self) {
        info!(peer = %self.id, "Reader started");
        while let Some(line) = self.connection.read_message() {
            self.handle_line(&line);
        }
        self.connection.kill_connection();
        info!(peer = %self.id, name = ?self.name(), "Connection closed");
    }

    /// Apply one incoming line to the state machine.
    ///
    /// Anything the current state does not expect, malformed or not, is
    /// answered with `invalidCommand` and leaves the state alone.
    pub fn handle_line(&self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        debug!(peer = %self.id, "<- {}", line);

        let accepted = match line.parse::<ClientCommand>() {
            Ok(command) => self.apply(command),
            Err(e) => {
                debug!(peer = %self.id, "Malformed command: {}", e);
                false
            }
        };

        if !accepted {
            self.send(&ServerMessage::InvalidCommand);
        }
    }

    fn apply(&self, command: ClientCommand) -> bool {
        let mut slot = self.slot();
        let (next, intent) = match (slot.state, command) {
            (PeerState::AwaitingConnect, ClientCommand::Connect { name }) => {
                (PeerState::VerifyName, Intent::Name(name))
            }
            (PeerState::AwaitingRequest, ClientCommand::Request { players }) => {
                (PeerState::StartWaiting, Intent::PlayerCount(players))
            }
            (PeerState::DecideMove, ClientCommand::Place(mv)) => {
                (PeerState::VerifyMove, Intent::Move(mv))
            }
            (PeerState::DecideSkip, ClientCommand::Skip) => {
                (PeerState::VerifySkip, Intent::Skip(None))
            }
            (PeerState::DecideSkip, ClientCommand::Exchange { tile }) => {
                (PeerState::VerifySkip, Intent::Skip(Some(tile)))
            }
            (state, command) => {
                debug!(peer = %self.id, ?state, "Unexpected command: {}", command);
                return false;
            }
        };
        slot.state = next;
        slot.intent = Some(intent);
        true
    }

    /// Move from `from` to `to` if the peer is still in `from`.
    ///
    /// Returns whether the transition happened. The pending intent is kept.
    pub fn transition(&self, from: PeerState, to: PeerState) -> bool {
        let mut slot = self.slot();
        if slot.state != from {
            return false;
        }
        slot.state = to;
        true
    }

    /// Force a state and forget any pending intent.
    ///
    /// Used by coordinators when they take a peer over or hand it back.
    pub fn reset(&self, state: PeerState) {
        let mut slot = self.slot();
        if slot.state != state {
            debug!(peer = %self.id, from = ?slot.state, to = ?state, "Reset");
        }
        slot.state = state;
        slot.intent = None;
    }

    /// The pending intent, only while the peer is in `state`
    pub fn intent_in(&self, state: PeerState) -> Option<Intent> {
        let slot = self.slot();
        if slot.state == state {
            slot.intent.clone()
        } else {
            None
        }
    }

    /// Name waiting for the lobby's verdict
    pub fn proposed_name(&self) -> Option<String> {
        match self.intent_in(PeerState::VerifyName) {
            Some(Intent::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Player count asked for, while the request is pending or queued
    pub fn requested_players(&self) -> Option<u8> {
        let slot = self.slot();
        match (slot.state, &slot.intent) {
            (
                PeerState::StartWaiting | PeerState::WaitingForPlayers,
                Some(Intent::PlayerCount(n)),
            ) => Some(*n),
            _ => None,
        }
    }

    /// Adopt the proposed name and move on to `AwaitingRequest`
    pub fn accept_name(&self) -> bool {
        let mut slot = self.slot();
        let name = match (slot.state, &slot.intent) {
            (PeerState::VerifyName, Some(Intent::Name(name))) => name.clone(),
            (state, _) => {
                warn!(peer = %self.id, ?state, "No name to accept");
                return false;
            }
        };
        slot.name = Some(name);
        slot.intent = None;
        slot.state = PeerState::AwaitingRequest;
        true
    }

    /// Drop the proposed name and go back to `AwaitingConnect`
    pub fn reject_name(&self) -> bool {
        let mut slot = self.slot();
        if slot.state != PeerState::VerifyName {
            return false;
        }
        slot.state = PeerState::AwaitingConnect;
        slot.intent = None;
        true
    }
}

impl std::fmt::Debug for ClientPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot();
        f.debug_struct("ClientPeer")
            .field("id", &self.id)
            .field("name", &slot.name)
            .field("state", &slot.state)
            .finish()
    }
}
