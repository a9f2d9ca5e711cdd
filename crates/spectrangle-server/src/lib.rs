//! Spectrangle multiplayer session layer.
//!
//! Clients speak a line-based text protocol. The pieces:
//! - [`connection`]: the line transport a peer reads and writes through
//! - [`peer`]: one client's protocol state machine
//! - [`lobby`]: name registration and matchmaking
//! - [`game`]: the turn engine of one match
//! - [`server`]: TCP accept loop and socket bridging

pub mod config;
pub mod connection;
pub mod game;
pub mod lobby;
pub mod peer;
pub mod player;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use connection::{channel_pair, ChannelConnection, Connection, RemoteEnd};
pub use game::{Game, GameOutcome};
pub use lobby::{Lobby, LobbyError, LobbyHandle};
pub use peer::{ClientPeer, Intent, PeerState};
pub use player::Player;
pub use protocol::{ClientCommand, ProtocolError, ServerMessage};
pub use server::ServerState;
