//! TCP front end.
//!
//! Each accepted socket gets a [`ChannelConnection`]; a bridge task moves
//! newline-terminated lines between the socket and the channels, and the
//! peer's reader runs on the blocking pool.

use crate::config::ServerConfig;
use crate::connection::{channel_pair, RemoteEnd};
use crate::lobby::{Lobby, LobbyHandle};
use crate::peer::ClientPeer;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// Every peer whose reader is still running
    pub peers: DashMap<Uuid, Arc<ClientPeer>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
        }
    }

    /// Hang up on every connected client
    pub fn kill_all(&self) {
        for peer in self.peers.iter() {
            peer.kill();
        }
        info!("Closed {} connections", self.peers.len());
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind, start the lobby and accept clients until the listener fails.
pub async fn run_server(config: &ServerConfig, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    info!("Spectrangle server listening on {}", config.addr);

    let (lobby, handle) = Lobby::new(config.bag_order());
    tokio::spawn(lobby.run(config.tick));

    serve(listener, handle, state).await
}

/// Accept loop. A new client is only accepted once the lobby has collected
/// the previous one.
pub async fn serve(
    listener: TcpListener,
    handle: LobbyHandle,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let peer = open_peer(stream, addr, &state);
        handle.add_new_client(peer).await?;
    }
}

fn open_peer(stream: TcpStream, addr: SocketAddr, state: &Arc<ServerState>) -> Arc<ClientPeer> {
    let (connection, remote) = channel_pair();
    let peer = Arc::new(ClientPeer::new(Arc::new(connection)));
    info!(peer = %peer.id(), %addr, "New connection");

    state.peers.insert(peer.id(), Arc::clone(&peer));
    tokio::spawn(bridge(stream, remote));

    let reader = Arc::clone(&peer);
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        reader.run();
        state.peers.remove(&reader.id());
    });

    peer
}

/// Copy lines both ways until either side goes away
async fn bridge(stream: TcpStream, remote: RemoteEnd) {
    let (read_half, mut write_half) = stream.into_split();
    let RemoteEnd { tx, mut rx } = remote;

    let mut incoming = tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            // Bytes that are not UTF-8 still reach the peer, which rejects the line
            let line = String::from_utf8_lossy(&buf);
            if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            line = rx.recv() => {
                let Some(mut line) = line else { break };
                line.push('\n');
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
            _ = &mut incoming => break,
        }
    }

    // Dropping the inbound sender wakes the peer's blocked reader
    incoming.abort();
    let _ = write_half.shutdown().await;
    debug!("Bridge closed");
}
