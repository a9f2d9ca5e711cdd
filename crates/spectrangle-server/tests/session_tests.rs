//! Sessions driven end to end: real reader threads, lobby and matches pumped
//! from the test thread.

use pretty_assertions::assert_eq;
use spectrangle_core::BagOrder;
use spectrangle_server::{channel_pair, ClientPeer, Game, Lobby, LobbyHandle, PeerState, RemoteEnd};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct TestClient {
    peer: Arc<ClientPeer>,
    remote: RemoteEnd,
    received: Vec<String>,
}

impl TestClient {
    fn send(&self, line: &str) {
        assert!(self.remote.send_line(line));
    }

    fn poll(&mut self) {
        self.received.extend(self.remote.drain());
    }

    fn has(&self, line: &str) -> bool {
        self.received.iter().any(|l| l == line)
    }

    fn lines_starting(&self, prefix: &str) -> Vec<String> {
        self.received
            .iter()
            .filter(|l| l.starts_with(prefix))
            .cloned()
            .collect()
    }
}

struct Harness {
    lobby: Lobby,
    handle: LobbyHandle,
    games: Vec<Game>,
    clients: Vec<TestClient>,
}

impl Harness {
    fn new() -> Self {
        let (lobby, handle) = Lobby::new(BagOrder::Ordered);
        Self {
            lobby,
            handle,
            games: Vec::new(),
            clients: Vec::new(),
        }
    }

    /// Connect a client with its own reader thread and hand it to the lobby
    fn join(&mut self) -> usize {
        let (connection, remote) = channel_pair();
        let peer = Arc::new(ClientPeer::new(Arc::new(connection)));

        let reader = Arc::clone(&peer);
        thread::spawn(move || reader.run());

        self.handle.try_add_new_client(Arc::clone(&peer)).unwrap();
        self.step();
        self.clients.push(TestClient {
            peer,
            remote,
            received: Vec::new(),
        });
        self.clients.len() - 1
    }

    fn step(&mut self) {
        self.games.extend(self.lobby.advance());
        for game in &mut self.games {
            game.advance();
        }
        for client in &mut self.clients {
            client.poll();
        }
    }

    /// Keep stepping until `done` holds
    fn pump_until(&mut self, what: &str, done: impl Fn(&Self) -> bool) {
        for _ in 0..2000 {
            self.step();
            if done(self) {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("timed out waiting for {}", what);
    }

    fn register(&mut self, name: &str) -> usize {
        let id = self.join();
        self.clients[id].send(&format!("connect {}", name));
        self.pump_until("welcome", |h| h.clients[id].has("welcome"));
        id
    }
}

#[test]
fn test_four_players_start_one_match() {
    let mut harness = Harness::new();
    let names = ["alice", "bob", "carol", "dave"];
    let ids: Vec<usize> = names.iter().map(|name| harness.register(name)).collect();

    for &id in &ids {
        harness.clients[id].send("request 4");
    }
    harness.pump_until("order", |h| {
        ids.iter()
            .all(|&id| !h.clients[id].lines_starting("order").is_empty())
    });

    assert_eq!(harness.games.len(), 1);
    assert_eq!(harness.games[0].players().len(), 4);
    assert!(harness.lobby.waiting().is_empty());

    let starts: Vec<Vec<String>> = ids
        .iter()
        .map(|&id| harness.clients[id].lines_starting("start"))
        .collect();
    let orders: Vec<Vec<String>> = ids
        .iter()
        .map(|&id| harness.clients[id].lines_starting("order"))
        .collect();

    for start in &starts {
        assert_eq!(start, &vec!["start with alice bob carol dave".to_string()]);
    }
    for order in &orders {
        assert_eq!(order, &orders[0]);
        assert_eq!(order.len(), 1);
    }

    let prompted = harness
        .games[0]
        .players()
        .iter()
        .filter(|p| p.peer.state() == PeerState::DecideMove)
        .count();
    assert_eq!(prompted, 1);
}

#[test]
fn test_invalid_move_prompts_again() {
    let mut harness = Harness::new();
    let alice = harness.register("alice");
    let bob = harness.register("bob");

    harness.clients[alice].send("request 2");
    harness.clients[bob].send("request 2");
    harness.pump_until("order", |h| h.clients[bob].has("order alice bob"));

    // An ordered bag deals alice the four single-color tiles
    harness.clients[alice].send("place RRR6 on 0");
    harness.pump_until("first move", |h| h.clients[bob].has("move alice RRR6 0 6"));

    // bob holds BBP5, but no rotation of it fits next to the red tile
    harness.clients[bob].send("place BBP5 on 2");
    harness.pump_until("rejection", |h| h.clients[bob].has("invalidMove"));
    assert_eq!(harness.clients[bob].peer.state(), PeerState::DecideMove);
    assert!(harness.clients[alice].lines_starting("move bob").is_empty());

    harness.clients[bob].send("place RRY5 on 2");
    harness.pump_until("second move", |h| h.clients[alice].has("move bob RRY5 2 15"));
    assert_eq!(harness.clients[alice].peer.state(), PeerState::DecideMove);
    assert_eq!(harness.games[0].players()[1].score, 15);
}

#[test]
fn test_different_requests_wait_apart() {
    let mut harness = Harness::new();
    let alice = harness.register("alice");
    let bob = harness.register("bob");

    harness.clients[alice].send("request 2");
    harness.clients[bob].send("request 3");
    harness.pump_until("queued", |h| {
        h.clients[alice].has("waiting alice") && h.clients[bob].has("waiting bob")
    });

    for _ in 0..20 {
        harness.step();
    }
    assert!(harness.games.is_empty());
    assert_eq!(harness.lobby.waiting().len(), 2);
}

#[test]
fn test_disconnect_frees_name() {
    let mut harness = Harness::new();
    let first = harness.register("alice");
    let second = harness.join();

    harness.clients[second].send("connect alice");
    harness.pump_until("rejection", |h| h.clients[second].has("invalidName"));

    harness.clients[first].peer.kill();
    harness.pump_until("cleanup", |h| h.lobby.waiting().len() == 1);

    harness.clients[second].send("connect alice");
    harness.pump_until("welcome", |h| h.clients[second].has("welcome"));
    assert_eq!(harness.clients[second].peer.name().as_deref(), Some("alice"));
}
