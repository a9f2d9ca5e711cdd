//! Line-oriented connection capability.
//!
//! The session layer only needs four things from a transport: a blocking read
//! of the next line, a send, a liveness check and a way to hang up. The
//! `ChannelConnection` implementation carries lines over tokio channels, so the
//! same type serves the TCP bridge and the tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A bidirectional channel of text lines to one client.
pub trait Connection: Send + Sync {
    /// Block until the next line arrives. `None` once the connection is dead.
    fn read_message(&self) -> Option<String>;

    /// Queue a line for the client. Silently dropped on a dead connection.
    fn send_message(&self, line: &str);

    fn is_dead(&self) -> bool;

    /// Hang up. Idempotent.
    fn kill_connection(&self);
}

/// Connection backed by a pair of unbounded channels
pub struct ChannelConnection {
    inbound: Mutex<mpsc::UnboundedReceiver<String>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Lets `kill_connection` wake a reader parked on `inbound` without
    /// keeping the channel open on its own
    wake: mpsc::WeakUnboundedSender<String>,
    dead: AtomicBool,
}

/// The client's side of a `ChannelConnection`
pub struct RemoteEnd {
    /// Lines towards the server
    pub tx: mpsc::UnboundedSender<String>,
    /// Lines from the server
    pub rx: mpsc::UnboundedReceiver<String>,
}

/// Create a connected pair
pub fn channel_pair() -> (ChannelConnection, RemoteEnd) {
    let (to_server, inbound) = mpsc::unbounded_channel();
    let (outbound, from_server) = mpsc::unbounded_channel();

    let connection = ChannelConnection {
        inbound: Mutex::new(inbound),
        outbound: Mutex::new(Some(outbound)),
        wake: to_server.downgrade(),
        dead: AtomicBool::new(false),
    };
    let remote = RemoteEnd {
        tx: to_server,
        rx: from_server,
    };
    (connection, remote)
}

impl Connection for ChannelConnection {
    fn read_message(&self) -> Option<String> {
        if self.is_dead() {
            return None;
        }
        let line = match self.inbound.lock() {
            Ok(mut inbound) => inbound.blocking_recv(),
            Err(_) => None,
        };
        if line.is_none() {
            self.kill_connection();
        }
        line.filter(|_| !self.is_dead())
    }

    fn send_message(&self, line: &str) {
        if self.dead.load(Ordering::Acquire) {
            return;
        }
        let delivered = match self.outbound.lock() {
            Ok(outbound) => outbound
                .as_ref()
                .is_some_and(|tx| tx.send(line.to_string()).is_ok()),
            Err(_) => false,
        };
        if !delivered {
            self.kill_connection();
        }
    }

    fn is_dead(&self) -> bool {
        if self.dead.load(Ordering::Acquire) {
            return true;
        }
        // Remote hung up its receiving side
        match self.outbound.lock() {
            Ok(outbound) => outbound.as_ref().map_or(true, |tx| tx.is_closed()),
            Err(_) => true,
        }
    }

    fn kill_connection(&self) {
        self.dead.store(true, Ordering::Release);
        // Dropping the sender tells the remote side we are gone
        if let Ok(mut outbound) = self.outbound.lock() {
            outbound.take();
        }
        // A blocked reader sees this line, finds the connection dead and stops
        if let Some(tx) = self.wake.upgrade() {
            let _ = tx.send(String::new());
        }
    }
}

impl RemoteEnd {
    /// Send a line to the server; false once the server side is gone
    pub fn send_line(&self, line: &str) -> bool {
        self.tx.send(line.to_string()).is_ok()
    }

    /// Next line already sent by the server, without waiting
    pub fn try_next(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Every line the server has sent so far
    pub fn drain(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
