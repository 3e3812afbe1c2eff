//! Registry of live TCP connections for the authoritative server
//!
//! This module tracks every accepted stream together with:
//! - The player handle the game handed it on connect
//! - The byte buffers the wire codec reads from and writes into
//! - The channel feeding that stream's writer task
//! - The handle of that stream's reader task, aborted when the entry is dropped
//! - Activity timestamps for idle timeout detection
//!
//! The registry is owned by the tick loop alone, so no locking is needed.

use log::{debug, info};
use shared::{Connection, PlayerHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Server-assigned identifier of one accepted stream
pub type ConnectionId = u32;

/// One accepted stream and the player it drives
///
/// Each connection carries:
/// - Its id and peer address for logging
/// - The `PlayerHandle` returned by `Game::spawn_player`
/// - Receive and send buffers handed to the message codecs
/// - The sender side of its writer task's channel
/// - The reader task, so dropping the connection stops reading its stream
#[derive(Debug)]
pub struct ClientConnection {
    /// Unique connection identifier assigned by the accept task
    pub id: ConnectionId,
    /// Peer address, kept for log output
    pub addr: SocketAddr,
    /// Player record this connection's controls are applied to
    pub player: PlayerHandle,
    /// Buffered stream bytes in both directions
    pub connection: Connection,
    /// Last time any bytes arrived from this peer
    pub last_seen: Instant,
    /// Queue consumed by the writer task; dropping it closes the stream
    pub outgoing: mpsc::UnboundedSender<Vec<u8>>,
    /// Task forwarding this stream's bytes to the tick loop
    reader: Option<JoinHandle<()>>,
}

impl ClientConnection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        player: PlayerHandle,
        outgoing: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            addr,
            player,
            connection: Connection::new(),
            last_seen: Instant::now(),
            outgoing,
            reader: None,
        }
    }

    /// Ties the stream's reader task to this connection's lifetime.
    pub fn attach_reader(&mut self, reader: JoinHandle<()>) {
        if let Some(previous) = self.reader.replace(reader) {
            previous.abort();
        }
    }

    /// Marks the peer as active.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True when nothing has arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    /// Hands queued outgoing bytes to the writer task
    ///
    /// Returns false once the writer task has gone away, which means the
    /// stream is dead and the connection should be dropped.
    pub fn flush(&mut self) -> bool {
        if !self.connection.has_outgoing() {
            return true;
        }
        self.outgoing.send(self.connection.take_outgoing()).is_ok()
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Manages all accepted connections
///
/// Enforces the connection limit and provides the bulk operations the tick
/// loop runs every frame: flushing state to every peer and sweeping idle
/// connections.
pub struct ClientManager {
    /// Live connections indexed by id
    clients: HashMap<ConnectionId, ClientConnection>,
    /// Maximum number of concurrent connections allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty registry that holds at most `max_clients` connections.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers an accepted connection
    ///
    /// Returns false, leaving the registry untouched, if the server is at
    /// capacity or the id is already registered.
    pub fn add_client(&mut self, client: ClientConnection) -> bool {
        if self.is_full() || self.clients.contains_key(&client.id) {
            return false;
        }

        info!(
            "Connection {} from {} joined as {:?}",
            client.id, client.addr, client.player
        );
        self.clients.insert(client.id, client);
        true
    }

    /// Removes a connection, handing it back so the caller can release its
    /// player. Dropping the returned value closes the stream.
    pub fn remove_client(&mut self, id: ConnectionId) -> Option<ClientConnection> {
        let removed = self.clients.remove(&id);
        if let Some(client) = &removed {
            info!("Connection {} from {} left", client.id, client.addr);
        }
        removed
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut ClientConnection> {
        self.clients.get_mut(&id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientConnection> {
        self.clients.values_mut()
    }

    /// Lists connections idle for longer than `timeout`
    ///
    /// The connections stay registered; the caller removes them so the game
    /// can release their players in the same step.
    pub fn check_timeouts(&self, timeout: Duration) -> Vec<ConnectionId> {
        self.clients
            .values()
            .filter(|client| client.is_timed_out(timeout))
            .map(|client| client.id)
            .collect()
    }

    /// Flushes every connection's queued bytes to its writer task
    ///
    /// Returns the ids whose writer task has already exited.
    pub fn flush_all(&mut self) -> Vec<ConnectionId> {
        let mut dead = Vec::new();
        for client in self.clients.values_mut() {
            if !client.flush() {
                debug!("Writer for connection {} is gone", client.id);
                dead.push(client.id);
            }
        }
        dead
    }

    /// Returns the number of live connections
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
