//! Server network layer: TCP streams in, controls applied, state broadcast out

use crate::client_manager::{ClientConnection, ClientManager, ConnectionId};
use log::{debug, error, info, warn};
use shared::{protocol, Game, MessageType, ProtocolError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Largest tick delta fed to the simulation, in seconds
pub const MAX_TICK_DELTA: f32 = 0.05;

const READ_BUFFER_SIZE: usize = 4096;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        id: ConnectionId,
        stream: TcpStream,
        addr: SocketAddr,
    },
    DataReceived {
        id: ConnectionId,
        bytes: Vec<u8>,
    },
    Closed {
        id: ConnectionId,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    listener: Arc<TcpListener>,
    clients: ClientManager,
    game: Game,
    tick_duration: Duration,
    timeout: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_connections: usize,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = Arc::new(TcpListener::bind(addr).await?);
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            clients: ClientManager::new(max_connections),
            game: Game::new(),
            tick_duration,
            timeout,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Spawns task that accepts streams and numbers them
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut next_id: ConnectionId = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let id = next_id;
                        next_id += 1;
                        if server_tx
                            .send(ServerMessage::Connected { id, stream, addr })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Registers a freshly accepted stream, or closes it if the server is full
    fn handle_connected(&mut self, id: ConnectionId, stream: TcpStream, addr: SocketAddr) {
        if self.clients.is_full() {
            warn!(
                "Refusing connection {} from {}: {} connections already open",
                id,
                addr,
                self.clients.len()
            );
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }

        let (read_half, write_half) = stream.into_split();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(id, write_half, outgoing_rx));

        let player = self.game.spawn_player();
        let mut client = ClientConnection::new(id, addr, player, outgoing_tx);
        client.attach_reader(tokio::spawn(read_loop(
            id,
            read_half,
            self.server_tx.clone(),
        )));

        if !self.clients.add_client(client) {
            warn!("Connection {} from {} was not registered", id, addr);
            self.game.remove_player(player);
        }
    }

    /// Appends bytes and applies every complete controls message
    ///
    /// Anything other than controls on this stream, or a malformed controls
    /// message, closes the connection.
    fn handle_data(&mut self, id: ConnectionId, bytes: &[u8]) {
        let Some(client) = self.clients.get_mut(id) else {
            debug!("Dropping {} bytes for closed connection {}", bytes.len(), id);
            return;
        };
        client.touch();
        client.connection.receive(bytes);

        let result = match self.game.player_mut(client.player) {
            Some(player) => drain_controls(&mut player.controls, client),
            None => Ok(()),
        };

        if let Err(e) = result {
            warn!("Closing connection {}: {}", id, e);
            self.disconnect(id);
        }
    }

    fn disconnect(&mut self, id: ConnectionId) {
        if let Some(client) = self.clients.remove_client(id) {
            self.game.remove_player(client.player);
        }
    }

    /// Advances the simulation and queues one state message per connection
    fn tick(&mut self, mut dt: f32) {
        if dt > MAX_TICK_DELTA {
            warn!(
                "Large delta time detected ({:.3}s), capping to {:.3}s",
                dt, MAX_TICK_DELTA
            );
            dt = MAX_TICK_DELTA;
        }

        self.game.update(dt);

        for client in self.clients.iter_mut() {
            if let Err(e) = self.game.send_state_message(&mut client.connection, None) {
                error!("Failed to encode state for connection {}: {}", client.id, e);
            }
        }

        for id in self.clients.flush_all() {
            self.disconnect(id);
        }

        for id in self.clients.check_timeouts(self.timeout) {
            info!("Connection {} timed out", id);
            self.disconnect(id);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();
        let mut ticks: u64 = 0;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Connected { id, stream, addr }) => {
                            self.handle_connected(id, stream, addr);
                        }
                        Some(ServerMessage::DataReceived { id, bytes }) => {
                            self.handle_data(id, &bytes);
                        }
                        Some(ServerMessage::Closed { id }) => {
                            self.disconnect(id);
                        }
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.tick(dt);
                    ticks += 1;

                    if ticks % 300 == 0 && !self.clients.is_empty() {
                        debug!(
                            "Tick {}: {} connections, score {}-{}",
                            ticks,
                            self.clients.len(),
                            self.game.player_0.score,
                            self.game.player_1.score
                        );
                    }
                },
            }
        }

        Ok(())
    }
}

fn drain_controls(
    controls: &mut shared::Controls,
    client: &mut ClientConnection,
) -> Result<(), ProtocolError> {
    while controls.recv_controls_message(&mut client.connection)? {}
    protocol::check_stream(&client.connection.recv_buffer, MessageType::Controls)
}

/// Forwards everything read from one stream to the main loop
///
/// Ends with a `Closed` event on EOF or read error.
pub async fn read_loop<R>(
    id: ConnectionId,
    mut reader: R,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(len) => {
                let bytes = buffer[..len].to_vec();
                if server_tx
                    .send(ServerMessage::DataReceived { id, bytes })
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => {
                debug!("Read error on connection {}: {}", id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::Closed { id });
}

/// Writes queued bytes to one stream until the queue's sender is dropped,
/// then shuts the stream down.
pub async fn write_loop<W>(
    id: ConnectionId,
    mut writer: W,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = outgoing.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            debug!("Write error on connection {}: {}", id, e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown error on connection {}: {}", id, e);
    }
}
