use crate::game::ClientGameState;
use crate::input::InputManager;
use log::{debug, info};
use shared::{protocol, Connection, MessageType};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};

const READ_BUFFER_SIZE: usize = 4096;

pub struct Client {
    stream: TcpStream,
    connection: Connection,

    game_state: ClientGameState,
    input_manager: InputManager,

    tick_duration: Duration,
}

impl Client {
    pub async fn connect(
        server_addr: &str,
        tick_duration: Duration,
        input_manager: InputManager,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to server...");
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);

        Ok(Client {
            stream,
            connection: Connection::new(),
            game_state: ClientGameState::new(),
            input_manager,
            tick_duration,
        })
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn input_manager(&mut self) -> &mut InputManager {
        &mut self.input_manager
    }

    /// Sends this tick's controls, then clears the tap counters they carried.
    async fn send_controls(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.input_manager
            .controls()
            .send_controls_message(&mut self.connection);
        self.stream
            .write_all(&self.connection.take_outgoing())
            .await?;
        self.input_manager.controls_mut().reset();
        Ok(())
    }

    /// Applies every complete state message. The server only ever sends
    /// state, so anything else on the stream is fatal.
    fn handle_data(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        self.connection.receive(bytes);
        let applied = self.game_state.apply_server_state(&mut self.connection)?;
        protocol::check_stream(&self.connection.recv_buffer, MessageType::State)?;

        if applied > 1 {
            debug!("Applied {} snapshots in one read", applied);
        }
        Ok(())
    }

    /// Runs until the connection fails.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_ticks(None).await
    }

    /// Runs for `ticks` local ticks, then returns.
    pub async fn run_for(&mut self, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
        self.run_ticks(Some(ticks)).await
    }

    async fn run_ticks(&mut self, limit: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut ticks: u64 = 0;

        while limit.map_or(true, |limit| ticks < limit) {
            tokio::select! {
                result = self.stream.read(&mut buffer) => {
                    match result? {
                        0 => return Err("Lost connection to server!".into()),
                        len => self.handle_data(&buffer[..len])?,
                    }
                },

                _ = tick_interval.tick() => {
                    self.input_manager.update(&self.game_state.game);
                    self.send_controls().await?;
                    ticks += 1;
                },
            }
        }

        Ok(())
    }
}
