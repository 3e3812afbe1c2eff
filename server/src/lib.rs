//! # Quantum Hockey Server Library
//!
//! This library provides the authoritative server for quantum hockey. It owns
//! the one canonical `Game`, applies the controls each connection streams in,
//! and sends every connection a full state snapshot once per tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server alone advances the simulation. Clients never simulate; they
//! overwrite their copy of the game with each snapshot they receive.
//!
//! ### Connection Management
//! Handles the lifecycle of TCP connections:
//! - Accepting streams and refusing them past the connection limit
//! - Handing each one a player slot or a spectator seat
//! - Releasing the slot on close, idle timeout or protocol error
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! Network tasks never touch game state. The accept task and one reader task
//! per stream forward events over an unbounded channel; the main loop owns the
//! `Game` and the connection registry and processes events and ticks in turn
//! through `tokio::select!`. One writer task per stream drains that stream's
//! outgoing queue.
//!
//! ### Stream Protocol
//! Messages are length-prefixed frames on a plain TCP stream (see
//! `shared::protocol`). A connection only ever sends controls; any other
//! message type on it is a desync and closes the connection.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! - Connection registry keyed by connection id
//! - Per-connection byte buffers and writer queues
//! - Idle timeout detection
//!
//! ### Network Module (`network`)
//! - Accept, reader and writer tasks
//! - Controls decoding as bytes arrive
//! - The fixed-rate tick: update, then broadcast
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_secs_f32(1.0 / 30.0),
//!         32,
//!         Duration::from_secs(5),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod network;
