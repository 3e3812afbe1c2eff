//! # Quantum Hockey Client Library
//!
//! Client side of quantum hockey. A client streams its `Controls` to the
//! server once per local tick and replaces its copy of the game with every
//! state snapshot the server sends back. There is no client-side prediction:
//! the server is the only simulation.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! - `ClientGameState`, the last snapshot received
//! - Goal and grace-period logging as snapshots arrive
//!
//! ### Input Module (`input`)
//! - Key events (`Left/Right/Up/Down/Jump`) into `Controls`
//! - Key repeat filtering, so a held key counts one tap
//! - An autopilot that plays one side unattended
//!
//! ### Network Module (`network`)
//! - TCP connection to the server
//! - One controls message per tick, tap counters cleared after sending
//! - State messages applied as soon as they are complete
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::input::InputManager;
//! use client::network::Client;
//! use shared::PlayerType;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect(
//!         "127.0.0.1:8080",
//!         Duration::from_secs_f32(1.0 / 30.0),
//!         InputManager::with_autopilot(PlayerType::Player0),
//!     )
//!     .await?;
//!
//!     client.run().await
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
