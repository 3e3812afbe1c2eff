//! # Quantum Hockey Core
//!
//! Authoritative simulation and wire protocol for a two-player air hockey
//! variant whose pucks split into fanned copies when struck and collapse back
//! into one when a goal is scored.
//!
//! ## Module Organization
//!
//! - `entity`: plain records for buttons, controls, players and pucks
//! - `game`: the `Game` context, player handles and `reset`
//! - `session`: slot assignment for connecting participants
//! - `simulation`: the fixed-timestep `update`
//! - `protocol`: framing plus the controls and state message codecs
//! - `sync`: snapshot send/apply on top of `protocol` and `connection`
//! - `connection`: byte buffers shared with the transport layer
//!
//! All state lives in one owned `Game`; the server mutates it from a single
//! tick loop, clients overwrite it wholesale from state snapshots.

pub mod connection;
pub mod entity;
pub mod game;
pub mod math;
pub mod protocol;
mod session;
mod simulation;
mod sync;

pub use connection::Connection;
pub use entity::{Button, Controls, Player, PlayerType, Puck};
pub use game::{Game, PlayerHandle, SpectatorId};
pub use math::Vec2;
pub use protocol::{MessageType, ProtocolError};
pub use simulation::{check_collision, update_player};

/// Number of simultaneous puck copies.
pub const NUM_PUCKS: usize = 5;
/// Angle between neighbouring forked pucks, in degrees.
pub const PUCK_FAN_ANGLE: f32 = 10.0;
/// Seconds the simulation stays frozen after a goal.
pub const GRACE_PERIOD: f32 = 3.0;

/// Server update length in seconds.
pub const TICK: f32 = 1.0 / 30.0;

// Arena layout. Each player is confined to its own vertical band.
pub const PLAYER0_MIN: f32 = -2.0;
pub const PLAYER0_MAX: f32 = -0.5;
pub const PLAYER1_MIN: f32 = 0.5;
pub const PLAYER1_MAX: f32 = 2.0;
pub const ARENA_MIN: Vec2 = Vec2::new(-1.0, PLAYER0_MIN);
pub const ARENA_MAX: Vec2 = Vec2::new(1.0, PLAYER1_MAX);
pub const GOAL_RADIUS: f32 = 0.27;
pub const GOAL0_CENTER: Vec2 = Vec2::new(0.0, PLAYER0_MIN);
pub const GOAL1_CENTER: Vec2 = Vec2::new(0.0, PLAYER1_MAX);

pub const PLAYER_RADIUS: f32 = 0.09;
pub const PLAYER_SPEED: f32 = 3.0;
pub const PLAYER_ACCEL_HALFLIFE: f32 = 0.05;

pub const PUCK_RADIUS: f32 = 0.05;
/// Speed above which pucks bleed off velocity.
pub const PUCK_SPEED: f32 = 3.0;
/// Fraction of the excess over `PUCK_SPEED` kept each tick.
pub const PUCK_RETAIN: f32 = 0.75;

/// Gap left between a struck puck and the mallet after separation.
pub const COLLISION_SEPARATION: f32 = 0.01;
