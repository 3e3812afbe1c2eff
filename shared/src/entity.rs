//! Plain entity records shared by the server simulation and the client view.

use crate::math::Vec2;
use log::warn;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One control input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    /// Press transitions since the simulation last consumed this button
    pub downs: u8,
    /// Whether the button is held right now
    pub pressed: bool,
}

impl Button {
    /// Records a key-down transition.
    pub fn press(&mut self) {
        self.add_downs(1);
        self.pressed = true;
    }

    /// Records a key-up transition. `downs` is left for the next tick.
    pub fn release(&mut self) {
        self.pressed = false;
    }

    /// Accumulates tap count, clamping at `u8::MAX` instead of wrapping.
    pub fn add_downs(&mut self, count: u8) {
        match self.downs.checked_add(count) {
            Some(downs) => self.downs = downs,
            None => {
                warn!("Button tap counter saturated at {}", u8::MAX);
                self.downs = u8::MAX;
            }
        }
    }
}

/// Player inputs, written by the client and consumed by the server each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: Button,
    pub right: Button,
    pub up: Button,
    pub down: Button,
    pub jump: Button,
}

impl Controls {
    /// Clears the tap counters once they have been handled. Held state stays.
    pub fn reset(&mut self) {
        for button in self.buttons_mut() {
            button.downs = 0;
        }
    }

    /// Buttons in wire order: left, right, up, down, jump.
    pub fn buttons(&self) -> [&Button; 5] {
        [&self.left, &self.right, &self.up, &self.down, &self.jump]
    }

    pub fn buttons_mut(&mut self) -> [&mut Button; 5] {
        [
            &mut self.left,
            &mut self.right,
            &mut self.up,
            &mut self.down,
            &mut self.jump,
        ]
    }
}

/// Which authoritative slot a player occupies, or which player last touched a puck.
///
/// `Neutral` means "nobody": a vacant slot, a spectator, or an untouched puck.
/// Encoded on the wire as a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlayerType {
    #[default]
    Neutral = 0,
    Player0 = 1,
    Player1 = 2,
}

impl PlayerType {
    /// The opposing authoritative slot. `Neutral` has no opponent.
    pub fn opponent(self) -> PlayerType {
        match self {
            PlayerType::Player0 => PlayerType::Player1,
            PlayerType::Player1 => PlayerType::Player0,
            PlayerType::Neutral => PlayerType::Neutral,
        }
    }
}

impl TryFrom<u8> for PlayerType {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        match byte {
            0 => Ok(PlayerType::Neutral),
            1 => Ok(PlayerType::Player0),
            2 => Ok(PlayerType::Player1),
            other => Err(other),
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerType::Neutral => write!(f, "neutral"),
            PlayerType::Player0 => write!(f, "player 0"),
            PlayerType::Player1 => write!(f, "player 1"),
        }
    }
}

impl Serialize for PlayerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for PlayerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let byte = u8::deserialize(deserializer)?;
        PlayerType::try_from(byte)
            .map_err(|b| de::Error::custom(format!("invalid player type byte {b}")))
    }
}

/// State of one player (mallet) in the game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub controls: Controls,
    pub player_type: PlayerType,
    pub score: u32,
}

impl Player {
    pub fn new(player_type: PlayerType) -> Self {
        Self {
            player_type,
            ..Self::default()
        }
    }

    /// True when a connection currently controls this slot.
    pub fn is_occupied(&self) -> bool {
        self.player_type != PlayerType::Neutral
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Puck {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Position before this tick's integration, used for goal-post sides
    pub prev_pos: Vec2,
    pub last_hit: PlayerType,
}
