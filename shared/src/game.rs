use crate::entity::{Player, PlayerType, Puck};
use crate::math::Vec2;
use crate::NUM_PUCKS;
use log::info;
use std::collections::HashMap;

/// Identifies a spectator for the lifetime of its connection.
pub type SpectatorId = u32;

/// Home positions used by `Game::reset`.
const PLAYER0_HOME: Vec2 = Vec2::new(0.0, -1.75);
const PLAYER1_HOME: Vec2 = Vec2::new(0.0, 1.75);
const SERVE_OFFSET: f32 = 0.75;

/// Which player record a connection controls.
///
/// Authoritative slots are never freed, only vacated; spectators are keyed by
/// an id handed out at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerHandle {
    Player0,
    Player1,
    Spectator(SpectatorId),
}

impl PlayerHandle {
    /// The slot identity behind this handle; `Neutral` for spectators.
    pub fn slot(self) -> PlayerType {
        match self {
            PlayerHandle::Player0 => PlayerType::Player0,
            PlayerHandle::Player1 => PlayerType::Player1,
            PlayerHandle::Spectator(_) => PlayerType::Neutral,
        }
    }
}

/// The whole authoritative game: two player slots, spectators and the fixed
/// set of puck copies.
#[derive(Debug, Clone)]
pub struct Game {
    pub pucks: [Puck; NUM_PUCKS],
    pub player_0: Player,
    pub player_1: Player,
    pub spectators: HashMap<SpectatorId, Player>,
    /// Slot offered to the next connecting participant
    pub next_player: PlayerType,
    /// Side whose half receives the pucks on the next reset
    pub to_serve: PlayerType,
    /// Seconds left before simulation resumes after a goal
    pub grace_period: f32,
    pub(crate) next_spectator_id: SpectatorId,
}

impl Game {
    /// Creates a game with both slots vacant and player 0 on serve.
    pub fn new() -> Self {
        let mut game = Self {
            pucks: Default::default(),
            player_0: Player::new(PlayerType::Neutral),
            player_1: Player::new(PlayerType::Neutral),
            spectators: HashMap::new(),
            next_player: PlayerType::Player0,
            to_serve: PlayerType::Player0,
            grace_period: 0.0,
            next_spectator_id: 1,
        };
        game.reset(PlayerType::Player0);
        game
    }

    /// Puts both players at home, clears their tap counters, and stacks every
    /// puck on the serve point of `serving`'s half.
    pub fn reset(&mut self, serving: PlayerType) {
        info!("Resetting, {} to serve", serving);

        self.player_0.position = PLAYER0_HOME;
        self.player_0.controls.reset();

        self.player_1.position = PLAYER1_HOME;
        self.player_1.controls.reset();

        let y = if serving == PlayerType::Player0 {
            -SERVE_OFFSET
        } else {
            SERVE_OFFSET
        };
        for puck in &mut self.pucks {
            puck.position = Vec2::new(0.0, y);
            puck.last_hit = PlayerType::Neutral;
        }
    }

    pub fn player(&self, handle: PlayerHandle) -> Option<&Player> {
        match handle {
            PlayerHandle::Player0 => Some(&self.player_0),
            PlayerHandle::Player1 => Some(&self.player_1),
            PlayerHandle::Spectator(id) => self.spectators.get(&id),
        }
    }

    pub fn player_mut(&mut self, handle: PlayerHandle) -> Option<&mut Player> {
        match handle {
            PlayerHandle::Player0 => Some(&mut self.player_0),
            PlayerHandle::Player1 => Some(&mut self.player_1),
            PlayerHandle::Spectator(id) => self.spectators.get_mut(&id),
        }
    }

    /// The authoritative player record for `slot`, if `slot` is not `Neutral`.
    pub fn slot(&self, slot: PlayerType) -> Option<&Player> {
        match slot {
            PlayerType::Player0 => Some(&self.player_0),
            PlayerType::Player1 => Some(&self.player_1),
            PlayerType::Neutral => None,
        }
    }

    /// True while the post-goal freeze is running.
    pub fn in_grace_period(&self) -> bool {
        self.grace_period > 0.0
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
