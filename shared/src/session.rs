//! Slot assignment: the first two participants take the authoritative
//! players, everyone after that watches.

use crate::entity::{Player, PlayerType};
use crate::game::{Game, PlayerHandle};
use log::info;

impl Game {
    /// Hands the connecting participant a player.
    ///
    /// Claims the slot named by `next_player` if it is vacant and offers the
    /// other slot next (or nothing, if that one is taken too). Otherwise the
    /// participant becomes a spectator.
    pub fn spawn_player(&mut self) -> PlayerHandle {
        match self.next_player {
            PlayerType::Player0 if !self.player_0.is_occupied() => {
                self.player_0.player_type = PlayerType::Player0;
                self.next_player = if self.player_1.is_occupied() {
                    PlayerType::Neutral
                } else {
                    PlayerType::Player1
                };
                info!("Assigned slot {}", PlayerType::Player0);
                PlayerHandle::Player0
            }
            PlayerType::Player1 if !self.player_1.is_occupied() => {
                self.player_1.player_type = PlayerType::Player1;
                self.next_player = if self.player_0.is_occupied() {
                    PlayerType::Neutral
                } else {
                    PlayerType::Player0
                };
                info!("Assigned slot {}", PlayerType::Player1);
                PlayerHandle::Player1
            }
            _ => {
                let id = self.next_spectator_id;
                self.next_spectator_id += 1;
                self.spectators.insert(id, Player::new(PlayerType::Neutral));
                info!("Added spectator {} ({} watching)", id, self.spectators.len());
                PlayerHandle::Spectator(id)
            }
        }
    }

    /// Releases a player obtained from `spawn_player`.
    ///
    /// A vacated slot is offered to the next participant. Panics if a
    /// spectator handle is not tracked, which means the caller lost count of
    /// its connections.
    pub fn remove_player(&mut self, handle: PlayerHandle) {
        match handle {
            PlayerHandle::Player0 => {
                self.player_0.player_type = PlayerType::Neutral;
                self.next_player = PlayerType::Player0;
                info!("Released slot {}", PlayerType::Player0);
            }
            PlayerHandle::Player1 => {
                self.player_1.player_type = PlayerType::Neutral;
                self.next_player = PlayerType::Player1;
                info!("Released slot {}", PlayerType::Player1);
            }
            PlayerHandle::Spectator(id) => {
                let removed = self.spectators.remove(&id);
                assert!(removed.is_some(), "spectator {id} is not in this game");
                info!("Removed spectator {}", id);
            }
        }
    }
}
