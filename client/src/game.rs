use log::{debug, info};
use shared::{Connection, Game, ProtocolError};

/// Client-side copy of the game, replaced wholesale by each server snapshot
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub game: Game,
    /// Number of snapshots applied since connecting
    pub snapshots: u64,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            game: Game::new(),
            snapshots: 0,
        }
    }

    /// Applies every complete state message waiting in `connection`
    ///
    /// Returns how many were applied. Goals and the end of a grace period are
    /// logged by comparing against the state before each snapshot.
    pub fn apply_server_state(&mut self, connection: &mut Connection) -> Result<usize, ProtocolError> {
        let mut applied = 0;

        loop {
            let scores = (self.game.player_0.score, self.game.player_1.score);
            let was_frozen = self.game.in_grace_period();

            if !self.game.recv_state_message(connection)? {
                break;
            }
            applied += 1;
            self.snapshots += 1;

            if (self.game.player_0.score, self.game.player_1.score) != scores {
                info!(
                    "Goal! Score is now {} - {}",
                    self.game.player_0.score, self.game.player_1.score
                );
            }
            if was_frozen && !self.game.in_grace_period() {
                debug!("Play resumed");
            }
        }

        Ok(applied)
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
