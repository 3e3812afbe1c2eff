//! Message-level send/receive on a `Connection`: clients send their
//! `Controls`, the server answers with full `Game` snapshots.

use crate::connection::Connection;
use crate::entity::{Controls, Player, PlayerType, Puck};
use crate::game::Game;
use crate::protocol::{self, PlayerRecord, ProtocolError, PuckRecord, StateSnapshot};

impl Controls {
    /// Queues one controls message.
    pub fn send_controls_message(&self, connection: &mut Connection) {
        protocol::encode_controls(self, &mut connection.send_buffer);
    }

    /// Applies one buffered controls message, if a complete one is waiting.
    pub fn recv_controls_message(
        &mut self,
        connection: &mut Connection,
    ) -> Result<bool, ProtocolError> {
        protocol::decode_controls(self, &mut connection.recv_buffer)
    }
}

impl Game {
    /// Captures the replicated part of the game.
    ///
    /// With `connection_player` set to `Player1`, player 1's record is placed
    /// first so the receiving client finds itself at the front. Any other value
    /// keeps the fixed player 0, player 1 order.
    pub fn snapshot(&self, connection_player: Option<PlayerType>) -> StateSnapshot {
        let (first, second) = match connection_player {
            Some(PlayerType::Player1) => (&self.player_1, &self.player_0),
            _ => (&self.player_0, &self.player_1),
        };

        StateSnapshot {
            grace_period: self.grace_period,
            players: [player_record(first), player_record(second)],
            pucks: std::array::from_fn(|i| puck_record(&self.pucks[i])),
        }
    }

    /// Overwrites local state with a snapshot.
    ///
    /// Occupied records land in the slot their `player_type` names, whichever
    /// order they were sent in; with both slots vacant, record order decides.
    /// Controls and spectators are local and left alone.
    pub fn apply_snapshot(&mut self, snapshot: &StateSnapshot) {
        self.grace_period = snapshot.grace_period;

        let [first, second] = &snapshot.players;
        let swapped = first.player_type == PlayerType::Player1
            || second.player_type == PlayerType::Player0;
        let (record_0, record_1) = if swapped {
            (second, first)
        } else {
            (first, second)
        };
        apply_player(&mut self.player_0, record_0);
        apply_player(&mut self.player_1, record_1);
        for (puck, record) in self.pucks.iter_mut().zip(snapshot.pucks.iter()) {
            puck.position = record.position;
            puck.velocity = record.velocity;
            puck.last_hit = record.last_hit;
        }
    }

    /// Queues one full state message.
    pub fn send_state_message(
        &self,
        connection: &mut Connection,
        connection_player: Option<PlayerType>,
    ) -> Result<(), ProtocolError> {
        protocol::encode_state(
            &self.snapshot(connection_player),
            &mut connection.send_buffer,
        )
    }

    /// Replaces local state from one buffered state message, if a complete one
    /// is waiting.
    pub fn recv_state_message(&mut self, connection: &mut Connection) -> Result<bool, ProtocolError> {
        match protocol::decode_state(&mut connection.recv_buffer)? {
            Some(snapshot) => {
                self.apply_snapshot(&snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn player_record(player: &Player) -> PlayerRecord {
    PlayerRecord {
        position: player.position,
        velocity: player.velocity,
        player_type: player.player_type,
        score: player.score,
    }
}

fn apply_player(player: &mut Player, record: &PlayerRecord) {
    player.position = record.position;
    player.velocity = record.velocity;
    player.player_type = record.player_type;
    player.score = record.score;
}

fn puck_record(puck: &Puck) -> PuckRecord {
    PuckRecord {
        position: puck.position,
        velocity: puck.velocity,
        last_hit: puck.last_hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::protocol::MessageType;

    fn busy_game() -> Game {
        let mut game = Game::new();
        game.spawn_player();
        game.spawn_player();
        game.player_0.position = Vec2::new(-0.4, -1.1);
        game.player_0.velocity = Vec2::new(1.5, 0.25);
        game.player_0.score = 3;
        game.player_1.velocity = Vec2::new(-0.125, 2.0);
        game.player_1.score = 9;
        game.grace_period = 1.7;
        for (i, puck) in game.pucks.iter_mut().enumerate() {
            puck.position = Vec2::new(0.1 * i as f32, 0.3);
            puck.velocity = Vec2::new(-1.0, 0.2 * i as f32);
            puck.last_hit = PlayerType::Player1;
        }
        game
    }

    #[test]
    fn test_state_message_replaces_client_game() {
        let server = busy_game();
        let mut link = Connection::new();
        server.send_state_message(&mut link, None).unwrap();

        let mut client = Game::new();
        let bytes = link.take_outgoing();
        link.receive(&bytes);
        assert!(client.recv_state_message(&mut link).unwrap());
        assert!(link.recv_buffer.is_empty());

        assert_eq!(client.grace_period, server.grace_period);
        for (mine, theirs) in [
            (&client.player_0, &server.player_0),
            (&client.player_1, &server.player_1),
        ] {
            assert_eq!(mine.position, theirs.position);
            assert_eq!(mine.velocity, theirs.velocity);
            assert_eq!(mine.player_type, theirs.player_type);
            assert_eq!(mine.score, theirs.score);
        }
        for (mine, theirs) in client.pucks.iter().zip(server.pucks.iter()) {
            assert_eq!(mine.position, theirs.position);
            assert_eq!(mine.velocity, theirs.velocity);
            assert_eq!(mine.last_hit, theirs.last_hit);
        }
    }

    #[test]
    fn test_snapshot_puts_connection_player_first() {
        let game = busy_game();

        let fixed = game.snapshot(None);
        assert_eq!(fixed.players[0].player_type, PlayerType::Player0);

        let own_first = game.snapshot(Some(PlayerType::Player1));
        assert_eq!(own_first.players[0].player_type, PlayerType::Player1);
        assert_eq!(own_first.players[0].score, 9);
        assert_eq!(own_first.players[1].score, 3);

        assert_eq!(game.snapshot(Some(PlayerType::Player0)), fixed);
    }

    #[test]
    fn test_own_first_order_lands_in_matching_slots() {
        let mut server = busy_game();
        server.player_1.position = Vec2::new(0.2, 1.3);
        let mut link = Connection::new();
        server
            .send_state_message(&mut link, Some(PlayerType::Player1))
            .unwrap();

        let mut client = Game::new();
        let bytes = link.take_outgoing();
        link.receive(&bytes);
        assert!(client.recv_state_message(&mut link).unwrap());

        assert_eq!(client.player_0.player_type, PlayerType::Player0);
        assert_eq!(client.player_0.score, 3);
        assert_eq!(client.player_0.position, Vec2::new(-0.4, -1.1));
        assert_eq!(client.player_0.velocity, server.player_0.velocity);
        assert_eq!(client.player_1.player_type, PlayerType::Player1);
        assert_eq!(client.player_1.score, 9);
        assert_eq!(client.player_1.position, Vec2::new(0.2, 1.3));
        assert_eq!(client.player_1.velocity, server.player_1.velocity);
    }

    #[test]
    fn test_lone_player_1_sent_first_stays_in_its_slot() {
        let mut server = Game::new();
        server.next_player = PlayerType::Player1;
        server.spawn_player();
        server.player_1.score = 5;

        let mut client = Game::new();
        client.apply_snapshot(&server.snapshot(Some(PlayerType::Player1)));

        assert_eq!(client.player_0.player_type, PlayerType::Neutral);
        assert_eq!(client.player_1.player_type, PlayerType::Player1);
        assert_eq!(client.player_1.score, 5);
    }

    #[test]
    fn test_vacant_records_apply_in_order() {
        let mut server = Game::new();
        server.player_0.score = 1;
        server.player_1.score = 2;

        let mut client = Game::new();
        client.apply_snapshot(&server.snapshot(Some(PlayerType::Player1)));

        assert_eq!(client.player_0.score, 2);
        assert_eq!(client.player_1.score, 1);
    }

    #[test]
    fn test_apply_keeps_local_controls() {
        let server = busy_game();
        let mut client = Game::new();
        client.player_0.controls.left.press();

        client.apply_snapshot(&server.snapshot(None));

        assert!(client.player_0.controls.left.pressed);
        assert_eq!(client.player_0.controls.left.downs, 1);
    }

    #[test]
    fn test_controls_message_over_connection() {
        let mut local = Controls::default();
        local.up.press();
        local.jump.press();
        local.jump.release();

        let mut link = Connection::new();
        local.send_controls_message(&mut link);
        local.send_controls_message(&mut link);
        let bytes = link.take_outgoing();
        link.receive(&bytes);

        let mut remote = Controls::default();
        while remote.recv_controls_message(&mut link).unwrap() {}

        assert!(remote.up.pressed);
        assert_eq!(remote.up.downs, 2);
        assert!(!remote.jump.pressed);
        assert_eq!(remote.jump.downs, 2);
        assert!(protocol::check_stream(&link.recv_buffer, MessageType::Controls).is_ok());
    }
}
