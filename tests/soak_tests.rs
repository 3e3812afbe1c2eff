//! Long-running simulation checks with timing output

use assert_approx_eq::assert_approx_eq;
use client::input::InputManager;
use shared::protocol::{HEADER_SIZE, STATE_PAYLOAD_SIZE};
use shared::{
    check_collision, Connection, Game, Player, PlayerType, Puck, Vec2, ARENA_MAX, ARENA_MIN,
    GOAL_RADIUS, GRACE_PERIOD, PLAYER0_MAX, PLAYER0_MIN, PLAYER1_MAX, PLAYER1_MIN, PUCK_RADIUS,
    TICK,
};
use std::time::Instant;

/// Outside the goal mouths a puck never leaves the arena; inside them it can
/// travel at most one goal depth before the goal is registered.
fn assert_puck_in_bounds(puck: &Puck) {
    let slack = 1e-4;
    assert!(puck.position.x >= ARENA_MIN.x + PUCK_RADIUS - slack, "{:?}", puck);
    assert!(puck.position.x <= ARENA_MAX.x - PUCK_RADIUS + slack, "{:?}", puck);

    if puck.position.x.abs() > GOAL_RADIUS {
        assert!(puck.position.y >= ARENA_MIN.y + PUCK_RADIUS - slack, "{:?}", puck);
        assert!(puck.position.y <= ARENA_MAX.y - PUCK_RADIUS + slack, "{:?}", puck);
    } else {
        assert!(puck.position.y >= ARENA_MIN.y - PUCK_RADIUS - slack, "{:?}", puck);
        assert!(puck.position.y <= ARENA_MAX.y + PUCK_RADIUS + slack, "{:?}", puck);
    }
}

fn assert_player_in_band(player: &Player, y_min: f32, y_max: f32) {
    assert!(player.position.y >= y_min && player.position.y <= y_max, "{:?}", player);
    assert!(player.position.x >= ARENA_MIN.x && player.position.x <= ARENA_MAX.x, "{:?}", player);
}

/// Two autopilots play ten simulated minutes without breaking an invariant
#[test]
fn soak_autopilot_match() {
    let mut game = Game::new();
    game.spawn_player();
    game.spawn_player();

    let mut pilots = [
        InputManager::with_autopilot(PlayerType::Player0),
        InputManager::with_autopilot(PlayerType::Player1),
    ];

    let ticks = (600.0 / TICK) as usize;
    let mut goals = 0u32;
    let mut resets = 0u32;
    let start = Instant::now();

    for _ in 0..ticks {
        for pilot in pilots.iter_mut() {
            pilot.update(&game);
        }
        game.player_0.controls = *pilots[0].controls();
        game.player_1.controls = *pilots[1].controls();
        for pilot in pilots.iter_mut() {
            pilot.controls_mut().reset();
        }

        let was_frozen = game.in_grace_period();
        let score = game.player_0.score + game.player_1.score;

        game.update(TICK);

        if game.player_0.score + game.player_1.score != score {
            goals += 1;
            assert_approx_eq!(game.grace_period, GRACE_PERIOD, 1e-6);
            let spot = game.pucks[0].position;
            assert!(game.pucks.iter().all(|puck| puck.position == spot));
        }
        if was_frozen && !game.in_grace_period() {
            resets += 1;
        }

        assert!(game.grace_period >= 0.0 && game.grace_period <= GRACE_PERIOD);
        assert_player_in_band(&game.player_0, PLAYER0_MIN, PLAYER0_MAX);
        assert_player_in_band(&game.player_1, PLAYER1_MIN, PLAYER1_MAX);
        if !game.in_grace_period() {
            game.pucks.iter().for_each(assert_puck_in_bounds);
        }
    }

    let duration = start.elapsed();
    println!(
        "Autopilot match: {} ticks in {:?} ({:.2} μs/tick), {} goals, {} resets",
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64,
        goals,
        resets
    );

    assert!(resets <= goals && goals <= resets + 1);
}

/// Benchmarks state message encode and decode
#[test]
fn benchmark_state_messages() {
    let mut game = Game::new();
    game.spawn_player();
    game.spawn_player();

    let iterations = 10_000;
    let mut server_side = Connection::new();
    let mut client_side = Connection::new();
    let mut view = Game::new();
    let start = Instant::now();

    for _ in 0..iterations {
        game.send_state_message(&mut server_side, None).unwrap();
        client_side.receive(&server_side.take_outgoing());
        assert!(view.recv_state_message(&mut client_side).unwrap());
    }

    let duration = start.elapsed();
    println!(
        "State messages: {} frames of {} bytes in {:?} ({:.2} μs/frame)",
        iterations,
        HEADER_SIZE + STATE_PAYLOAD_SIZE,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(client_side.recv_buffer.is_empty());
    assert!(duration.as_secs() < 5);
}

/// Benchmarks puck/mallet contact resolution
#[test]
fn benchmark_collision_detection() {
    let mut player = Player::new(PlayerType::Player0);
    player.position = Vec2::new(0.0, -1.0);

    let iterations = 100_000;
    let mut hits = 0;
    let start = Instant::now();

    for i in 0..iterations {
        let mut puck = Puck {
            position: Vec2::new(0.05 * (i % 5) as f32, -0.9),
            velocity: Vec2::new(0.0, -1.0),
            ..Default::default()
        };
        if check_collision(&mut puck, &player) {
            hits += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Collision detection: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(hits > 0);
    assert!(duration.as_millis() < 1000);
}
