//! Fixed-timestep authoritative update: mallet movement, puck integration,
//! puck/mallet hits with forking, wall and goal-post bounces, and scoring.

use crate::entity::{Player, PlayerType, Puck};
use crate::game::Game;
use crate::math::{lerp, Vec2};
use crate::{
    ARENA_MAX, ARENA_MIN, COLLISION_SEPARATION, GOAL_RADIUS, GRACE_PERIOD, NUM_PUCKS,
    PLAYER0_MAX, PLAYER0_MIN, PLAYER1_MAX, PLAYER1_MIN, PLAYER_ACCEL_HALFLIFE, PLAYER_RADIUS,
    PLAYER_SPEED, PUCK_FAN_ANGLE, PUCK_RADIUS, PUCK_RETAIN, PUCK_SPEED,
};
use log::{debug, info};

impl Game {
    /// Advances the game by one tick of `elapsed` seconds.
    ///
    /// Spectators are never simulated. While a grace period runs only the
    /// countdown advances; the tick on which it runs out performs the serve
    /// reset and nothing else.
    pub fn update(&mut self, elapsed: f32) {
        if self.grace_period > 0.0 {
            self.grace_period = (self.grace_period - elapsed).max(0.0);
            if self.grace_period == 0.0 {
                self.reset(self.to_serve);
            }
            return;
        }

        update_player(&mut self.player_0, elapsed, PLAYER0_MIN, PLAYER0_MAX);
        update_player(&mut self.player_1, elapsed, PLAYER1_MIN, PLAYER1_MAX);

        for puck in &mut self.pucks {
            integrate_puck(puck, elapsed);
        }

        if let Some(struck) = self.find_player_hit() {
            self.fork_pucks(struck);
        }

        for index in 0..NUM_PUCKS {
            bounce_off_arena(&mut self.pucks[index]);
            let y = self.pucks[index].position.y;

            // Once a goal is in, the remaining copies collapse anyway.
            if y < ARENA_MIN.y - PUCK_RADIUS {
                let scorer = self.player_1.player_type;
                self.handle_scored(index, scorer);
                break;
            }
            if y > ARENA_MAX.y + PUCK_RADIUS {
                let scorer = self.player_0.player_type;
                self.handle_scored(index, scorer);
                break;
            }
        }
    }

    /// Resolves the first puck/mallet contact in iteration order, player 0
    /// before player 1, and returns the struck puck's index.
    fn find_player_hit(&mut self) -> Option<usize> {
        for (index, puck) in self.pucks.iter_mut().enumerate() {
            if check_collision(puck, &self.player_0) {
                puck.last_hit = self.player_0.player_type;
                return Some(index);
            }
            if check_collision(puck, &self.player_1) {
                puck.last_hit = self.player_1.player_type;
                return Some(index);
            }
        }
        None
    }

    /// Re-spawns every other puck from the struck one, fanned out around its
    /// heading at `PUCK_FAN_ANGLE` steps while skipping the zero offset.
    pub fn fork_pucks(&mut self, root: usize) {
        let Puck {
            position,
            velocity,
            last_hit,
            ..
        } = self.pucks[root].clone();

        let mut step = -((NUM_PUCKS as i32 - 1) / 2);
        for (index, puck) in self.pucks.iter_mut().enumerate() {
            if index == root {
                continue;
            }

            puck.position = position;
            puck.velocity = velocity.rotate((PUCK_FAN_ANGLE * step as f32).to_radians());
            puck.last_hit = last_hit;

            step += 1;
            if step == 0 {
                step += 1;
            }
        }
        debug!("Forked pucks from {} for {}", root, last_hit);
    }

    /// Collapses every copy onto the puck that went in, freezes play for the
    /// grace period and credits `scorer`.
    ///
    /// Serve goes to the side that conceded, unless that slot is vacant.
    pub fn handle_scored(&mut self, index: usize, scorer: PlayerType) {
        info!("Goal scored by {}", scorer);

        self.grace_period = GRACE_PERIOD;

        let spot = self.pucks[index].position;
        for puck in &mut self.pucks {
            puck.position = spot;
            puck.velocity = Vec2::ZERO;
        }

        match scorer {
            PlayerType::Player0 => {
                self.player_0.score = self.player_0.score.saturating_add(1);
                self.to_serve = if self.player_1.is_occupied() {
                    PlayerType::Player1
                } else {
                    PlayerType::Player0
                };
            }
            PlayerType::Player1 => {
                self.player_1.score = self.player_1.score.saturating_add(1);
                self.to_serve = if self.player_0.is_occupied() {
                    PlayerType::Player0
                } else {
                    PlayerType::Player1
                };
            }
            PlayerType::Neutral => {
                self.to_serve = if self.player_1.is_occupied() {
                    PlayerType::Player1
                } else {
                    PlayerType::Player0
                };
            }
        }
    }
}

/// Moves one mallet from its held buttons and keeps it inside its own band
/// of the arena (`y_min..y_max`), bouncing off the edges.
pub fn update_player(player: &mut Player, elapsed: f32, y_min: f32, y_max: f32) {
    let controls = &player.controls;
    let mut dir = Vec2::ZERO;
    if controls.left.pressed {
        dir.x -= 1.0;
    }
    if controls.right.pressed {
        dir.x += 1.0;
    }
    if controls.down.pressed {
        dir.y -= 1.0;
    }
    if controls.up.pressed {
        dir.y += 1.0;
    }

    if dir == Vec2::ZERO {
        // drift to a stop
        let amt = 1.0 - 0.5f32.powf(elapsed / (PLAYER_ACCEL_HALFLIFE * 2.0));
        player.velocity = player.velocity.lerp(Vec2::ZERO, amt);
    } else {
        let dir = dir.normalize();
        let amt = 1.0 - 0.5f32.powf(elapsed / PLAYER_ACCEL_HALFLIFE);

        // only ever speeds up along the input direction
        let mut along = player.velocity.dot(dir);
        if along < PLAYER_SPEED {
            along = lerp(along, PLAYER_SPEED, amt);
        }

        let side = dir.perp();
        let perp = lerp(player.velocity.dot(side), 0.0, amt);

        player.velocity = dir * along + side * perp;
    }
    player.position += player.velocity * elapsed;

    player.controls.reset();

    if player.position.x < ARENA_MIN.x + PLAYER_RADIUS {
        player.position.x = ARENA_MIN.x + PLAYER_RADIUS;
        player.velocity.x = player.velocity.x.abs();
    }
    if player.position.x > ARENA_MAX.x - PLAYER_RADIUS {
        player.position.x = ARENA_MAX.x - PLAYER_RADIUS;
        player.velocity.x = -player.velocity.x.abs();
    }
    if player.position.y < y_min + PLAYER_RADIUS {
        player.position.y = y_min + PLAYER_RADIUS;
        player.velocity.y = player.velocity.y.abs();
    }
    if player.position.y > y_max - PLAYER_RADIUS {
        player.position.y = y_max - PLAYER_RADIUS;
        player.velocity.y = -player.velocity.y.abs();
    }
}

/// Integrates a puck and bleeds off speed above `PUCK_SPEED`.
fn integrate_puck(puck: &mut Puck, elapsed: f32) {
    puck.prev_pos = puck.position;
    puck.position += puck.velocity * elapsed;

    let speed = puck.velocity.length();
    if speed > PUCK_SPEED {
        puck.velocity = puck.velocity * ((PUCK_SPEED + (speed - PUCK_SPEED) * PUCK_RETAIN) / speed);
    }
}

/// Bounces a puck struck by `player`, treating the mallet as immovable.
///
/// Returns false when the two do not touch. On contact the puck gains twice
/// the relative velocity along the contact normal and is pushed just clear of
/// the mallet.
pub fn check_collision(puck: &mut Puck, player: &Player) -> bool {
    let disp = player.position - puck.position;
    let dist = disp.length();
    if dist > PLAYER_RADIUS + PUCK_RADIUS {
        return false;
    }

    // coincident centers have no normal; push along +y
    let dir = if dist > 0.0 {
        disp / dist
    } else {
        Vec2::new(0.0, 1.0)
    };
    let relative = player.velocity - puck.velocity;
    puck.velocity += dir * (2.0 * dir.dot(relative));

    puck.position = player.position - dir * (PLAYER_RADIUS + PUCK_RADIUS + COLLISION_SEPARATION);

    true
}

/// Side walls always bounce. The back walls only bounce outside the goal
/// mouth; a puck already past the back line that slides sideways out of the
/// mouth is stopped by the inside of the goal post.
///
/// Corner hits can push a puck a little further than a true contact would.
fn bounce_off_arena(puck: &mut Puck) {
    if puck.position.x < ARENA_MIN.x + PUCK_RADIUS {
        puck.position.x = ARENA_MIN.x + PUCK_RADIUS;
        puck.velocity.x = puck.velocity.x.abs();
    }
    if puck.position.x > ARENA_MAX.x - PUCK_RADIUS {
        puck.position.x = ARENA_MAX.x - PUCK_RADIUS;
        puck.velocity.x = -puck.velocity.x.abs();
    }

    let mouth_min = -GOAL_RADIUS + PUCK_RADIUS;
    let mouth_max = GOAL_RADIUS - PUCK_RADIUS;

    let left_of_mouth = puck.position.x < mouth_min;
    let right_of_mouth = puck.position.x > mouth_max;
    let past_min_line = puck.position.y < ARENA_MIN.y + PUCK_RADIUS;
    let past_max_line = puck.position.y > ARENA_MAX.y - PUCK_RADIUS;

    if left_of_mouth || right_of_mouth {
        if past_min_line {
            puck.position.y = ARENA_MIN.y + PUCK_RADIUS;
            puck.velocity.y = puck.velocity.y.abs();
        }
        if past_max_line {
            puck.position.y = ARENA_MAX.y - PUCK_RADIUS;
            puck.velocity.y = -puck.velocity.y.abs();
        }
    }

    if past_min_line || past_max_line {
        if left_of_mouth && puck.prev_pos.x >= mouth_min {
            puck.position.x = mouth_min;
            puck.velocity.x = puck.velocity.x.abs();
        }
        if right_of_mouth && puck.prev_pos.x < mouth_max {
            puck.position.x = mouth_max;
            puck.velocity.x = -puck.velocity.x.abs();
        }
    }
}
