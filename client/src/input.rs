//! Client input management: key events into `Controls`, plus a scripted
//! autopilot for unattended clients

use shared::{Button, Controls, Game, PlayerType, Vec2, PLAYER_RADIUS};

/// Horizontal and vertical slack before the autopilot bothers moving
const AUTOPILOT_DEADZONE: f32 = 0.03;

/// Keys the client understands. A/D/W/S/Space on a keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Jump,
}

impl Key {
    pub const ALL: [Key; 5] = [Key::Left, Key::Right, Key::Up, Key::Down, Key::Jump];

    fn button(self, controls: &mut Controls) -> &mut Button {
        match self {
            Key::Left => &mut controls.left,
            Key::Right => &mut controls.right,
            Key::Up => &mut controls.up,
            Key::Down => &mut controls.down,
            Key::Jump => &mut controls.jump,
        }
    }
}

/// Turns key events into the `Controls` sent to the server each tick
pub struct InputManager {
    controls: Controls,
    autopilot: Option<PlayerType>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            controls: Controls::default(),
            autopilot: None,
        }
    }

    /// An input manager that drives `side` on its own.
    pub fn with_autopilot(side: PlayerType) -> Self {
        Self {
            controls: Controls::default(),
            autopilot: Some(side),
        }
    }

    pub fn autopilot(&self) -> Option<PlayerType> {
        self.autopilot
    }

    /// Key-down. Auto-repeat of an already held key is ignored.
    pub fn key_down(&mut self, key: Key) {
        let button = key.button(&mut self.controls);
        if !button.pressed {
            button.press();
        }
    }

    pub fn key_up(&mut self, key: Key) {
        key.button(&mut self.controls).release();
    }

    fn set_key(&mut self, key: Key, held: bool) {
        if held {
            self.key_down(key);
        } else {
            self.key_up(key);
        }
    }

    /// Lets the autopilot, if any, pick keys for this tick.
    pub fn update(&mut self, game: &Game) {
        let Some(side) = self.autopilot else {
            return;
        };
        let Some(me) = game.slot(side).filter(|player| player.is_occupied()) else {
            return;
        };

        let target = autopilot_target(game, side);
        let delta = target - me.position;

        self.set_key(Key::Left, delta.x < -AUTOPILOT_DEADZONE);
        self.set_key(Key::Right, delta.x > AUTOPILOT_DEADZONE);
        self.set_key(Key::Down, delta.y < -AUTOPILOT_DEADZONE);
        self.set_key(Key::Up, delta.y > AUTOPILOT_DEADZONE);
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Point behind the nearest puck in `side`'s half, or home when the half is
/// empty.
fn autopilot_target(game: &Game, side: PlayerType) -> Vec2 {
    let (home, behind) = match side {
        PlayerType::Player1 => (Vec2::new(0.0, 1.75), PLAYER_RADIUS),
        _ => (Vec2::new(0.0, -1.75), -PLAYER_RADIUS),
    };
    let in_half = |y: f32| if side == PlayerType::Player1 { y > 0.0 } else { y < 0.0 };

    let mut best: Option<(f32, Vec2)> = None;
    for puck in game.pucks.iter().filter(|puck| in_half(puck.position.y)) {
        let distance = (puck.position - home).length_squared();
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, puck.position));
        }
    }

    match best {
        Some((_, position)) => position + Vec2::new(0.0, behind),
        None => home,
    }
}
