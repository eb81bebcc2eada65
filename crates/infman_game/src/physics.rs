//! Player movement: gravity, steering, integration and the follow camera.

use glam::Vec2;
use infman_core::input::{InputState, Key};

use crate::config::GameConfig;
use crate::entities::{Body, Facing, Player};

/// Per-step player controls, decoupled from the keyboard so tests and
/// replays can drive the simulation directly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    pub left: bool,
    pub right: bool,
    pub jump_pressed: bool,
    pub fire_horizontal: bool,
    pub fire_vertical: bool,
}

impl PlayerIntent {
    pub fn from_input(input: &InputState) -> Self {
        Self {
            left: input.is_held(Key::Left),
            right: input.is_held(Key::Right),
            jump_pressed: input.is_just_pressed(Key::Space),
            fire_horizontal: input.is_just_pressed(Key::Z),
            fire_vertical: input.is_just_pressed(Key::X),
        }
    }
}

pub fn apply_gravity(body: &mut Body, gravity: f32, dt: f32) {
    body.velocity.y += gravity * dt;
}

pub fn integrate(body: &mut Body, dt: f32) {
    body.position += body.velocity * dt;
}

/// Set horizontal velocity from held keys and start a jump when grounded.
/// Left wins when both directions are held.
pub fn steer(player: &mut Player, intent: PlayerIntent, config: &GameConfig) {
    player.body.velocity.x = 0.0;
    if intent.right {
        player.body.velocity.x = config.player_speed;
        player.facing = Facing::Right;
    }
    if intent.left {
        player.body.velocity.x = -config.player_speed;
        player.facing = Facing::Left;
    }
    if intent.jump_pressed && player.grounded {
        player.body.velocity.y = config.jump_velocity;
        player.grounded = false;
    }
}

/// Falling below the visible area costs one health point and a respawn.
/// Returns true when it happened.
pub fn respawn_on_fall(player: &mut Player, screen_height: f32) -> bool {
    if player.body.position.y > screen_height {
        player.take_hit();
        return true;
    }
    false
}

/// View parameters for the playfield. `target` is the world point drawn at
/// `offset` on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub target: Vec2,
    pub offset: Vec2,
    pub zoom: f32,
}

impl ViewCamera {
    pub fn new(screen: Vec2, zoom: f32) -> Self {
        Self {
            target: screen * 0.5,
            offset: screen * 0.5,
            zoom,
        }
    }

    /// Track the player horizontally; vertically the view is fixed `lift`
    /// pixels above the screen centre.
    pub fn follow(&mut self, player: &Player, screen_height: f32, lift: f32) {
        self.target = Vec2::new(
            player.body.position.x + player.body.size.x / 2.0,
            screen_height / 2.0 - lift,
        );
    }

    #[cfg(test)]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.target) * self.zoom + self.offset
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.zoom + self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent() -> PlayerIntent {
        PlayerIntent::default()
    }

    #[test]
    fn gravity_then_integration_moves_body_down() {
        let mut body = Body::new(Vec2::new(0.0, 0.0), Vec2::splat(32.0));
        apply_gravity(&mut body, 800.0, 0.5);
        integrate(&mut body, 0.5);
        assert_eq!(body.velocity.y, 400.0);
        assert_eq!(body.position.y, 200.0);
    }

    #[test]
    fn steering_zeroes_then_sets_horizontal_velocity() {
        let config = GameConfig::default();
        let mut player = Player::new(Vec2::ZERO);
        player.body.velocity.x = 123.0;

        steer(&mut player, intent(), &config);
        assert_eq!(player.body.velocity.x, 0.0);

        steer(&mut player, PlayerIntent { right: true, ..intent() }, &config);
        assert_eq!(player.body.velocity.x, 200.0);
        assert_eq!(player.facing, Facing::Right);

        steer(
            &mut player,
            PlayerIntent {
                left: true,
                right: true,
                ..intent()
            },
            &config,
        );
        assert_eq!(player.body.velocity.x, -200.0);
        assert_eq!(player.facing, Facing::Left);
    }

    #[test]
    fn jump_requires_ground() {
        let config = GameConfig::default();
        let mut player = Player::new(Vec2::ZERO);
        let jump = PlayerIntent {
            jump_pressed: true,
            ..intent()
        };

        steer(&mut player, jump, &config);
        assert_eq!(player.body.velocity.y, 0.0, "airborne jump ignored");

        player.grounded = true;
        steer(&mut player, jump, &config);
        assert_eq!(player.body.velocity.y, -300.0);
        assert!(!player.grounded);
    }

    #[test]
    fn falling_off_screen_respawns_with_penalty() {
        let mut player = Player::new(Vec2::new(48.0, 32.0));
        player.body.position.y = 600.0;
        assert!(!respawn_on_fall(&mut player, 600.0), "exactly at the edge");

        player.body.position.y = 601.0;
        player.body.velocity = Vec2::new(200.0, 500.0);
        assert!(respawn_on_fall(&mut player, 600.0));
        assert_eq!(player.body.position, Vec2::new(48.0, 32.0));
        assert_eq!(player.body.velocity, Vec2::ZERO);
        assert_eq!(player.health, 2);
    }

    #[test]
    fn camera_follows_player_centre_at_fixed_height() {
        let mut camera = ViewCamera::new(Vec2::new(1200.0, 600.0), 2.0);
        let mut player = Player::new(Vec2::ZERO);
        player.body.position = Vec2::new(500.0, 77.0);
        camera.follow(&player, 600.0, 110.0);
        assert_eq!(camera.target, Vec2::new(516.0, 190.0));
        assert_eq!(camera.offset, Vec2::new(600.0, 300.0));

        let screen = camera.world_to_screen(camera.target);
        assert_eq!(screen, camera.offset);
        let back = camera.screen_to_world(Vec2::new(0.0, 0.0));
        assert_eq!(back, Vec2::new(216.0, 40.0));
    }
}
