//! Sprite-sheet frame selection for the player and enemies.
//!
//! Player sheet (12 frames, art faces left):
//!
//! | frames | pose |
//! |---|---|
//! | 0 | idle |
//! | 2..=4 | run cycle |
//! | 5 | jump |
//! | 7..=9 | run-and-shoot cycle (7 alone is idle-and-shoot) |
//! | 10 | jump-and-shoot |
//! | 11 | hit |
//!
//! Enemy sheet: two frames toggled on a slow clock.

use infman_core::animation::FrameClock;

use crate::entities::{Enemy, Facing, Player};

pub const PLAYER_SHEET_FRAMES: u32 = 12;
pub const ENEMY_SHEET_FRAMES: u32 = 2;
pub const HIT_FRAME: u32 = 11;

const IDLE: u32 = 0;
const JUMP: u32 = 5;
const IDLE_SHOOT: u32 = 7;
const JUMP_SHOOT: u32 = 10;
const RUN_FIRST: u32 = 2;
const RUN_LAST: u32 = 4;
const RUN_SHOOT_FIRST: u32 = 7;
const RUN_SHOOT_LAST: u32 = 9;

/// What the player is doing, as far as the sprite is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Airborne,
    Moving,
    Idle,
}

impl Pose {
    pub fn of(player: &Player) -> Self {
        if !player.grounded {
            Pose::Airborne
        } else if player.body.velocity.x != 0.0 {
            Pose::Moving
        } else {
            Pose::Idle
        }
    }
}

/// Advance `frame` within `first..=last`, entering at `first` from anywhere
/// outside the window and wrapping after `last`.
fn cycle(frame: u32, first: u32, last: u32) -> u32 {
    if frame < first || frame >= last {
        first
    } else {
        frame + 1
    }
}

pub fn next_player_frame(current: u32, pose: Pose, shooting: bool) -> u32 {
    match (pose, shooting) {
        (Pose::Airborne, true) => JUMP_SHOOT,
        (Pose::Airborne, false) => JUMP,
        (Pose::Moving, true) => cycle(current, RUN_SHOOT_FIRST, RUN_SHOOT_LAST),
        (Pose::Moving, false) => cycle(current, RUN_FIRST, RUN_LAST),
        (Pose::Idle, true) => IDLE_SHOOT,
        (Pose::Idle, false) => IDLE,
    }
}

pub fn next_enemy_frame(current: u32) -> u32 {
    if current == 0 {
        1
    } else {
        0
    }
}

/// The player's frame clock plus the mirror flag for the current facing.
#[derive(Debug, Clone, Default)]
pub struct PlayerAnimation {
    pub clock: FrameClock,
}

impl PlayerAnimation {
    pub fn update(&mut self, player: &Player, dt: f32, interval: f32) {
        let pose = Pose::of(player);
        let shooting = player.shooting;
        self.clock
            .advance_with(dt, interval, |frame| next_player_frame(frame, pose, shooting));
    }

    /// Show the hit pose for a full frame interval.
    pub fn show_hit(&mut self) {
        self.clock.reset(HIT_FRAME);
    }

    pub fn frame(&self) -> u32 {
        self.clock.frame
    }

    pub fn reset(&mut self) {
        self.clock.reset(IDLE);
    }
}

/// Sheet art faces left, so facing right samples the frame mirrored.
pub fn mirrored(facing: Facing) -> bool {
    facing == Facing::Right
}

pub fn update_enemy(enemy: &mut Enemy, dt: f32, interval: f32) {
    enemy.clock.advance_with(dt, interval, next_enemy_frame);
}
