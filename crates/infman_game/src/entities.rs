use glam::Vec2;
use infman_core::animation::FrameClock;
use infman_core::geometry::Rect;

use crate::config::GameConfig;
use crate::pool::Pooled;

pub const PLAYER_SIZE: Vec2 = Vec2::new(32.0, 32.0);
pub const PLAYER_MAX_HEALTH: i32 = 3;
/// Longest stored name in bytes; the on-disk record keeps one byte for NUL.
pub const MAX_NAME_BYTES: usize = 19;
pub const ENEMY_HEALTH: i32 = 1;
pub const COIN_VALUE: i32 = 10;
pub const ENEMY_KILL_POINTS: i32 = 100;

/// Position, size and velocity of anything that moves. The collision rect is
/// always derived from these, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            velocity: Vec2::ZERO,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Body,
    pub grounded: bool,
    pub facing: Facing,
    pub shooting: bool,
    /// Time accumulated since `shooting` last became true.
    pub shoot_timer: f32,
    pub health: i32,
    pub points: i32,
    pub name: String,
    pub spawn: Vec2,
    pub finished: bool,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            body: Body::new(spawn, PLAYER_SIZE),
            grounded: false,
            facing: Facing::Right,
            shooting: false,
            shoot_timer: 0.0,
            health: PLAYER_MAX_HEALTH,
            points: 0,
            name: String::new(),
            spawn,
            finished: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    /// Back to the spawn cell with no momentum. Health and score are untouched.
    pub fn respawn(&mut self) {
        self.body.position = self.spawn;
        self.body.velocity = Vec2::ZERO;
    }

    /// Lose one health point and respawn.
    pub fn take_hit(&mut self) {
        self.health -= 1;
        self.respawn();
        log::debug!("Player hit, health now {}", self.health);
    }

    pub fn is_dead(&self) -> bool {
        self.health < 0
    }

    /// Start-of-run state: full health, no score, at spawn.
    pub fn reset_run(&mut self) {
        self.respawn();
        self.health = PLAYER_MAX_HEALTH;
        self.points = 0;
        self.finished = false;
        self.shooting = false;
        self.shoot_timer = 0.0;
        self.grounded = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub body: Body,
    pub min_x: f32,
    pub max_x: f32,
    pub health: i32,
    pub active: bool,
    pub clock: FrameClock,
}

impl Enemy {
    pub fn spawn_at(position: Vec2, size: f32, config: &GameConfig) -> Self {
        let mut body = Body::new(position, Vec2::splat(size));
        body.velocity.x = config.enemy_speed;
        Self {
            body,
            min_x: position.x,
            max_x: position.x + config.patrol_offset,
            health: ENEMY_HEALTH,
            active: false,
            clock: FrameClock::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    /// Walk between the patrol bounds. Direction flips only when a bound has
    /// been reached while still heading past it.
    pub fn patrol(&mut self, dt: f32) {
        let x = self.body.position.x;
        let vx = self.body.velocity.x;
        if (x <= self.min_x && vx < 0.0) || (x >= self.max_x && vx > 0.0) {
            self.body.velocity.x = -vx;
        }
        self.body.position.x += self.body.velocity.x * dt;
    }

    /// Apply one point of damage. Returns true when this killed the enemy.
    pub fn damage(&mut self) -> bool {
        self.health -= 1;
        if self.health <= 0 {
            self.health = 0;
            self.active = false;
            return true;
        }
        false
    }
}

impl Pooled for Enemy {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShotStyle {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub rect: Rect,
    pub velocity: Vec2,
    pub active: bool,
    pub style: ShotStyle,
}

impl Projectile {
    /// Shot leaving `player` on its facing side, vertically centred on it.
    pub fn fired_by(player: &Player, style: ShotStyle, config: &GameConfig) -> Self {
        let (w, h) = match style {
            ShotStyle::Horizontal => (config.projectile_length, config.projectile_thickness),
            ShotStyle::Vertical => (config.projectile_thickness, config.projectile_length),
        };
        let body = player.rect();
        let x = match player.facing {
            Facing::Right => body.right(),
            Facing::Left => body.x - w,
        };
        let y = body.y + body.h / 2.0 - h / 2.0;
        let velocity = match style {
            ShotStyle::Horizontal => Vec2::new(player.facing.sign() * config.projectile_speed, 0.0),
            ShotStyle::Vertical if player.grounded => Vec2::new(0.0, -config.projectile_speed),
            ShotStyle::Vertical => Vec2::new(0.0, config.projectile_speed),
        };
        Self {
            rect: Rect::new(x, y, w, h),
            velocity,
            active: false,
            style,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.rect = self.rect.translated(self.velocity * dt);
    }

    /// Outside the window of one screen in every direction around `anchor`.
    pub fn is_out_of_range(&self, anchor: Vec2, range: Vec2) -> bool {
        self.rect.x < anchor.x - range.x
            || self.rect.x > anchor.x + range.x
            || self.rect.y < anchor.y - range.y
            || self.rect.y > anchor.y + range.y
    }
}

impl Pooled for Projectile {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Coin {
    pub rect: Rect,
    pub active: bool,
    pub value: i32,
}

impl Coin {
    pub fn spawn_at(position: Vec2, size: f32) -> Self {
        Self {
            rect: Rect::from_pos_size(position, Vec2::splat(size)),
            active: false,
            value: COIN_VALUE,
        }
    }
}

impl Pooled for Coin {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Cut `name` to at most `MAX_NAME_BYTES` without splitting a character.
pub fn bounded_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
