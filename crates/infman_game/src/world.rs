//! Playfield state and the per-step update order.
//!
//! One `step` runs, in order: movement (gravity, fall check, steering,
//! integration, camera), pools (enemy patrol, projectile motion and culling,
//! firing), contact rules, then animation.

use glam::Vec2;

use crate::animation::{self, PlayerAnimation};
use crate::config::{GameConfig, MAX_COINS, MAX_ENEMIES, MAX_PROJECTILES, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::entities::{Coin, Enemy, Player, Projectile, ShotStyle};
use crate::physics::{self, PlayerIntent, ViewCamera};
use crate::pool::Pool;
use crate::rules::{self, ContactTargets, FrameEvents};
use crate::tilemap::{Cell, MapError, TileMap};

pub struct World {
    pub config: GameConfig,
    pub map: TileMap,
    pub player: Player,
    pub enemies: Pool<Enemy>,
    pub projectiles: Pool<Projectile>,
    pub coins: Pool<Coin>,
    pub camera: ViewCamera,
    pub player_animation: PlayerAnimation,
}

impl World {
    pub fn new(map: TileMap, config: GameConfig) -> Result<Self, MapError> {
        let spawn = map.player_spawn()?;
        let mut world = Self {
            camera: ViewCamera::new(Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT), config.camera_zoom),
            player: Player::new(spawn),
            enemies: Pool::with_capacity(MAX_ENEMIES),
            projectiles: Pool::with_capacity(MAX_PROJECTILES),
            coins: Pool::with_capacity(MAX_COINS),
            player_animation: PlayerAnimation::default(),
            config,
            map,
        };
        world.populate();
        world.camera.follow(&world.player, SCREEN_HEIGHT, world.config.camera_lift);
        log::info!(
            "World ready: spawn ({}, {}), {} enemies, {} coins",
            spawn.x,
            spawn.y,
            world.enemies.active_count(),
            world.coins.active_count()
        );
        Ok(world)
    }

    /// Rebuild enemies and coins from the map's spawn cells.
    fn populate(&mut self) {
        let size = self.map.cell_size();
        let config = &self.config;
        let enemy_overflow = self.enemies.reset_from(
            self.map
                .positions_of(Cell::EnemySpawn)
                .map(|pos| Enemy::spawn_at(pos, size, config)),
        );
        let coin_overflow = self.coins.reset_from(
            self.map
                .positions_of(Cell::CoinSpawn)
                .map(|pos| Coin::spawn_at(pos, size)),
        );
        if enemy_overflow > 0 {
            log::warn!("Map has {enemy_overflow} more enemy spawns than the pool holds");
        }
        if coin_overflow > 0 {
            log::warn!("Map has {coin_overflow} more coins than the pool holds");
        }
    }

    /// Fresh run: respawned pools, no projectiles, player back at full health.
    pub fn reset_run(&mut self) {
        self.populate();
        self.projectiles.clear();
        self.player.reset_run();
        self.player_animation.reset();
        self.camera
            .follow(&self.player, SCREEN_HEIGHT, self.config.camera_lift);
        log::info!("Run reset");
    }

    pub fn step(&mut self, intent: PlayerIntent, dt: f32) -> FrameEvents {
        let mut events = FrameEvents::default();

        self.move_player(intent, dt, &mut events);
        self.update_pools(intent, dt, &mut events);
        rules::apply_contact_rules(
            &mut self.player,
            ContactTargets {
                map: &self.map,
                enemies: &mut self.enemies,
                projectiles: &mut self.projectiles,
                coins: &mut self.coins,
                animation: &mut self.player_animation,
            },
            &mut events,
        );
        self.animate(dt);

        events
    }

    fn move_player(&mut self, intent: PlayerIntent, dt: f32, events: &mut FrameEvents) {
        physics::apply_gravity(&mut self.player.body, self.config.gravity, dt);
        events.fell = physics::respawn_on_fall(&mut self.player, SCREEN_HEIGHT);
        physics::steer(&mut self.player, intent, &self.config);
        physics::integrate(&mut self.player.body, dt);
        self.camera
            .follow(&self.player, SCREEN_HEIGHT, self.config.camera_lift);
    }

    fn update_pools(&mut self, intent: PlayerIntent, dt: f32, events: &mut FrameEvents) {
        for enemy in self.enemies.iter_active_mut() {
            enemy.patrol(dt);
        }

        let anchor = self.player.body.position;
        let range = Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        for shot in self.projectiles.iter_active_mut() {
            shot.advance(dt);
            if shot.is_out_of_range(anchor, range) || self.map.overlaps_solid(&shot.rect) {
                shot.active = false;
            }
        }

        let mut fired = false;
        for (wanted, style) in [
            (intent.fire_horizontal, ShotStyle::Horizontal),
            (intent.fire_vertical, ShotStyle::Vertical),
        ] {
            if !wanted {
                continue;
            }
            fired = true;
            let shot = Projectile::fired_by(&self.player, style, &self.config);
            if self.projectiles.spawn(shot).is_some() {
                events.shots_fired += 1;
            } else {
                events.shots_dropped += 1;
            }
        }
        self.update_shooting(fired, dt);
    }

    /// `shooting` stays on for `shoot_duration` of accumulated time after it
    /// was first set; firing again inside the window does not extend it.
    fn update_shooting(&mut self, fired: bool, dt: f32) {
        let player = &mut self.player;
        if fired {
            player.shooting = true;
        }
        if player.shooting {
            player.shoot_timer += dt;
            if player.shoot_timer >= self.config.shoot_duration {
                player.shooting = false;
                player.shoot_timer = 0.0;
            }
        }
    }

    fn animate(&mut self, dt: f32) {
        self.player_animation
            .update(&self.player, dt, self.config.player_frame_interval);
        let interval = self.config.enemy_frame_interval;
        for enemy in self.enemies.iter_active_mut() {
            animation::update_enemy(enemy, dt, interval);
        }
    }
}
