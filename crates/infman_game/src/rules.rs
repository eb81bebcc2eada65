//! Contact rules between the player, the map and the entity pools.
//!
//! `apply_contact_rules` runs the passes in a fixed order; later passes read
//! what earlier ones changed (grounded flag, respawned position).

use infman_core::geometry::Axis;

use crate::animation::PlayerAnimation;
use crate::entities::{Coin, Enemy, Player, Projectile, ENEMY_KILL_POINTS};
use crate::pool::Pool;
use crate::tilemap::{Cell, TileMap};

/// What happened during one step, for the scene machine and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEvents {
    pub fell: bool,
    pub hazard_hits: u32,
    pub enemy_hits: u32,
    pub enemies_damaged: u32,
    pub enemies_killed: u32,
    pub coins_collected: u32,
    pub goal_reached: bool,
    pub shots_fired: u32,
    pub shots_dropped: u32,
}

impl FrameEvents {
    pub fn player_hit(&self) -> bool {
        self.fell || self.hazard_hits > 0 || self.enemy_hits > 0
    }
}

/// Blocks push the player out; hazards hurt and respawn; the goal finishes
/// the run once.
pub fn player_vs_tiles(player: &mut Player, map: &TileMap, events: &mut FrameEvents) {
    player.grounded = false;

    for (row, col, cell) in map.cells() {
        match cell {
            Cell::Block => {
                let block = map.cell_rect(row, col);
                let Some(correction) = player.rect().resolve_overlap(&block) else {
                    continue;
                };
                match correction.axis {
                    Axis::Vertical => {
                        player.body.velocity.y = 0.0;
                        player.body.position.y += correction.delta;
                        if correction.delta < 0.0 {
                            player.grounded = true;
                        }
                    }
                    Axis::Horizontal => {
                        player.body.velocity.x = 0.0;
                        player.body.position.x += correction.delta;
                    }
                }
            }
            Cell::Hazard => {
                if player.rect().overlaps(&map.cell_rect(row, col)) {
                    player.take_hit();
                    events.hazard_hits += 1;
                }
            }
            Cell::Goal => {
                if !player.finished && player.rect().overlaps(&map.cell_rect(row, col)) {
                    player.finished = true;
                    events.goal_reached = true;
                    log::info!("Goal reached with {} points", player.points);
                }
            }
            _ => {}
        }
    }
}

/// Touching an active enemy costs a health point and respawns the player.
/// The enemy is unaffected.
pub fn player_vs_enemies(
    player: &mut Player,
    enemies: &Pool<Enemy>,
    animation: &mut PlayerAnimation,
    events: &mut FrameEvents,
) {
    for enemy in enemies.iter_active() {
        if player.rect().overlaps(&enemy.rect()) {
            player.take_hit();
            animation.show_hit();
            events.enemy_hits += 1;
        }
    }
}

/// Each active projectile damages at most one enemy, the first it overlaps.
pub fn projectiles_vs_enemies(
    projectiles: &mut Pool<Projectile>,
    enemies: &mut Pool<Enemy>,
    player: &mut Player,
    events: &mut FrameEvents,
) {
    for shot in projectiles.iter_active_mut() {
        let Some(enemy) = enemies
            .iter_active_mut()
            .find(|enemy| shot.rect.overlaps(&enemy.rect()))
        else {
            continue;
        };
        player.points += ENEMY_KILL_POINTS;
        events.enemies_damaged += 1;
        if enemy.damage() {
            events.enemies_killed += 1;
            log::debug!("Enemy destroyed, points now {}", player.points);
        }
        shot.active = false;
    }
}

pub fn player_vs_coins(player: &mut Player, coins: &mut Pool<Coin>, events: &mut FrameEvents) {
    let body = player.rect();
    for coin in coins.iter_active_mut() {
        if body.overlaps(&coin.rect) {
            coin.active = false;
            player.points += coin.value;
            events.coins_collected += 1;
            log::debug!("Coin collected, points now {}", player.points);
        }
    }
}

pub struct ContactTargets<'a> {
    pub map: &'a TileMap,
    pub enemies: &'a mut Pool<Enemy>,
    pub projectiles: &'a mut Pool<Projectile>,
    pub coins: &'a mut Pool<Coin>,
    pub animation: &'a mut PlayerAnimation,
}

pub fn apply_contact_rules(
    player: &mut Player,
    targets: ContactTargets<'_>,
    events: &mut FrameEvents,
) {
    player_vs_tiles(player, targets.map, events);
    player_vs_enemies(player, targets.enemies, targets.animation, events);
    projectiles_vs_enemies(targets.projectiles, targets.enemies, player, events);
    player_vs_coins(player, targets.coins, events);
}
