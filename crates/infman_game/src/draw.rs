//! Backend-neutral draw commands built by the game every frame.
//!
//! World commands are in map pixels and go through the follow camera; screen
//! commands and text are in logical screen pixels (1200x600, y down). The
//! shell turns sprites and rects into textured quads and text into egui shapes.

use glam::Vec2;
use infman_core::geometry::Rect;

use crate::animation::{self, ENEMY_SHEET_FRAMES, PLAYER_SHEET_FRAMES};
use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::entities::{Player, ShotStyle};
use crate::physics::ViewCamera;
use crate::tilemap::Cell;
use crate::world::World;

/// sRGB, straight alpha.
pub type Color = [u8; 4];

pub const WHITE: Color = [255, 255, 255, 255];
pub const BLACK: Color = [0, 0, 0, 255];
pub const RAYWHITE: Color = [245, 245, 245, 255];
pub const LIGHTGRAY: Color = [200, 200, 200, 255];
pub const YELLOW: Color = [253, 249, 0, 255];
pub const RED: Color = [230, 41, 55, 255];
pub const GREEN: Color = [0, 228, 48, 255];
pub const BLUE: Color = [0, 121, 241, 255];
pub const DARKBLUE: Color = [0, 82, 172, 255];

/// Side of one background tile in world pixels.
pub const BACKGROUND_TILE: f32 = 128.0;
/// Destination size of the title art on the menu.
pub const TITLE_SIZE: Vec2 = Vec2::new(480.0, 160.0);

const HEART_SIZE: f32 = 30.0;
const HEART_ORIGIN: Vec2 = Vec2::new(85.0, 37.0);
const HEART_SPACING: f32 = 5.0;
const HUD_TEXT_SIZE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Background,
    Block,
    Spike,
    Gate,
    Enemies,
    Player,
    Heart,
    Title,
}

impl Sheet {
    pub const ALL: [Sheet; 8] = [
        Sheet::Background,
        Sheet::Block,
        Sheet::Spike,
        Sheet::Gate,
        Sheet::Enemies,
        Sheet::Player,
        Sheet::Heart,
        Sheet::Title,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Sheet::Background => "background.png",
            Sheet::Block => "tile1.png",
            Sheet::Spike => "spike.png",
            Sheet::Gate => "gate.png",
            Sheet::Enemies => "enemies.png",
            Sheet::Player => "player-sheet.png",
            Sheet::Heart => "heart.png",
            Sheet::Title => "inf_man.png",
        }
    }

    /// Frames laid out left to right across the sheet.
    pub fn frame_count(self) -> u32 {
        match self {
            Sheet::Player => PLAYER_SHEET_FRAMES,
            Sheet::Enemies => ENEMY_SHEET_FRAMES,
            _ => 1,
        }
    }

    /// Flat colour used when the image could not be loaded.
    pub fn fallback_tint(self) -> Color {
        match self {
            Sheet::Background => [40, 40, 60, 255],
            Sheet::Block => [130, 90, 50, 255],
            Sheet::Spike => [170, 170, 180, 255],
            Sheet::Gate => [120, 60, 200, 255],
            Sheet::Enemies => [200, 40, 40, 255],
            Sheet::Player => [40, 110, 230, 255],
            Sheet::Heart => [230, 41, 55, 255],
            Sheet::Title => [245, 245, 245, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite {
        sheet: Sheet,
        frame: u32,
        flip_x: bool,
        dst: Rect,
        tint: Color,
    },
    Rect {
        dst: Rect,
        color: Color,
    },
}

/// Text anchored at its top-left corner, in logical screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub clear_color: Color,
    /// Camera for `world`; `None` when the frame has no playfield.
    pub camera: Option<ViewCamera>,
    pub world: Vec<DrawCommand>,
    pub screen: Vec<DrawCommand>,
    pub texts: Vec<TextCommand>,
}

impl Default for DrawList {
    fn default() -> Self {
        Self {
            clear_color: RAYWHITE,
            camera: None,
            world: Vec::new(),
            screen: Vec::new(),
            texts: Vec::new(),
        }
    }
}

impl DrawList {
    pub fn clear(&mut self) {
        self.clear_color = RAYWHITE;
        self.camera = None;
        self.world.clear();
        self.screen.clear();
        self.texts.clear();
    }

    pub fn fill_screen(&mut self, color: Color) {
        self.clear_color = color;
        self.screen_rect(Rect::new(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT), color);
    }

    pub fn screen_rect(&mut self, dst: Rect, color: Color) {
        self.screen.push(DrawCommand::Rect { dst, color });
    }

    pub fn screen_sprite(&mut self, sheet: Sheet, dst: Rect) {
        self.screen.push(DrawCommand::Sprite {
            sheet,
            frame: 0,
            flip_x: false,
            dst,
            tint: WHITE,
        });
    }

    pub fn text(&mut self, text: impl Into<String>, position: Vec2, size: f32, color: Color) {
        self.texts.push(TextCommand {
            text: text.into(),
            position,
            size,
            color,
        });
    }
}

/// Approximate rendered width of `text` at `size`. Glyphs are monospace and
/// about 0.6 em wide; multi-line text measures its longest line.
pub fn measure_text(text: &str, size: f32) -> f32 {
    text.lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as f32
        * size
        * 0.6
}

/// Visible part of the world for `camera`, padded by one cell.
fn visible_world(camera: &ViewCamera, pad: f32) -> Rect {
    let top_left = camera.screen_to_world(Vec2::ZERO);
    let bottom_right = camera.screen_to_world(Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT));
    Rect::new(
        top_left.x - pad,
        top_left.y - pad,
        bottom_right.x - top_left.x + 2.0 * pad,
        bottom_right.y - top_left.y + 2.0 * pad,
    )
}

fn projectile_color(style: ShotStyle) -> Color {
    match style {
        ShotStyle::Horizontal => YELLOW,
        ShotStyle::Vertical => BLUE,
    }
}

/// Playfield, back to front: background, player, coins, map, projectiles,
/// enemies. Anything outside the view is skipped.
pub fn draw_world(world: &World, list: &mut DrawList) {
    let map = &world.map;
    let cell = map.cell_size();
    let view = visible_world(&world.camera, cell * 2.0);
    list.camera = Some(world.camera);

    let extent = map.world_size();
    let tiles_x = (extent.x / BACKGROUND_TILE).ceil() as u32;
    let tiles_y = (extent.y / BACKGROUND_TILE).ceil() as u32;
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let dst = Rect::new(
                tx as f32 * BACKGROUND_TILE,
                ty as f32 * BACKGROUND_TILE,
                BACKGROUND_TILE,
                BACKGROUND_TILE,
            );
            if dst.overlaps(&view) {
                list.world.push(DrawCommand::Sprite {
                    sheet: Sheet::Background,
                    frame: 0,
                    flip_x: false,
                    dst,
                    tint: BLUE,
                });
            }
        }
    }

    list.world.push(DrawCommand::Sprite {
        sheet: Sheet::Player,
        frame: world.player_animation.frame(),
        flip_x: animation::mirrored(world.player.facing),
        dst: world.player.rect(),
        tint: WHITE,
    });

    for coin in world.coins.iter_active() {
        list.world.push(DrawCommand::Rect {
            dst: coin.rect,
            color: YELLOW,
        });
    }

    for (row, col, kind) in map.cells() {
        let (sheet, dst) = match kind {
            Cell::Block => (Sheet::Block, map.cell_rect(row, col)),
            Cell::Hazard => (Sheet::Spike, map.cell_rect(row, col)),
            Cell::Goal => {
                let origin = map.cell_origin(row, col);
                (
                    Sheet::Gate,
                    Rect::new(origin.x, origin.y - 16.0, cell * 2.0, cell * 2.0),
                )
            }
            _ => continue,
        };
        if dst.overlaps(&view) {
            list.world.push(DrawCommand::Sprite {
                sheet,
                frame: 0,
                flip_x: false,
                dst,
                tint: WHITE,
            });
        }
    }

    for shot in world.projectiles.iter_active() {
        list.world.push(DrawCommand::Rect {
            dst: shot.rect,
            color: projectile_color(shot.style),
        });
    }

    for enemy in world.enemies.iter_active() {
        let dst = enemy.rect();
        if dst.overlaps(&view) {
            list.world.push(DrawCommand::Sprite {
                sheet: Sheet::Enemies,
                frame: enemy.clock.frame,
                flip_x: false,
                dst,
                tint: WHITE,
            });
        }
    }
}

/// Label on a black backing box five pixels wider on every side.
fn boxed_label(list: &mut DrawList, text: String, position: Vec2) {
    let width = measure_text(&text, HUD_TEXT_SIZE);
    list.screen_rect(
        Rect::new(
            position.x - 5.0,
            position.y - 5.0,
            width + 10.0,
            HUD_TEXT_SIZE + 10.0,
        ),
        BLACK,
    );
    list.text(text, position, HUD_TEXT_SIZE, WHITE);
}

/// Hearts for remaining health plus the health and points labels.
pub fn draw_hud(player: &Player, list: &mut DrawList) {
    for i in 0..player.health.max(0) {
        let x = HEART_ORIGIN.x + i as f32 * (HEART_SIZE + HEART_SPACING);
        list.screen_sprite(
            Sheet::Heart,
            Rect::new(x, HEART_ORIGIN.y, HEART_SIZE, HEART_SIZE),
        );
    }
    boxed_label(list, "Health:".to_string(), Vec2::new(10.0, 40.0));
    boxed_label(
        list,
        format!("Points: {}", player.points),
        Vec2::new(10.0, 70.0),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::sample_world;

    fn sprites_of(commands: &[DrawCommand], wanted: Sheet) -> usize {
        commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Sprite { sheet, .. } if *sheet == wanted))
            .count()
    }

    #[test]
    fn measure_text_scales_with_size_and_longest_line() {
        assert_eq!(measure_text("", 20.0), 0.0);
        assert_eq!(measure_text("Start", 50.0), 150.0);
        assert_eq!(measure_text("ab\nabcd\nc", 10.0), 24.0);
    }

    #[test]
    fn sheet_indices_follow_declaration_order() {
        for (i, sheet) in Sheet::ALL.iter().enumerate() {
            assert_eq!(sheet.index(), i);
        }
        assert_eq!(Sheet::Player.frame_count(), 12);
        assert_eq!(Sheet::Enemies.frame_count(), 2);
        assert_eq!(Sheet::Gate.frame_count(), 1);
    }

    #[test]
    fn world_draw_order_starts_with_background_then_player() {
        let mut world = sample_world();
        // Bring the enemy at column 40 into view.
        world.player.body.position.x = 600.0;
        world
            .camera
            .follow(&world.player, SCREEN_HEIGHT, world.config.camera_lift);
        let mut list = DrawList::default();
        draw_world(&world, &mut list);

        assert!(list.camera.is_some());
        let first_non_background = list
            .world
            .iter()
            .find(|cmd| !matches!(cmd, DrawCommand::Sprite { sheet: Sheet::Background, .. }));
        assert!(matches!(
            first_non_background,
            Some(DrawCommand::Sprite {
                sheet: Sheet::Player,
                ..
            })
        ));
        assert!(sprites_of(&list.world, Sheet::Block) > 0);
        assert!(matches!(
            list.world.last(),
            Some(DrawCommand::Sprite {
                sheet: Sheet::Enemies,
                ..
            })
        ));
    }

    #[test]
    fn offscreen_blocks_are_culled() {
        let world = sample_world();
        let mut list = DrawList::default();
        draw_world(&world, &mut list);
        // The floor spans 210 cells; the zoomed view shows about 40 of them.
        let blocks = sprites_of(&list.world, Sheet::Block);
        assert!(blocks < 210, "drew {blocks} blocks");
        assert_eq!(sprites_of(&list.world, Sheet::Enemies), 0);
    }

    #[test]
    fn hud_has_a_heart_per_health_point() {
        let world = sample_world();
        let mut list = DrawList::default();
        draw_hud(&world.player, &mut list);
        assert_eq!(sprites_of(&list.screen, Sheet::Heart), 3);
        assert_eq!(list.texts.len(), 2);
        assert_eq!(list.texts[1].text, "Points: 0");

        let mut dead = world.player.clone();
        dead.health = -1;
        list.clear();
        draw_hud(&dead, &mut list);
        assert_eq!(sprites_of(&list.screen, Sheet::Heart), 0);
    }
}
