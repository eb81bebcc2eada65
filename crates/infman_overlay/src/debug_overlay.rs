//! egui layer composited over the sprite pass.
//!
//! Two things are drawn through egui: the game's own text (HUD, menu labels,
//! leaderboard rows), which is painted on the background layer in logical
//! screen coordinates, and the F3 debug window on top of it.
//!
//! egui needs its render split into phases because `egui_wgpu::Renderer::render()`
//! wants a `RenderPass<'static>` while `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` -- run egui, paint text and the debug window, tessellate
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references

use infman_core::time::TimeState;
use winit::window::Window;

/// One line of game text, positioned by its top-left corner in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub position: [f32; 2],
    pub size: f32,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub mode_label: String,
    pub player_position: [f32; 2],
    pub player_velocity: [f32; 2],
    pub health: i32,
    pub points: i32,
    pub grounded: bool,
    pub active_enemies: usize,
    pub active_projectiles: usize,
    pub active_coins: usize,
    /// Shots dropped because the projectile pool was full.
    pub projectile_drops: u64,
    pub draw_calls: u32,
    pub sprite_count: u32,
}

/// Maps the game's fixed logical resolution onto egui's point space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalScale {
    pub x: f32,
    pub y: f32,
}

impl LogicalScale {
    pub fn new(screen_points: egui::Vec2, logical: (u32, u32)) -> Self {
        Self {
            x: screen_points.x / logical.0.max(1) as f32,
            y: screen_points.y / logical.1.max(1) as f32,
        }
    }

    pub fn point(&self, logical: [f32; 2]) -> egui::Pos2 {
        egui::pos2(logical[0] * self.x, logical[1] * self.y)
    }

    pub fn font_size(&self, logical: f32) -> f32 {
        logical * self.y
    }
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
    logical_size: (u32, u32),
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
        logical_size: (u32, u32),
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
            logical_size,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        // The game text layer is not interactive; only the debug window may
        // swallow input.
        response.consumed && self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        texts: &[OverlayText],
        stats: Option<&OverlayStats>,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let logical_size = self.logical_size;
        let visible = self.visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            paint_texts(ctx, logical_size, texts);
            if visible {
                debug_window(ctx, time, stats);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn paint_texts(ctx: &egui::Context, logical_size: (u32, u32), texts: &[OverlayText]) {
    if texts.is_empty() {
        return;
    }
    let scale = LogicalScale::new(ctx.screen_rect().size(), logical_size);
    let painter = ctx.layer_painter(egui::LayerId::background());
    for text in texts {
        let [r, g, b, a] = text.color;
        painter.text(
            scale.point(text.position),
            egui::Align2::LEFT_TOP,
            &text.text,
            egui::FontId::monospace(scale.font_size(text.size)),
            egui::Color32::from_rgba_unmultiplied(r, g, b, a),
        );
    }
}

fn debug_window(ctx: &egui::Context, time: &TimeState, stats: Option<&OverlayStats>) {
    egui::Window::new("Debug")
        .default_pos([10.0, 120.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", time.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
            ui.label(format!("Steps this frame: {}", time.steps_this_frame));
            ui.label(format!("Total steps: {}", time.fixed_step_count));
            ui.label(format!("Frame: {}", time.frame_count));

            let Some(stats) = stats else {
                return;
            };
            ui.separator();
            ui.label(format!("Mode: {}", stats.mode_label));
            ui.label(format!(
                "Player: ({:.1}, {:.1}) vel ({:.1}, {:.1}){}",
                stats.player_position[0],
                stats.player_position[1],
                stats.player_velocity[0],
                stats.player_velocity[1],
                if stats.grounded { " grounded" } else { "" }
            ));
            ui.label(format!("Health: {}  Points: {}", stats.health, stats.points));

            ui.separator();
            ui.label(format!("Enemies: {}", stats.active_enemies));
            ui.label(format!("Projectiles: {}", stats.active_projectiles));
            ui.label(format!("Coins: {}", stats.active_coins));
            if stats.projectile_drops > 0 {
                ui.colored_label(
                    egui::Color32::YELLOW,
                    format!("Dropped shots: {}", stats.projectile_drops),
                );
            }

            ui.separator();
            ui.label(format!("Draw calls: {}", stats.draw_calls));
            ui.label(format!("Sprites: {}", stats.sprite_count));
        });
}
