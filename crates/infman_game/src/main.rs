//! INF-MAN: main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. All simulation runs
//! inside `RedrawRequested` on a fixed timestep (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `Game::run_frame` -- advance the mode machine by the fixed steps due;
//!      one-shot input goes to the first step only
//!   3. Ask the game for a `DrawList`, rebuild the quad batch from it
//!   4. Upload both camera uniforms, draw world then screen quads, composite
//!      the egui text layer and debug window
//!
//! The map and config are loaded before the window opens; a bad map ends the
//! process with exit code 1.

mod animation;
mod config;
mod draw;
mod entities;
mod leaderboard;
mod physics;
mod pool;
#[cfg(test)]
mod replay;
mod rules;
mod scene;
mod tilemap;
mod world;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{GameConfig, BLOCK_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use draw::{Color, DrawCommand, DrawList, Sheet};
use infman_core::input::{InputState, Key, MouseBtn};
use infman_core::time::TimeState;
use infman_overlay::{DebugOverlay, OverlayStats, OverlayText};
use infman_platform::audio::{open_music_or_silence, MusicStream};
use infman_platform::window::PlatformConfig;
use infman_render::{Camera2D, GpuContext, QuadBatch, SpritePipeline, SpriteVertex, Texture, UvRect};
use scene::Game;
use tilemap::{MapError, TileMap};
use world::World;

const MAP_PATH: &str = "assets/map.txt";
const LEADERBOARD_PATH: &str = "top_scores.bin";
const CONFIG_PATH: &str = "assets/config/game.json";
const MUSIC_PATH: &str = "assets/audio/music.wav";
const TEXTURE_DIR: &str = "assets/textures";
const LOGICAL_SIZE: (u32, u32) = (SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
/// Texture slot after the sheets, used for solid rectangles.
const WHITE_TEXTURE: usize = Sheet::ALL.len();

struct SheetTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
    /// Set when the image failed to load and the white stand-in is used.
    fallback_tint: Option<[f32; 4]>,
}

struct CameraBinding {
    camera: Camera2D,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    fn new(device: &wgpu::Device, pipeline: &SpritePipeline, camera: Camera2D, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[camera.build_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = pipeline.create_camera_bind_group(device, &buffer);
        Self {
            camera,
            buffer,
            bind_group,
        }
    }

    fn upload(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );
    }
}

/// Window, GPU and per-frame render state. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    music: Box<dyn MusicStream>,

    // Indexed by `Sheet::index`, then `WHITE_TEXTURE`.
    textures: Vec<SheetTexture>,
    world_camera: CameraBinding,
    screen_camera: CameraBinding,

    // --- Per-frame mesh state -----------------------------------------------
    // Rebuilt on the CPU every frame and streamed into these buffers, which
    // grow (power-of-two) but never shrink.
    draw_list: DrawList,
    batch: QuadBatch,
    world_call_count: usize,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay =
            DebugOverlay::new(&gpu.device, gpu.surface_format, &window, LOGICAL_SIZE);

        let mut textures: Vec<SheetTexture> = Sheet::ALL
            .iter()
            .map(|&sheet| load_sheet_texture(&gpu, &sprite_pipeline, sheet))
            .collect();
        let white = Texture::white(&gpu.device, &gpu.queue, "white");
        textures.push(SheetTexture {
            bind_group: sprite_pipeline.create_texture_bind_group(&gpu.device, &white),
            texture: white,
            fallback_tint: None,
        });
        let texture_bytes: usize = textures.iter().map(|t| t.texture.byte_size()).sum();
        log::info!(
            "Loaded {} textures ({} KiB)",
            textures.len(),
            texture_bytes / 1024
        );

        let world_camera = CameraBinding::new(
            &gpu.device,
            &sprite_pipeline,
            Camera2D::new(LOGICAL_SIZE.0, LOGICAL_SIZE.1),
            "World Camera Uniform Buffer",
        );
        let screen_camera = CameraBinding::new(
            &gpu.device,
            &sprite_pipeline,
            Camera2D::screen(LOGICAL_SIZE.0, LOGICAL_SIZE.1),
            "Screen Camera Uniform Buffer",
        );

        let mut music = open_music_or_silence(Path::new(MUSIC_PATH));
        music.set_volume(config.music_volume);
        music.play();

        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Ok(Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            sprite_pipeline,
            debug_overlay,
            music,
            textures,
            world_camera,
            screen_camera,
            draw_list: DrawList::default(),
            batch: QuadBatch::default(),
            world_call_count: 0,
            vertex_buffer,
            index_buffer,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        })
    }

    /// Turn the current draw list into quads: world commands first, sealed
    /// off from the screen commands so each half binds its own camera.
    fn rebuild_mesh(&mut self) {
        self.batch.clear();
        for command in &self.draw_list.world {
            push_command(&mut self.batch, &self.textures, command);
        }
        self.world_call_count = self.batch.seal();
        for command in &self.draw_list.screen {
            push_command(&mut self.batch, &self.textures, command);
        }

        if let Some(view) = self.draw_list.camera {
            self.world_camera.camera.target = view.target;
            self.world_camera.camera.zoom = view.zoom;
        }

        let (vertex_count, index_count) = (self.batch.vertices.len(), self.batch.indices.len());
        self.ensure_mesh_capacity(vertex_count, index_count);
        if vertex_count > 0 {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.batch.vertices),
            );
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.batch.indices),
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn overlay_texts(&self) -> Vec<OverlayText> {
        self.draw_list
            .texts
            .iter()
            .map(|text| OverlayText {
                text: text.text.clone(),
                position: text.position.to_array(),
                size: text.size,
                color: text.color,
            })
            .collect()
    }

    fn overlay_stats(&self, game: &Game) -> OverlayStats {
        let world = game.world();
        let player = &world.player;
        OverlayStats {
            mode_label: game.mode_label().to_string(),
            player_position: player.body.position.to_array(),
            player_velocity: player.body.velocity.to_array(),
            health: player.health,
            points: player.points,
            grounded: player.grounded,
            active_enemies: world.enemies.active_count(),
            active_projectiles: world.projectiles.active_count(),
            active_coins: world.coins.active_count(),
            projectile_drops: world.projectiles.dropped(),
            draw_calls: self.batch.draw_calls.len() as u32,
            sprite_count: self.batch.quad_count() as u32,
        }
    }

    /// Physical cursor position to the game's logical screen pixels.
    fn to_logical(&self, x: f64, y: f64) -> glam::Vec2 {
        let (w, h) = self.gpu.size;
        glam::Vec2::new(
            x as f32 * LOGICAL_SIZE.0 as f32 / w.max(1) as f32,
            y as f32 * LOGICAL_SIZE.1 as f32 / h.max(1) as f32,
        )
    }
}

struct App {
    config: PlatformConfig,
    game_config: GameConfig,
    game: Game,
    state: Option<EngineState>,
}

impl App {
    fn new(game: Game, game_config: GameConfig) -> Self {
        Self {
            config: PlatformConfig::new("INF-MAN", LOGICAL_SIZE),
            game_config,
            game,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let engine = infman_platform::window::create_window(event_loop, &self.config)
            .map_err(|e| format!("Failed to create window: {e}"))
            .and_then(|window| EngineState::new(window, &self.game_config));
        match engine {
            Ok(engine) => self.state = Some(engine),
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.music.stop();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if state.gpu.resize(w, h) {
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
                if event.state == ElementState::Pressed {
                    if let Some(text) = &event.text {
                        for ch in text.chars() {
                            state.input.push_char(ch);
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = state.to_logical(position.x, position.y);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } if !egui_consumed => {
                if let Some(btn) = map_mouse_button(button) {
                    match button_state {
                        ElementState::Pressed => state.input.mouse_down(btn),
                        ElementState::Released => state.input.mouse_up(btn),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                state.music.update(state.time.real_dt as f32);
                let dt = state.time.fixed_dt_f32();
                let time = &mut state.time;
                if self
                    .game
                    .run_frame(&mut state.input, dt, || time.should_step())
                {
                    state.debug_overlay.toggle();
                }

                if self.game.is_exiting() {
                    log::info!("Exit selected, shutting down.");
                    state.music.stop();
                    event_loop.exit();
                    return;
                }

                self.game
                    .draw(state.input.mouse_position, &mut state.draw_list);
                state.rebuild_mesh();
                state.world_camera.upload(&state.gpu.queue);
                state.screen_camera.upload(&state.gpu.queue);

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let texts = state.overlay_texts();
                let stats = state
                    .debug_overlay
                    .visible
                    .then(|| state.overlay_stats(&self.game));
                let (egui_primitives, egui_textures_delta) = state.debug_overlay.prepare(
                    &state.window,
                    &state.time,
                    &texts,
                    stats.as_ref(),
                );
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let [r, g, b, a] = srgb_to_linear(state.draw_list.clear_color);
                    let clear_color = wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    };
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    let (world_calls, screen_calls) =
                        state.batch.draw_calls.split_at(state.world_call_count);
                    let mut last_bound_texture: Option<usize> = None;
                    for (camera, calls) in [
                        (&state.world_camera, world_calls),
                        (&state.screen_camera, screen_calls),
                    ] {
                        if calls.is_empty() {
                            continue;
                        }
                        render_pass.set_bind_group(0, &camera.bind_group, &[]);
                        for draw in calls {
                            if last_bound_texture != Some(draw.texture) {
                                render_pass.set_bind_group(
                                    1,
                                    &state.textures[draw.texture].bind_group,
                                    &[],
                                );
                                last_bound_texture = Some(draw.texture);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();
            }

            _ => {}
        }
    }
}

fn load_sheet_texture(gpu: &GpuContext, pipeline: &SpritePipeline, sheet: Sheet) -> SheetTexture {
    let path = Path::new(TEXTURE_DIR).join(sheet.file_name());
    let loaded = std::fs::read(&path)
        .map_err(|e| format!("Failed to read texture {}: {e}", path.display()))
        .and_then(|bytes| {
            Texture::from_bytes(&gpu.device, &gpu.queue, &bytes, sheet.file_name())
        });
    let (texture, fallback_tint) = match loaded {
        Ok(texture) => (texture, None),
        Err(err) => {
            log::warn!("{err}. Drawing {:?} as a flat colour.", sheet);
            (
                Texture::white(&gpu.device, &gpu.queue, sheet.file_name()),
                Some(srgb_to_linear(sheet.fallback_tint())),
            )
        }
    };
    SheetTexture {
        bind_group: pipeline.create_texture_bind_group(&gpu.device, &texture),
        texture,
        fallback_tint,
    }
}

fn push_command(batch: &mut QuadBatch, textures: &[SheetTexture], command: &DrawCommand) {
    match *command {
        DrawCommand::Sprite {
            sheet,
            frame,
            flip_x,
            dst,
            tint,
        } => {
            let slot = sheet.index();
            let mut color = srgb_to_linear(tint);
            if let Some(fallback) = textures.get(slot).and_then(|t| t.fallback_tint) {
                for (c, f) in color.iter_mut().zip(fallback) {
                    *c *= f;
                }
            }
            let uv = UvRect::strip_frame(frame, sheet.frame_count(), flip_x);
            batch.push(slot, dst, uv, color);
        }
        DrawCommand::Rect { dst, color } => {
            batch.push(WHITE_TEXTURE, dst, UvRect::FULL, srgb_to_linear(color));
        }
    }
}

/// 8-bit sRGB colour to linear floats; alpha stays linear.
fn srgb_to_linear(color: Color) -> [f32; 4] {
    let channel = |c: u8| {
        let c = c as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        color[3] as f32 / 255.0,
    ]
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Space => Some(Key::Space),
        KeyCode::KeyZ => Some(Key::Z),
        KeyCode::KeyX => Some(Key::X),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

fn load_game(config: GameConfig) -> Result<Game, MapError> {
    let map = TileMap::load(Path::new(MAP_PATH), BLOCK_SIZE)?;
    log::info!(
        "Map loaded: {} rows x {} cols from {MAP_PATH}",
        map.rows(),
        map.cols()
    );
    let world = World::new(map, config)?;
    Ok(Game::new(world, PathBuf::from(LEADERBOARD_PATH)))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("INF-MAN starting...");

    let game_config = config::load_config_or_default(Path::new(CONFIG_PATH));
    let game = match load_game(game_config.clone()) {
        Ok(game) => game,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(game, game_config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
