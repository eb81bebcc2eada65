//! Top-level mode machine: menu, play, leaderboard view and exit.
//!
//! Every mode is polled once per fixed step through `Game::update`; none of
//! them blocks. The pass and fail screens are phases of `Playing` so the run
//! can restart without leaving the mode.

use std::path::PathBuf;

use glam::Vec2;
use infman_core::geometry::Rect;
use infman_core::input::{InputState, Key, MouseBtn};

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::draw::{
    self, measure_text, DrawList, Sheet, BLACK, DARKBLUE, GREEN, LIGHTGRAY, RAYWHITE, RED, WHITE,
    YELLOW,
};
use crate::entities::MAX_NAME_BYTES;
use crate::leaderboard::Leaderboard;
use crate::physics::PlayerIntent;
use crate::rules::FrameEvents;
use crate::world::World;

const BUTTON_TEXT_SIZE: f32 = 50.0;
const BUTTON_LABEL_SIZE: f32 = 20.0;
const BUTTON_HEIGHT: f32 = 50.0;

const WIN_TITLE: &str = "CONGRATULATIONS! YOU WON";
const FAIL_TITLE: &str = "YOU FAILED!";
const TITLE_SIZE: f32 = 60.0;
const SUBTITLE_SIZE: f32 = 40.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayPhase {
    Alive,
    /// Goal reached; collecting the name for the leaderboard.
    NameEntry(String),
    /// Health dropped below zero.
    Defeated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Menu,
    Playing(PlayPhase),
    Leaderboard(Leaderboard),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Start,
    Leaderboard,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuButton {
    pub label: &'static str,
    pub rect: Rect,
    pub choice: MenuChoice,
}

/// Button sized to `text` at 50 px, centred horizontally, `y_offset` below
/// the screen's vertical centre.
pub fn menu_button(text: &str, y_offset: f32) -> Rect {
    let width = measure_text(text, BUTTON_TEXT_SIZE);
    Rect::new(
        SCREEN_WIDTH / 2.0 - width / 2.0,
        SCREEN_HEIGHT / 2.0 + y_offset,
        width,
        BUTTON_HEIGHT,
    )
}

fn menu_buttons() -> [MenuButton; 3] {
    [
        ("Start", 0.0, MenuChoice::Start),
        ("Leaderboard", 100.0, MenuChoice::Leaderboard),
        ("Exit", 200.0, MenuChoice::Exit),
    ]
    .map(|(label, y_offset, choice)| MenuButton {
        label,
        rect: menu_button(label, y_offset),
        choice,
    })
}

pub struct Game {
    mode: Mode,
    world: World,
    leaderboard_path: PathBuf,
    buttons: [MenuButton; 3],
}

impl Game {
    pub fn new(world: World, leaderboard_path: PathBuf) -> Self {
        Self {
            mode: Mode::Menu,
            world,
            leaderboard_path,
            buttons: menu_buttons(),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn is_exiting(&self) -> bool {
        self.mode == Mode::Exit
    }

    pub fn mode_label(&self) -> &'static str {
        match &self.mode {
            Mode::Menu => "Menu",
            Mode::Playing(PlayPhase::Alive) => "Playing",
            Mode::Playing(PlayPhase::NameEntry(_)) => "Name entry",
            Mode::Playing(PlayPhase::Defeated) => "Defeated",
            Mode::Leaderboard(_) => "Leaderboard",
            Mode::Exit => "Exit",
        }
    }

    /// Run the fixed steps due this render frame. Presses, clicks and typed
    /// characters belong to the first step only; held keys carry on. Stops
    /// early when the mode changes. Returns true if F3 was pressed.
    pub fn run_frame(
        &mut self,
        input: &mut InputState,
        dt: f32,
        mut should_step: impl FnMut() -> bool,
    ) -> bool {
        let mut toggle_overlay = false;
        while should_step() {
            toggle_overlay |= input.is_just_pressed(Key::F3);
            let changed = self.update(input, dt);
            input.end_frame();
            if changed {
                break;
            }
        }
        toggle_overlay
    }

    /// Advance the active mode by one fixed step. Returns true when the mode
    /// (or play phase) changed, so the caller can stop feeding this frame's
    /// input edges into the new mode.
    pub fn update(&mut self, input: &InputState, dt: f32) -> bool {
        if self.mode == Mode::Exit {
            return false;
        }
        if input.is_just_pressed(Key::Escape) {
            return self.switch(Mode::Exit);
        }

        let next = match &mut self.mode {
            Mode::Menu => self.poll_menu(input),
            Mode::Playing(PlayPhase::Alive) => {
                let intent = PlayerIntent::from_input(input);
                let events = self.world.step(intent, dt);
                log_events(&events);
                let player = &self.world.player;
                // A run that reaches the gate is recorded even if the same
                // step also cost the last heart.
                if player.finished {
                    Some(Mode::Playing(PlayPhase::NameEntry(String::new())))
                } else if player.is_dead() {
                    log::info!("Run lost with {} points", player.points);
                    Some(Mode::Playing(PlayPhase::Defeated))
                } else {
                    None
                }
            }
            Mode::Playing(PlayPhase::NameEntry(name)) => {
                edit_name(name, input);
                if input.is_just_pressed(Key::Enter) {
                    let name = std::mem::take(name);
                    Leaderboard::record(&self.leaderboard_path, &name, self.world.player.points);
                    self.world.player.name = name;
                    self.world.reset_run();
                    Some(Mode::Playing(PlayPhase::Alive))
                } else {
                    None
                }
            }
            Mode::Playing(PlayPhase::Defeated) => {
                if input.is_just_pressed(Key::Enter) {
                    self.world.reset_run();
                    Some(Mode::Playing(PlayPhase::Alive))
                } else {
                    None
                }
            }
            Mode::Leaderboard(_) => input.is_just_pressed(Key::Enter).then_some(Mode::Menu),
            Mode::Exit => None,
        };

        match next {
            Some(mode) => self.switch(mode),
            None => false,
        }
    }

    fn poll_menu(&self, input: &InputState) -> Option<Mode> {
        if !input.is_mouse_just_pressed(MouseBtn::Left) {
            return None;
        }
        let clicked = self
            .buttons
            .iter()
            .find(|button| button.rect.contains_point(input.mouse_position))?;
        Some(match clicked.choice {
            MenuChoice::Start => Mode::Playing(PlayPhase::Alive),
            MenuChoice::Leaderboard => {
                Mode::Leaderboard(Leaderboard::load_or_seed(&self.leaderboard_path))
            }
            MenuChoice::Exit => Mode::Exit,
        })
    }

    fn switch(&mut self, mode: Mode) -> bool {
        let from = self.mode_label();
        self.mode = mode;
        log::info!("Mode: {from} -> {}", self.mode_label());
        true
    }

    /// Describe the current mode. `pointer` drives the menu hover highlight.
    pub fn draw(&self, pointer: Vec2, list: &mut DrawList) {
        list.clear();
        match &self.mode {
            Mode::Menu => self.draw_menu(pointer, list),
            Mode::Playing(PlayPhase::Alive) => {
                draw::draw_world(&self.world, list);
                draw::draw_hud(&self.world.player, list);
            }
            Mode::Playing(PlayPhase::NameEntry(name)) => draw_pass_screen(name, list),
            Mode::Playing(PlayPhase::Defeated) => draw_fail_screen(list),
            Mode::Leaderboard(board) => draw_leaderboard(board, list),
            Mode::Exit => list.fill_screen(BLACK),
        }
    }

    fn draw_menu(&self, pointer: Vec2, list: &mut DrawList) {
        list.fill_screen(DARKBLUE);
        list.screen_sprite(
            Sheet::Title,
            Rect::new(
                SCREEN_WIDTH / 2.0 - draw::TITLE_SIZE.x / 2.0,
                SCREEN_HEIGHT / 4.0,
                draw::TITLE_SIZE.x,
                draw::TITLE_SIZE.y,
            ),
        );
        for button in &self.buttons {
            let rect = button.rect;
            let color = if rect.contains_point(pointer) {
                YELLOW
            } else {
                LIGHTGRAY
            };
            list.screen_rect(rect, color);
            let label_width = measure_text(button.label, BUTTON_LABEL_SIZE);
            list.text(
                button.label,
                Vec2::new(rect.x + rect.w / 2.0 - label_width / 2.0, rect.y + 15.0),
                BUTTON_LABEL_SIZE,
                BLACK,
            );
        }
    }
}

fn log_events(events: &FrameEvents) {
    if events.player_hit() {
        log::debug!(
            "Player hit: fell={} hazards={} enemies={}",
            events.fell,
            events.hazard_hits,
            events.enemy_hits
        );
    }
    if events.enemies_damaged > 0 || events.coins_collected > 0 {
        log::debug!(
            "Enemies damaged {} (destroyed {}), coins {}",
            events.enemies_damaged,
            events.enemies_killed,
            events.coins_collected
        );
    }
    if events.shots_dropped > 0 {
        log::debug!(
            "Projectile pool full: {} of {} shots dropped",
            events.shots_dropped,
            events.shots_dropped + events.shots_fired
        );
    }
}

/// Apply this step's typed characters and Backspace to `name`, keeping it
/// within the stored record size.
fn edit_name(name: &mut String, input: &InputState) {
    for &ch in input.typed_chars() {
        if name.len() + ch.len_utf8() <= MAX_NAME_BYTES {
            name.push(ch);
        }
    }
    if input.is_just_pressed(Key::Backspace) {
        name.pop();
    }
}

/// Both end screens left-align their lines with the centred win title.
fn end_screen_column() -> f32 {
    (SCREEN_WIDTH - measure_text(WIN_TITLE, TITLE_SIZE)) / 2.0
}

fn draw_pass_screen(name: &str, list: &mut DrawList) {
    list.fill_screen(BLACK);
    let x = end_screen_column();
    list.text(
        WIN_TITLE,
        Vec2::new(x, (SCREEN_HEIGHT - 30.0) / 2.0),
        TITLE_SIZE,
        GREEN,
    );
    list.text(
        "Type your name, then press enter",
        Vec2::new(x, (SCREEN_HEIGHT + 60.0) / 2.0),
        SUBTITLE_SIZE,
        WHITE,
    );
    list.text(format!("Name: {name}"), Vec2::new(45.0, 45.0), SUBTITLE_SIZE, RAYWHITE);
}

fn draw_fail_screen(list: &mut DrawList) {
    list.fill_screen(RED);
    let x = end_screen_column();
    list.text(
        FAIL_TITLE,
        Vec2::new(x, (SCREEN_HEIGHT - 30.0) / 2.0),
        TITLE_SIZE,
        WHITE,
    );
    list.text(
        "Press enter to play again",
        Vec2::new(x, (SCREEN_HEIGHT + 60.0) / 2.0),
        SUBTITLE_SIZE,
        WHITE,
    );
}

fn draw_leaderboard(board: &Leaderboard, list: &mut DrawList) {
    list.fill_screen(BLACK);
    let title = "Leaderboard";
    list.text(
        title,
        Vec2::new(SCREEN_WIDTH / 2.0 - measure_text(title, 50.0) / 2.0, 20.0),
        50.0,
        WHITE,
    );
    for (i, entry) in board.entries().iter().enumerate() {
        let y = 100.0 + 40.0 * i as f32;
        list.text(format!("Name: {}", entry.name()), Vec2::new(15.0, y), 30.0, WHITE);
        list.text(
            format!("Score: {}", entry.points),
            Vec2::new(400.0, y),
            30.0,
            WHITE,
        );
    }
    let exit_box = Rect::new(SCREEN_WIDTH - 150.0, 20.0, 130.0, 90.0);
    list.screen_rect(exit_box, RED);
    list.text(
        "Press\nenter\nto exit",
        Vec2::new(exit_box.x + 20.0, exit_box.y + 10.0),
        20.0,
        WHITE,
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use crate::world::tests::{sample_world, DT};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "infman_scene_test_{}_{}_{}.bin",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn click_at(x: f32, y: f32) -> InputState {
        let mut input = InputState::new();
        input.mouse_position = Vec2::new(x, y);
        input.mouse_down(MouseBtn::Left);
        input
    }

    fn press(key: Key) -> InputState {
        let mut input = InputState::new();
        input.key_down(key);
        input
    }

    fn typed(text: &str) -> InputState {
        let mut input = InputState::new();
        for ch in text.chars() {
            input.push_char(ch);
        }
        input
    }

    fn new_game(name_hint: &str) -> (Game, PathBuf) {
        let path = temp_file_path(name_hint);
        (Game::new(sample_world(), path.clone()), path)
    }

    #[test]
    fn buttons_are_centred_and_stacked() {
        let buttons = menu_buttons();
        assert_eq!(buttons[0].rect, Rect::new(525.0, 300.0, 150.0, 50.0));
        assert_eq!(buttons[1].rect, Rect::new(435.0, 400.0, 330.0, 50.0));
        assert_eq!(buttons[2].rect, Rect::new(540.0, 500.0, 120.0, 50.0));
    }

    #[test]
    fn start_button_begins_play() {
        let (mut game, _) = new_game("start");
        assert!(!game.update(&click_at(10.0, 10.0), DT), "click outside buttons");
        assert_eq!(game.mode(), &Mode::Menu);

        assert!(game.update(&click_at(600.0, 325.0), DT));
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
    }

    #[test]
    fn button_far_edges_are_outside() {
        let (mut game, _) = new_game("edges");
        game.update(&click_at(675.0, 325.0), DT);
        game.update(&click_at(600.0, 350.0), DT);
        assert_eq!(game.mode(), &Mode::Menu);

        game.update(&click_at(525.0, 300.0), DT);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
    }

    #[test]
    fn hovering_without_click_does_nothing() {
        let (mut game, _) = new_game("hover");
        let mut input = InputState::new();
        input.mouse_position = Vec2::new(600.0, 325.0);
        game.update(&input, DT);
        assert_eq!(game.mode(), &Mode::Menu);
    }

    #[test]
    fn leaderboard_view_loads_seed_and_returns_on_enter() {
        let (mut game, path) = new_game("view");
        game.update(&click_at(600.0, 425.0), DT);
        assert_eq!(game.mode(), &Mode::Leaderboard(Leaderboard::seed()));
        assert!(path.exists(), "viewing creates the seed file");

        game.update(&InputState::new(), DT);
        assert!(matches!(game.mode(), Mode::Leaderboard(_)));
        game.update(&press(Key::Enter), DT);
        assert_eq!(game.mode(), &Mode::Menu);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn exit_button_and_escape_exit() {
        let (mut game, _) = new_game("exit");
        game.update(&click_at(600.0, 525.0), DT);
        assert!(game.is_exiting());
        assert!(!game.update(&press(Key::Escape), DT));

        let (mut game, _) = new_game("escape");
        game.update(&click_at(600.0, 325.0), DT);
        game.update(&press(Key::Escape), DT);
        assert!(game.is_exiting());
    }

    #[test]
    fn death_shows_fail_screen_then_restarts() {
        let (mut game, _) = new_game("death");
        game.mode = Mode::Playing(PlayPhase::Alive);
        game.world.player.health = -1;
        game.world.player.points = 40;

        assert!(game.update(&InputState::new(), DT));
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Defeated));
        assert_eq!(game.mode_label(), "Defeated");

        game.update(&InputState::new(), DT);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Defeated));

        game.update(&press(Key::Enter), DT);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
        assert_eq!(game.world().player.health, 3);
        assert_eq!(game.world().player.points, 0);
        assert_eq!(game.world().player.body.position, game.world().player.spawn);
    }

    #[test]
    fn finishing_records_name_and_score() {
        let (mut game, path) = new_game("finish");
        game.mode = Mode::Playing(PlayPhase::Alive);
        game.world.player.finished = true;
        game.world.player.points = 130;

        game.update(&InputState::new(), DT);
        assert_eq!(
            game.mode(),
            &Mode::Playing(PlayPhase::NameEntry(String::new()))
        );

        game.update(&typed("Anx"), DT);
        game.update(&press(Key::Backspace), DT);
        game.update(&typed("a"), DT);
        assert_eq!(
            game.mode(),
            &Mode::Playing(PlayPhase::NameEntry("Ana".to_string()))
        );

        game.update(&press(Key::Enter), DT);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
        assert_eq!(game.world().player.name, "Ana");
        assert_eq!(game.world().player.points, 0);
        assert!(!game.world().player.finished);

        let board = Leaderboard::load(&path).expect("leaderboard written");
        assert_eq!(board.entries()[1], LeaderboardEntry::new("Ana", 130));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn name_entry_stops_at_record_size() {
        let (mut game, _) = new_game("bounded");
        game.mode = Mode::Playing(PlayPhase::NameEntry(String::new()));
        game.update(&typed("abcdefghijklmnopqrstuvwxyz"), DT);
        let Mode::Playing(PlayPhase::NameEntry(name)) = game.mode() else {
            panic!("left name entry");
        };
        assert_eq!(name, "abcdefghijklmnopqrs");
    }

    #[test]
    fn backspace_on_empty_name_is_harmless() {
        let (mut game, _) = new_game("empty");
        game.mode = Mode::Playing(PlayPhase::NameEntry(String::new()));
        game.update(&press(Key::Backspace), DT);
        assert_eq!(
            game.mode(),
            &Mode::Playing(PlayPhase::NameEntry(String::new()))
        );
    }

    fn steps(count: u32) -> impl FnMut() -> bool {
        let mut remaining = count;
        move || {
            let due = remaining > 0;
            remaining = remaining.saturating_sub(1);
            due
        }
    }

    #[test]
    fn one_press_fires_once_across_steps() {
        let (mut game, _) = new_game("one_shot");
        game.mode = Mode::Playing(PlayPhase::Alive);
        let mut input = press(Key::Z);
        input.key_down(Key::Right);

        game.run_frame(&mut input, DT, steps(3));
        assert_eq!(game.world().projectiles.active_count(), 1);
        // Held keys keep steering every step of the frame.
        assert!(input.is_held(Key::Right));
        assert_eq!(game.world().player.body.velocity.x, 200.0);
    }

    #[test]
    fn typed_character_lands_once_across_steps() {
        let (mut game, _) = new_game("one_char");
        game.mode = Mode::Playing(PlayPhase::NameEntry(String::new()));
        let mut input = typed("A");

        game.run_frame(&mut input, DT, steps(3));
        assert_eq!(
            game.mode(),
            &Mode::Playing(PlayPhase::NameEntry("A".to_string()))
        );
    }

    #[test]
    fn mode_change_ends_the_frame() {
        let (mut game, _) = new_game("frame_break");
        let mut input = click_at(600.0, 325.0);
        input.key_down(Key::F3);
        let mut taken = 0;
        let toggled = game.run_frame(&mut input, DT, || {
            taken += 1;
            taken <= 3
        });
        assert!(toggled);
        assert_eq!(taken, 1);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
        assert!(!input.is_mouse_just_pressed(MouseBtn::Left));
    }

    #[test]
    fn zero_step_frame_keeps_presses() {
        let (mut game, _) = new_game("zero_steps");
        let mut input = click_at(600.0, 325.0);
        game.run_frame(&mut input, DT, steps(0));
        assert_eq!(game.mode(), &Mode::Menu);
        assert!(input.is_mouse_just_pressed(MouseBtn::Left));
    }

    #[test]
    fn goal_on_the_dying_step_is_still_recorded() {
        let (mut game, _) = new_game("goal_and_death");
        game.mode = Mode::Playing(PlayPhase::Alive);
        game.world.player.finished = true;
        game.world.player.health = -1;

        game.update(&InputState::new(), DT);
        assert_eq!(
            game.mode(),
            &Mode::Playing(PlayPhase::NameEntry(String::new()))
        );
    }

    #[test]
    fn menu_draw_highlights_hovered_button() {
        let (game, _) = new_game("draw");
        let mut list = DrawList::default();
        game.draw(Vec2::new(600.0, 325.0), &mut list);
        assert_eq!(list.clear_color, DARKBLUE);
        let colors: Vec<_> = list
            .screen
            .iter()
            .filter_map(|cmd| match cmd {
                draw::DrawCommand::Rect { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![DARKBLUE, YELLOW, LIGHTGRAY, LIGHTGRAY]);
        assert_eq!(list.texts.len(), 3);
        assert!(list.camera.is_none());
    }

    #[test]
    fn leaderboard_draw_lists_five_rows() {
        let (mut game, _) = new_game("rows");
        game.mode = Mode::Leaderboard(Leaderboard::seed());
        let mut list = DrawList::default();
        game.draw(Vec2::ZERO, &mut list);
        // Title, ten row cells, exit hint.
        assert_eq!(list.texts.len(), 12);
        assert_eq!(list.texts[1].text, "Name: Fernandao");
        assert_eq!(list.texts[2].text, "Score: 150");
    }
}
