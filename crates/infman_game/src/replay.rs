use infman_core::input::{InputState, Key, MouseBtn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReplayFrame {
    /// Keys down for the whole span of this frame.
    #[serde(default)]
    pub held: Vec<String>,
    /// Keys tapped on every repeat of this frame.
    #[serde(default)]
    pub pressed: Vec<String>,
    #[serde(default)]
    pub typed: String,
    /// Left click at this logical screen position.
    #[serde(default)]
    pub click: Option<[f32; 2]>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

const KEY_NAMES: &[(Key, &str)] = &[
    (Key::Left, "left"),
    (Key::Right, "right"),
    (Key::Space, "space"),
    (Key::Z, "z"),
    (Key::X, "x"),
    (Key::Enter, "enter"),
    (Key::Backspace, "backspace"),
    (Key::Escape, "escape"),
];

fn key_from_name(name: &str) -> Option<Key> {
    KEY_NAMES
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
        .map(|&(key, _)| key)
}

impl ReplaySequence {
    /// One input snapshot per fixed step, as the shell would hand them to
    /// `Game::update`.
    pub fn expanded_inputs(&self) -> Vec<InputState> {
        let mut out = Vec::new();
        let mut input = InputState::new();
        for frame in &self.frames {
            let held: Vec<Key> = frame.held.iter().filter_map(|n| key_from_name(n)).collect();
            let pressed: Vec<Key> = frame
                .pressed
                .iter()
                .filter_map(|n| key_from_name(n))
                .collect();
            for _ in 0..frame.repeat.max(1) {
                input.end_frame();
                input.mouse_up(MouseBtn::Left);
                for &(key, _) in KEY_NAMES {
                    if held.contains(&key) {
                        input.key_down(key);
                    } else {
                        input.key_up(key);
                    }
                }
                for &key in &pressed {
                    input.key_up(key);
                    input.key_down(key);
                }
                for ch in frame.typed.chars() {
                    input.push_char(ch);
                }
                if let Some([x, y]) = frame.click {
                    input.mouse_position = glam::Vec2::new(x, y);
                    input.mouse_down(MouseBtn::Left);
                }
                out.push(input.clone());
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for (i, frame) in replay.frames.iter().enumerate() {
        if let Some(name) = frame
            .held
            .iter()
            .chain(&frame.pressed)
            .find(|name| key_from_name(name).is_none())
        {
            return Err(format!(
                "Replay validation failed: frame {i} names unknown key '{name}'"
            ));
        }
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::leaderboard::Leaderboard;
    use crate::scene::tests::temp_file_path;
    use crate::scene::{Game, Mode, PlayPhase};
    use crate::tilemap::tests::map_text;
    use crate::tilemap::TileMap;
    use crate::world::tests::sample_world;
    use crate::world::World;

    const CLICK_START: &str = r#"{ "click": [600.0, 325.0] }"#;

    fn write_replay(name_hint: &str, body: &str) -> std::path::PathBuf {
        let path = temp_file_path(name_hint).with_extension("json");
        fs::write(&path, body).expect("write replay file");
        path
    }

    fn play(game: &mut Game, replay: &ReplaySequence) {
        for input in replay.expanded_inputs() {
            game.update(&input, replay.fixed_dt);
        }
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = write_replay(
            "parse",
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "held": ["right"], "repeat": 3 },
                { "held": ["right"], "pressed": ["space"] },
                { "typed": "ok", "click": [10.0, 20.0] }
              ]
            }"#,
        );

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(expanded[0].is_just_pressed(Key::Right));
        assert!(expanded[1].is_held(Key::Right));
        assert!(!expanded[1].is_just_pressed(Key::Right));
        assert!(expanded[3].is_just_pressed(Key::Space));
        assert!(!expanded[4].is_held(Key::Right));
        assert_eq!(expanded[4].typed_chars(), &['o', 'k']);
        assert!(expanded[4].is_mouse_just_pressed(MouseBtn::Left));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        let path = write_replay("unknown", r#"{ "frames": [ { "held": ["jetpack"] } ] }"#);
        let err = load_replay_from_path(&path).expect_err("unknown key");
        assert!(err.contains("jetpack"), "{err}");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn start_then_walk_collects_coin() {
        let path = write_replay(
            "coin",
            &format!(r#"{{ "frames": [ {CLICK_START}, {{ "held": ["right"], "repeat": 60 }} ] }}"#),
        );
        let replay = load_replay_from_path(&path).expect("replay should load");
        let mut game = Game::new(sample_world(), temp_file_path("coin_board"));

        play(&mut game, &replay);
        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
        assert_eq!(game.world().player.points, 10);
        assert_eq!(game.world().coins.active_count(), 0);
        assert!(game.world().player.grounded);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = write_replay(
            "deterministic",
            &format!(
                r#"{{
                  "fixed_dt": 0.016666667,
                  "frames": [
                    {CLICK_START},
                    {{ "held": ["right"], "repeat": 30 }},
                    {{ "held": ["right"], "pressed": ["space", "z"] }},
                    {{ "held": ["right"], "repeat": 90 }},
                    {{ "held": ["left"], "pressed": ["x"], "repeat": 3 }},
                    {{ "held": ["left"], "repeat": 45 }}
                  ]
                }}"#
            ),
        );
        let replay = load_replay_from_path(&path).expect("replay should load");
        let mut run_a = Game::new(sample_world(), temp_file_path("det_a"));
        let mut run_b = Game::new(sample_world(), temp_file_path("det_b"));
        play(&mut run_a, &replay);
        play(&mut run_b, &replay);

        let (a, b) = (&run_a.world().player, &run_b.world().player);
        assert!((a.body.position - b.body.position).length() < 0.0001);
        assert!((a.body.velocity - b.body.velocity).length() < 0.0001);
        assert_eq!(a.health, b.health);
        assert_eq!(a.points, b.points);
        assert_eq!(a.grounded, b.grounded);
        assert_eq!(
            run_a.world().projectiles.active_count(),
            run_b.world().projectiles.active_count()
        );
        assert_eq!(run_a.mode(), run_b.mode());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn reaching_goal_records_typed_name() {
        // Floor on row 10, spawn at column 2, gate four cells to the right.
        let mut cells: Vec<(usize, usize, u8)> = (0..201).map(|col| (10, col, b'B')).collect();
        cells.push((8, 2, b'P'));
        cells.push((9, 6, b'G'));
        let map = TileMap::parse(&map_text(11, 201, &cells), 16.0).expect("valid map");
        let world = World::new(map, GameConfig::default()).expect("map has a spawn");
        let board_path = temp_file_path("goal_board");
        let mut game = Game::new(world, board_path.clone());

        let path = write_replay(
            "goal",
            &format!(
                r#"{{ "frames": [
                    {CLICK_START},
                    {{ "held": ["right"], "repeat": 40 }},
                    {{ "typed": "Ruy" }},
                    {{ "pressed": ["backspace"] }},
                    {{ "typed": "i" }},
                    {{ "pressed": ["enter"] }}
                ] }}"#
            ),
        );
        let replay = load_replay_from_path(&path).expect("replay should load");
        play(&mut game, &replay);

        assert_eq!(game.mode(), &Mode::Playing(PlayPhase::Alive));
        assert_eq!(game.world().player.name, "Rui");
        assert!(!game.world().player.finished);

        let board = Leaderboard::load(&board_path).expect("leaderboard written");
        let last = &board.entries()[4];
        assert_eq!(last.name(), "Rui");
        assert_eq!(last.points, 0);

        let _ = fs::remove_file(path);
        let _ = fs::remove_file(board_path);
    }
}
