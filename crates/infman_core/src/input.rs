//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Used for walking left and right.
//!
//! - **Edge-triggered (just_pressed):** true only during the frame the press
//!   happened. Jumping, both fire actions, menu clicks and
//!   every confirmation prompt read these. They are cleared by `end_frame()`,
//!   which the main loop calls only after at least one fixed simulation step has
//!   consumed them, so a press landing on a frame with zero steps is not lost.
//!
//! Typed characters (for name entry) follow the same edge rule: they queue up
//! until a step has seen them.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Space,
    Z,
    X,
    Enter,
    Backspace,
    Escape,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,

    typed: Vec<char>,

    /// Pointer position in logical screen pixels (game resolution, not
    /// physical window pixels).
    pub mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        self.mouse_held.remove(&btn);
    }

    /// Queue a printable character. Control characters are ignored; editing
    /// keys arrive through `key_down`.
    pub fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.typed.push(ch);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    /// Characters typed since the last `end_frame()`, in arrival order.
    pub fn typed_chars(&self) -> &[char] {
        &self.typed
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.mouse_just_pressed.clear();
        self.typed.clear();
    }
}
