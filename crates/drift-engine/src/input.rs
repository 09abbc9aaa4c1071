//! Input snapshots.
//!
//! The platform layer (or a test script) produces an [`InputSnapshot`] per
//! frame. [`InputState`] keeps the current and previous snapshot so
//! components can ask for edges as well as levels.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    Escape,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// Keys and buttons held down, plus the pointer in screen pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub keys: BTreeSet<Key>,
    pub buttons: BTreeSet<MouseButton>,
    pub pointer: Vec2,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.insert(key);
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.buttons.insert(button);
        self
    }

    pub fn at_pointer(mut self, pointer: Vec2) -> Self {
        self.pointer = pointer;
        self
    }
}

/// Current and previous input snapshot.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: InputSnapshot,
    previous: InputSnapshot,
}

impl InputState {
    /// Make `next` current, remembering the old current for edge queries.
    pub fn refresh(&mut self, next: &InputSnapshot) {
        self.previous = std::mem::replace(&mut self.current, next.clone());
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.current.keys.contains(&key)
    }

    pub fn key_just_pressed(&self, key: Key) -> bool {
        self.is_key_down(key) && !self.previous.keys.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.current.buttons.contains(&button)
    }

    pub fn button_just_pressed(&self, button: MouseButton) -> bool {
        self.is_button_down(button) && !self.previous.buttons.contains(&button)
    }

    /// Pointer position in screen pixels.
    pub fn pointer(&self) -> Vec2 {
        self.current.pointer
    }

    pub fn snapshot(&self) -> &InputSnapshot {
        &self.current
    }
}
