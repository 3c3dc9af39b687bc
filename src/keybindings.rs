//! Keyboard shortcuts for the annotation page.
//!
//! Only page-level actions live here; drawing tools keep the whiteboard's
//! own shortcuts. A chord is written as `Ctrl+S`, `Ctrl+Shift+P`, ... in
//! configuration files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actions that can be bound to a key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Persist the current drawing
    Save,
}

/// A key press as reported by the host page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// The `key` value of the keyboard event (`"s"`, `"Enter"`, ...)
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    /// A key press without modifiers.
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    /// A key press with Ctrl held.
    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Self::default()
        }
    }
}

/// A key plus the modifiers that must be held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyChord {
    /// Key name, compared case-insensitively
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyChord {
    /// Check if a key press triggers this chord. Modifiers must match exactly.
    pub fn matches(&self, press: &KeyPress) -> bool {
        press.key.eq_ignore_ascii_case(&self.key)
            && press.ctrl == self.ctrl
            && press.shift == self.shift
            && press.alt == self.alt
            && press.meta == self.meta
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = [
            (self.ctrl, "Ctrl"),
            (self.shift, "Shift"),
            (self.alt, "Alt"),
            (self.meta, "Meta"),
        ];
        for (held, name) in modifiers {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_uppercase())
        } else {
            write!(f, "{}", self.key)
        }
    }
}

impl FromStr for KeyChord {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut chord = KeyChord {
            key: String::new(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        };

        let parts: Vec<&str> = text.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err("empty key chord".to_string());
        };
        if key.is_empty() {
            return Err(format!("key chord '{}' has no key", text));
        }

        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "super" => chord.meta = true,
                other => return Err(format!("unknown modifier '{}' in '{}'", other, text)),
            }
        }
        chord.key = key.to_ascii_lowercase();
        Ok(chord)
    }
}

impl TryFrom<String> for KeyChord {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyChord> for String {
    fn from(chord: KeyChord) -> Self {
        chord.to_string()
    }
}

/// Keybinding configuration for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Chord that saves the drawing
    #[serde(default = "default_save_chord")]
    pub save: KeyChord,
}

fn default_save_chord() -> KeyChord {
    KeyChord {
        key: "s".to_string(),
        ctrl: true,
        shift: false,
        alt: false,
        meta: false,
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            save: default_save_chord(),
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action bound to a key press, if any.
    ///
    /// A bound press must have its platform default behavior suppressed
    /// by the caller.
    pub fn action_for(&self, press: &KeyPress) -> Option<KeyAction> {
        if self.save.matches(press) {
            Some(KeyAction::Save)
        } else {
            None
        }
    }
}
