//! Key actions and the sinks that deliver them
//!
//! Gestures map to [`Key`]s in the pipeline config; this module parses
//! those config names and provides the two [`ActionSink`] backends: the
//! always-available [`LogSink`] and, behind the `inject` feature, the
//! real [`EnigoSink`].

use std::fmt;

use crate::{ActionSink, SinkError};

/// A key a gesture can press.
///
/// Covers the keys game bindings actually use. Any single character maps
/// through [`Key::Char`]; the named variants exist for keys that have no
/// character of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character key.
    Char(char),
    /// The space bar.
    Space,
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Shift modifier.
    Shift,
    /// Control modifier.
    Ctrl,
}

impl Key {
    /// Parse a config-file key name.
    ///
    /// Named keys are matched exactly in lowercase; anything that is a
    /// single character parses as [`Key::Char`].
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "space" => Key::Space,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Ctrl,
            other => {
                let mut chars = other.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Key::Char(c)
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Space => f.write_str("space"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Escape => f.write_str("escape"),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Shift => f.write_str("shift"),
            Key::Ctrl => f.write_str("ctrl"),
        }
    }
}

/// Sink that logs actions instead of delivering them.
///
/// Used for dry runs and as the fallback when no injection backend is
/// compiled in. Never fails.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl ActionSink for LogSink {
    fn press(&mut self, key: Key) -> Result<(), SinkError> {
        log::info!("press {key}");
        Ok(())
    }

    fn release(&mut self, key: Key) -> Result<(), SinkError> {
        log::info!("release {key}");
        Ok(())
    }

    fn tap(&mut self, key: Key) -> Result<(), SinkError> {
        log::info!("tap {key}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Sink that injects real key events through `enigo`.
#[cfg(feature = "inject")]
pub struct EnigoSink {
    enigo: enigo::Enigo,
}

#[cfg(feature = "inject")]
impl EnigoSink {
    /// Connect to the OS input subsystem.
    ///
    /// Fails on headless boxes with no display or uinput access; callers
    /// usually fall back to [`LogSink`] and say so in the log.
    pub fn new() -> Result<Self, SinkError> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| SinkError::Injection(e.to_string()))?;
        Ok(Self { enigo })
    }

    fn backend_key(key: Key) -> enigo::Key {
        match key {
            Key::Char(c) => enigo::Key::Unicode(c),
            Key::Space => enigo::Key::Space,
            Key::Enter => enigo::Key::Return,
            Key::Tab => enigo::Key::Tab,
            Key::Escape => enigo::Key::Escape,
            Key::Up => enigo::Key::UpArrow,
            Key::Down => enigo::Key::DownArrow,
            Key::Left => enigo::Key::LeftArrow,
            Key::Right => enigo::Key::RightArrow,
            Key::Shift => enigo::Key::Shift,
            Key::Ctrl => enigo::Key::Control,
        }
    }

    fn drive(&mut self, key: Key, direction: enigo::Direction) -> Result<(), SinkError> {
        use enigo::Keyboard;

        self.enigo
            .key(Self::backend_key(key), direction)
            .map_err(|e| SinkError::Injection(e.to_string()))
    }
}

#[cfg(feature = "inject")]
impl ActionSink for EnigoSink {
    fn press(&mut self, key: Key) -> Result<(), SinkError> {
        self.drive(key, enigo::Direction::Press)
    }

    fn release(&mut self, key: Key) -> Result<(), SinkError> {
        self.drive(key, enigo::Direction::Release)
    }

    fn tap(&mut self, key: Key) -> Result<(), SinkError> {
        self.drive(key, enigo::Direction::Click)
    }

    fn name(&self) -> &'static str {
        "enigo"
    }
}
