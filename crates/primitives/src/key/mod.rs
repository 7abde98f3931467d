//! Key representation for host keystroke events and configured key chords.
//!
//! The host editor reports each keydown as a [`Key`]: the produced key code
//! plus the modifiers held. Configured bindings (undo, clear suggestions,
//! completion triggers) use the same type, parsed from strings such as
//! `"ctrl-z"` or `"shift-+"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod modifiers;
mod parse;

pub use modifiers::Modifiers;
pub use parse::KeyParseError;

/// Key identifier without modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
	/// A printable character.
	Char(char),
	Space,
	Enter,
	Tab,
	Backspace,
	Delete,
	Esc,
	Up,
	Down,
	Left,
	Right,
	Home,
	End,
}

/// A key with optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
	pub code: KeyCode,
	pub modifiers: Modifiers,
}

impl Key {
	/// Create a key from a character with no modifiers.
	///
	/// `' '` is normalized to [`KeyCode::Space`] so that typed and configured
	/// spaces compare equal.
	pub const fn char(c: char) -> Self {
		Self::new(if c == ' ' { KeyCode::Space } else { KeyCode::Char(c) })
	}

	/// Create a key from a key code with no modifiers.
	pub const fn new(code: KeyCode) -> Self {
		Self {
			code,
			modifiers: Modifiers::NONE,
		}
	}

	/// Create a key with Ctrl modifier.
	pub const fn ctrl(c: char) -> Self {
		Self::char(c).with_ctrl()
	}

	/// Create a key with Cmd modifier.
	pub const fn cmd(c: char) -> Self {
		Self::char(c).with_cmd()
	}

	/// Add Ctrl modifier.
	pub const fn with_ctrl(self) -> Self {
		Self {
			modifiers: Modifiers {
				ctrl: true,
				..self.modifiers
			},
			..self
		}
	}

	/// Add Cmd modifier.
	pub const fn with_cmd(self) -> Self {
		Self {
			modifiers: Modifiers {
				cmd: true,
				..self.modifiers
			},
			..self
		}
	}

	/// Add Alt modifier.
	pub const fn with_alt(self) -> Self {
		Self {
			modifiers: Modifiers {
				alt: true,
				..self.modifiers
			},
			..self
		}
	}

	/// Add Shift modifier.
	pub const fn with_shift(self) -> Self {
		Self {
			modifiers: Modifiers {
				shift: true,
				..self.modifiers
			},
			..self
		}
	}

	/// Get the character if this is a character key.
	pub fn codepoint(&self) -> Option<char> {
		match self.code {
			KeyCode::Char(c) => Some(c),
			KeyCode::Space => Some(' '),
			KeyCode::Tab => Some('\t'),
			_ => None,
		}
	}

	/// Check if this is a specific character (ignoring modifiers).
	pub fn is_char(&self, c: char) -> bool {
		self.codepoint() == Some(c)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let m = self.modifiers;
		for (held, name) in [(m.ctrl, "ctrl"), (m.cmd, "cmd"), (m.alt, "alt"), (m.shift, "shift")] {
			if held {
				write!(f, "{name}-")?;
			}
		}
		match self.code {
			KeyCode::Char(c) => write!(f, "{c}"),
			KeyCode::Space => f.write_str("space"),
			KeyCode::Enter => f.write_str("enter"),
			KeyCode::Tab => f.write_str("tab"),
			KeyCode::Backspace => f.write_str("backspace"),
			KeyCode::Delete => f.write_str("del"),
			KeyCode::Esc => f.write_str("esc"),
			KeyCode::Up => f.write_str("up"),
			KeyCode::Down => f.write_str("down"),
			KeyCode::Left => f.write_str("left"),
			KeyCode::Right => f.write_str("right"),
			KeyCode::Home => f.write_str("home"),
			KeyCode::End => f.write_str("end"),
		}
	}
}

impl FromStr for Key {
	type Err = KeyParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse::parse(s)
	}
}

impl TryFrom<String> for Key {
	type Error = KeyParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Key> for String {
	fn from(key: Key) -> Self {
		key.to_string()
	}
}
