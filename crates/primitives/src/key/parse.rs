//! Parsing of key chord strings.
//!
//! ```text
//! chord     = (modifier "-")* key
//! modifier  = "ctrl" | "cmd" | "alt" | "shift"
//! key       = named-key | char
//! named-key = "space" | "enter" | "tab" | "backspace" | "del" | "esc" | ...
//! ```
//!
//! A trailing `-` is the minus key itself, so `"ctrl--"` is Ctrl+minus.

use thiserror::Error;

use super::{Key, KeyCode, Modifiers};


/// Errors produced while parsing a key chord string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
	/// The input was empty.
	#[error("empty key chord")]
	Empty,
	/// A modifier name was not recognized.
	#[error("unknown modifier '{0}' (expected ctrl, cmd, alt or shift)")]
	UnknownModifier(String),
	/// The key part was neither a named key nor a single character.
	#[error("unknown key '{0}'")]
	UnknownKey(String),
}

/// Parses a chord such as `"ctrl-z"`, `"shift-+"` or `"esc"`.
pub(super) fn parse(input: &str) -> Result<Key, KeyParseError> {
	let input = input.trim();
	if input.is_empty() {
		return Err(KeyParseError::Empty);
	}

	let (mods, key) = if input == "-" {
		("", "-")
	} else if let Some(mods) = input.strip_suffix("--") {
		(mods, "-")
	} else {
		match input.rsplit_once('-') {
			Some((mods, key)) if !key.is_empty() => (mods, key),
			Some(_) => return Err(KeyParseError::UnknownKey(input.to_string())),
			None => ("", input),
		}
	};

	let mut modifiers = Modifiers::NONE;
	for name in mods.split('-').filter(|m| !m.is_empty()) {
		modifiers = match name.to_ascii_lowercase().as_str() {
			"ctrl" | "control" => modifiers.ctrl(),
			"cmd" | "meta" | "super" => modifiers.cmd(),
			"alt" | "option" => modifiers.alt(),
			"shift" => modifiers.shift(),
			_ => return Err(KeyParseError::UnknownModifier(name.to_string())),
		};
	}

	Ok(Key {
		code: parse_code(key)?,
		modifiers,
	})
}

fn parse_code(key: &str) -> Result<KeyCode, KeyParseError> {
	let mut chars = key.chars();
	if let (Some(c), None) = (chars.next(), chars.next()) {
		return Ok(if c == ' ' { KeyCode::Space } else { KeyCode::Char(c) });
	}

	let code = match key.to_ascii_lowercase().as_str() {
		"space" => KeyCode::Space,
		"enter" | "ret" | "return" => KeyCode::Enter,
		"tab" => KeyCode::Tab,
		"backspace" => KeyCode::Backspace,
		"del" | "delete" => KeyCode::Delete,
		"esc" | "escape" => KeyCode::Esc,
		"up" => KeyCode::Up,
		"down" => KeyCode::Down,
		"left" => KeyCode::Left,
		"right" => KeyCode::Right,
		"home" => KeyCode::Home,
		"end" => KeyCode::End,
		_ => return Err(KeyParseError::UnknownKey(key.to_string())),
	};
	Ok(code)
}
