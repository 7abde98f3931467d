//! Editor configuration.
//!
//! Configuration is written in TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! validation-debounce-ms = 500
//! validation-error-toast-ms = 5000
//!
//! [sanitize]
//! remove-empty-strings = true
//! remove-empty-objects = true
//! remove-empty-arrays = true
//!
//! [keys]
//! undo = ["ctrl-z", "cmd-z"]
//! clear-suggestions = "esc"
//! expression-trigger = "shift-+"
//! runtime-input-triggers = ["ctrl-space"]
//!
//! [expression]
//! marker = "<"
//! open-sequence = "<+"
//! separator = "."
//! trigger-characters = ["+", "."]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use stanza_primitives::{Key, KeyCode};

use crate::convert::SanitizePolicy;
use crate::error::ConfigError;


/// Default delay between the last text change and schema validation.
pub const DEFAULT_VALIDATION_DEBOUNCE_MS: u64 = 500;

/// Minimum display duration for validation failure toasts.
pub const DEFAULT_VALIDATION_ERROR_TOAST_MS: u64 = 5000;

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EditorConfig {
	/// Debounce window for validation on typed changes, in milliseconds.
	pub validation_debounce_ms: u64,
	/// Toast duration for validation failures, in milliseconds.
	pub validation_error_toast_ms: u64,
	/// Which empty entries are dropped before rendering structured input.
	pub sanitize: SanitizePolicy,
	/// Key bindings.
	pub keys: KeysConfig,
	/// Expression completion syntax.
	pub expression: ExpressionConfig,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			validation_debounce_ms: DEFAULT_VALIDATION_DEBOUNCE_MS,
			validation_error_toast_ms: DEFAULT_VALIDATION_ERROR_TOAST_MS,
			sanitize: SanitizePolicy::default(),
			keys: KeysConfig::default(),
			expression: ExpressionConfig::default(),
		}
	}
}

impl EditorConfig {
	/// Parses configuration from a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Loads configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validation_debounce(&self) -> Duration {
		Duration::from_millis(self.validation_debounce_ms)
	}

	pub fn validation_error_toast(&self) -> Duration {
		Duration::from_millis(self.validation_error_toast_ms)
	}
}

/// Key bindings handled by the session before the host sees them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct KeysConfig {
	/// Chords treated as "undo" by the history guard.
	pub undo: Vec<Key>,
	/// Chord that disposes every live completion provider.
	pub clear_suggestions: Key,
	/// Chord that opens expression completion after the marker character.
	pub expression_trigger: Key,
	/// Chords that request runtime-input suggestions.
	pub runtime_input_triggers: Vec<Key>,
}

impl Default for KeysConfig {
	fn default() -> Self {
		Self {
			undo: vec![Key::ctrl('z'), Key::cmd('z')],
			clear_suggestions: Key::new(KeyCode::Esc),
			expression_trigger: Key::char('+').with_shift(),
			runtime_input_triggers: vec![Key::new(KeyCode::Space).with_ctrl()],
		}
	}
}

/// Expression syntax recognized by expression completion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExpressionConfig {
	/// Character that must precede the cursor for the trigger chord to fire.
	pub marker: char,
	/// Sequence opening an expression (`<+`); an expression is open until `close`.
	pub open_sequence: String,
	/// Character closing an expression.
	pub close: char,
	/// Path separator inside expressions; typing it re-queries deeper paths.
	pub separator: char,
	/// Characters the registered provider triggers on.
	pub trigger_characters: Vec<char>,
}

impl Default for ExpressionConfig {
	fn default() -> Self {
		Self {
			marker: '<',
			open_sequence: "<+".to_string(),
			close: '>',
			separator: '.',
			trigger_characters: vec!['+', '.'],
		}
	}
}

impl ExpressionConfig {
	/// Returns true when `fragment` contains an expression that is not yet closed.
	pub fn has_open_expression(&self, fragment: &str) -> bool {
		fragment
			.rfind(&self.open_sequence)
			.is_some_and(|start| !fragment[start + self.open_sequence.len()..].contains(self.close))
	}
}
