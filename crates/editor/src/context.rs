//! Cursor context resolution.
//!
//! Completion requests are scoped by the tree path of the property under
//! the cursor. While the user is typing a new key the buffer is usually not
//! a valid document yet (`  image` on its own line has no value), so the
//! resolver can splice a synthetic `: placeholder` value in at the cursor
//! before parsing. The repaired text is only used for path resolution and
//! for handing to suggestion callbacks; the buffer itself is untouched.

use std::fmt;

use ropey::Rope;
use serde_json::Value;
use tracing::trace;

use crate::convert::to_structured;
use crate::error::ContextError;
use crate::host::BufferAccess;


/// Fragment spliced in at the cursor by placeholder repair.
pub const PLACEHOLDER: &str = ": placeholder";

/// Separator between a key and its value.
pub const KEY_SEPARATOR: char = ':';

/// One step of a [`TreePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
	Key(String),
	Index(usize),
}

impl fmt::Display for PathSegment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathSegment::Key(key) => f.write_str(key),
			PathSegment::Index(index) => write!(f, "{index}"),
		}
	}
}

/// Ordered keys and indices from the document root to a target.
///
/// Displays dot-joined (`pipeline.stages.0.name`), which is the form path
/// patterns are matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TreePath(Vec<PathSegment>);

impl TreePath {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a path of keys only.
	pub fn from_keys<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
	}

	pub fn push(&mut self, segment: PathSegment) {
		self.0.push(segment);
	}

	pub fn pop(&mut self) -> Option<PathSegment> {
		self.0.pop()
	}

	pub fn segments(&self) -> &[PathSegment] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The final segment, if it is a key.
	pub fn leaf_key(&self) -> Option<&str> {
		match self.0.last() {
			Some(PathSegment::Key(key)) => Some(key),
			_ => None,
		}
	}
}

impl fmt::Display for TreePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(".")?;
			}
			write!(f, "{segment}")?;
		}
		Ok(())
	}
}

/// Result of resolving the cursor context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath {
	/// Property name on the cursor line.
	pub current_property: String,
	/// The text that was parsed, including any placeholder repair.
	pub text: String,
	/// Path to the first occurrence of `current_property`; empty if not found.
	pub path: TreePath,
}

/// Reads the buffer, optionally repairing the cursor line.
///
/// Returns `None` for an empty buffer. When `insert_placeholder` is set, the
/// cursor line is non-empty, and the character before the cursor is not
/// already a key separator, [`PLACEHOLDER`] is inserted at the cursor.
pub fn extract_text_with_optional_placeholder<B>(buffer: &B, insert_placeholder: bool) -> Option<String>
where
	B: BufferAccess + ?Sized,
{
	let text = buffer.text();
	if text.is_empty() {
		return None;
	}
	if !insert_placeholder {
		return Some(text);
	}

	let cursor = buffer.cursor();
	let Some(line) = buffer.line_content(cursor.line) else {
		return Some(text);
	};
	if line.is_empty() {
		return Some(text);
	}

	let column = cursor.column.min(line.chars().count());
	let preceding = column.checked_sub(1).and_then(|i| line.chars().nth(i));
	if preceding == Some(KEY_SEPARATOR) {
		return Some(text);
	}

	let mut rope = Rope::from_str(&text);
	if cursor.line >= rope.len_lines() {
		return Some(text);
	}
	let offset = rope.line_to_char(cursor.line) + column;
	rope.insert(offset, PLACEHOLDER);
	trace!(line = cursor.line, column, "context.placeholder_inserted");
	Some(rope.to_string())
}

/// Resolves the tree path of the property under the cursor.
///
/// Parse failures are passed to `on_error` and yield `None`. When the same
/// property name occurs more than once, the first occurrence in document
/// order wins, which may not be the one under the cursor.
pub fn resolve_context_path<B, F>(buffer: &B, on_error: F, insert_placeholder: bool) -> Option<ContextPath>
where
	B: BufferAccess + ?Sized,
	F: FnOnce(ContextError),
{
	let text = extract_text_with_optional_placeholder(buffer, insert_placeholder)?;
	let line = buffer.line_content(buffer.cursor().line).unwrap_or_default();
	let current_property = property_name(&line).to_string();

	let value = match to_structured(&text) {
		Ok(value) => value,
		Err(source) => {
			on_error(ContextError::Parse {
				property: current_property,
				source,
			});
			return None;
		}
	};

	let path = find_key_path(&value, &current_property).unwrap_or_default();
	trace!(property = %current_property, path = %path, "context.resolved");
	Some(ContextPath {
		current_property,
		text,
		path,
	})
}

/// Text before the first key separator, trimmed, without a sequence marker.
pub fn property_name(line: &str) -> &str {
	let key = line.split(KEY_SEPARATOR).next().unwrap_or_default().trim();
	key.strip_prefix("- ").map_or(key, str::trim_start)
}

/// Text after the first key separator, trimmed.
pub fn expression_fragment(line: &str) -> &str {
	line.split_once(KEY_SEPARATOR).map_or("", |(_, value)| value.trim())
}

/// Path to the first key equal to `key`, in pre-order document order.
///
/// The returned path ends with the matched key.
pub fn find_key_path(value: &Value, key: &str) -> Option<TreePath> {
	let mut path = TreePath::new();
	search(value, key, &mut path).then_some(path)
}

fn search(value: &Value, key: &str, path: &mut TreePath) -> bool {
	match value {
		Value::Object(map) => {
			for (name, child) in map {
				path.push(PathSegment::Key(name.clone()));
				if name == key || search(child, key, path) {
					return true;
				}
				path.pop();
			}
			false
		}
		Value::Array(items) => {
			for (index, child) in items.iter().enumerate() {
				path.push(PathSegment::Index(index));
				if search(child, key, path) {
					return true;
				}
				path.pop();
			}
			false
		}
		_ => false,
	}
}
