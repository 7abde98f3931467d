//! Conversion between YAML text and the structured document value.
//!
//! The text is the transport form used for editing; the structured value
//! ([`serde_json::Value`], key order preserved) is the transport form used by
//! producers that hand in pure structured input. Rendering normalizes the
//! serializer output so that what the user sees is stable:
//!
//! - entries that are empty per [`SanitizePolicy`] are dropped, recursively
//! - explicit nulls render as blank values (`key:`), not `null`
//! - escaped line breaks inside double-quoted scalars become real newlines
//! - long scalars are never folded and indentation is two spaces

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConvertError;


/// Indentation emitted for nested mappings.
pub const INDENT_WIDTH: usize = 2;

/// Which empty entries are removed before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SanitizePolicy {
	pub remove_empty_strings: bool,
	pub remove_empty_objects: bool,
	pub remove_empty_arrays: bool,
}

impl Default for SanitizePolicy {
	fn default() -> Self {
		Self {
			remove_empty_strings: true,
			remove_empty_objects: true,
			remove_empty_arrays: true,
		}
	}
}

/// Options for [`to_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
	pub sanitize: SanitizePolicy,
}

/// Renders a structured value as YAML text.
///
/// Returns an empty string when nothing survives sanitization.
pub fn to_text(value: &Value, options: &ConvertOptions) -> Result<String, ConvertError> {
	let sanitized = sanitize(value, &options.sanitize);
	if is_empty(Some(&sanitized)) {
		return Ok(String::new());
	}
	let raw = serde_yaml::to_string(&sanitized).map_err(ConvertError::Serialize)?;
	Ok(normalize_output(&raw))
}

/// Parses YAML text into a structured value. Blank text is `null`.
pub fn to_structured(text: &str) -> Result<Value, ConvertError> {
	if text.trim().is_empty() {
		return Ok(Value::Null);
	}
	serde_yaml::from_str(text).map_err(ConvertError::Parse)
}

/// Removes empty entries per `policy`.
///
/// Containers that become empty after their children are cleaned are removed
/// as well, so the result is a fixed point: sanitizing it again is a no-op.
/// A root that is removed entirely becomes `null`.
pub fn sanitize(value: &Value, policy: &SanitizePolicy) -> Value {
	clean(value, policy).unwrap_or(Value::Null)
}

fn clean(value: &Value, policy: &SanitizePolicy) -> Option<Value> {
	match value {
		Value::String(s) if s.is_empty() && policy.remove_empty_strings => None,
		Value::Object(map) => {
			let cleaned: Map<String, Value> = map
				.iter()
				.filter_map(|(key, child)| clean(child, policy).map(|child| (key.clone(), child)))
				.collect();
			if cleaned.is_empty() && policy.remove_empty_objects {
				None
			} else {
				Some(Value::Object(cleaned))
			}
		}
		Value::Array(items) => {
			let cleaned: Vec<Value> = items.iter().filter_map(|item| clean(item, policy)).collect();
			if cleaned.is_empty() && policy.remove_empty_arrays {
				None
			} else {
				Some(Value::Array(cleaned))
			}
		}
		other => Some(other.clone()),
	}
}

/// Returns true for absent, `null`, `{}` and `[]`.
pub fn is_empty(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => true,
		Some(Value::Object(map)) => map.is_empty(),
		Some(Value::Array(items)) => items.is_empty(),
		Some(_) => false,
	}
}

/// Deep equality where every "empty" value is equivalent to every other.
///
/// Used to skip reconversion (and the cursor reset it causes) when the same
/// structured input is handed in again.
pub fn is_equivalent(a: Option<&Value>, b: Option<&Value>) -> bool {
	match (is_empty(a), is_empty(b)) {
		(true, true) => true,
		(false, false) => a == b,
		_ => false,
	}
}

fn normalize_output(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut block_parent: Option<usize> = None;
	for line in raw.lines() {
		if let Some(parent) = block_parent {
			if line.trim().is_empty() || indentation(line) > parent {
				out.push_str(line);
				out.push('\n');
				continue;
			}
			block_parent = None;
		}
		block_parent = block_scalar_parent(line);
		expand_quoted_newlines(blank_null(line), &mut out);
		out.push('\n');
	}
	out
}

fn indentation(line: &str) -> usize {
	line.len() - line.trim_start_matches(' ').len()
}

/// Column of the node owning a block scalar opened on `line` (`key: |-`,
/// `- |`), or `None` if the line opens none. Lines of the scalar are
/// indented deeper than that column.
fn block_scalar_parent(line: &str) -> Option<usize> {
	let mut column = indentation(line);
	let mut rest = line.trim();
	let mut dash = None;
	while let Some(after) = rest.strip_prefix("- ") {
		dash = Some(column);
		column += 2;
		rest = after.trim_start();
	}
	if is_block_header(rest) {
		return Some(dash.unwrap_or(column));
	}
	let (key, value) = rest.rsplit_once(": ")?;
	(!key.is_empty() && is_block_header(value)).then_some(column)
}

/// `|`, `>`, with optional indentation and chomping indicators.
fn is_block_header(token: &str) -> bool {
	let Some(rest) = token.strip_prefix(['|', '>']) else {
		return false;
	};
	let rest = rest.strip_prefix(|c: char| c.is_ascii_digit()).unwrap_or(rest);
	matches!(rest, "" | "-" | "+")
}

/// `key: null` → `key:`, `- null` → `-`.
fn blank_null(line: &str) -> &str {
	if let Some(head) = line.strip_suffix(": null") {
		return &line[..head.len() + 1];
	}
	if line.trim_start() == "- null" {
		return &line[..line.len() - " null".len()];
	}
	line
}

/// Copies `line` into `out`, writing `\n` escapes of double-quoted values as
/// real line breaks.
///
/// Only scalars that start a node are quoted scalars; quotes inside plain
/// scalars are literal. Quoted keys are left alone, since an implicit key
/// cannot span lines.
fn expand_quoted_newlines(line: &str, out: &mut String) {
	let bytes = line.as_bytes();
	let mut copied = 0;
	let mut pos = 0;
	let mut node_start = true;
	while pos < bytes.len() {
		if node_start {
			match bytes[pos] {
				b' ' => {
					pos += 1;
					continue;
				}
				b'-' if bytes.get(pos + 1) == Some(&b' ') => {
					pos += 2;
					continue;
				}
				b'"' => {
					let end = double_quoted_end(bytes, pos);
					if !line[end..].starts_with(':') && line[pos..end].contains("\\n") {
						out.push_str(&line[copied..pos]);
						push_line_broken(&line[pos..end], pos, out);
						copied = end;
					}
					pos = end;
					node_start = false;
					continue;
				}
				b'\'' => {
					pos = single_quoted_end(bytes, pos);
					node_start = false;
					continue;
				}
				_ => node_start = false,
			}
		}
		if bytes[pos] == b':' && bytes.get(pos + 1) == Some(&b' ') {
			node_start = true;
			pos += 2;
			continue;
		}
		pos += 1;
	}
	out.push_str(&line[copied..]);
}

/// Byte offset just past the double-quoted scalar opening at `start`.
fn double_quoted_end(bytes: &[u8], start: usize) -> usize {
	let mut i = start + 1;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b'"' => return i + 1,
			_ => i += 1,
		}
	}
	bytes.len()
}

/// Byte offset just past the single-quoted scalar opening at `start`.
fn single_quoted_end(bytes: &[u8], start: usize) -> usize {
	let mut i = start + 1;
	while i < bytes.len() {
		if bytes[i] == b'\'' {
			if bytes.get(i + 1) == Some(&b'\'') {
				i += 2;
				continue;
			}
			return i + 1;
		}
		i += 1;
	}
	bytes.len()
}

/// Writes a double-quoted scalar with each `\n` escape as a line break
/// followed by an empty line, which folds back to exactly one newline.
///
/// Continuation lines are indented to the opening quote's `column`.
/// Whitespace next to a break would be folded away, so it is written as an
/// escape.
fn push_line_broken(scalar: &str, column: usize, out: &mut String) {
	let indent = " ".repeat(column);
	let mut pending_indent = false;
	let mut chars = scalar.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&'n') {
			chars.next();
			if !pending_indent {
				escape_trailing_blank(out);
				out.push('\n');
			}
			out.push('\n');
			pending_indent = true;
			continue;
		}
		if pending_indent {
			out.push_str(&indent);
			pending_indent = false;
			match c {
				' ' => {
					out.push_str("\\x20");
					continue;
				}
				'\t' => {
					out.push_str("\\t");
					continue;
				}
				_ => {}
			}
		}
		out.push(c);
		if c == '\\' {
			if let Some(escaped) = chars.next() {
				out.push(escaped);
			}
		}
	}
}

fn escape_trailing_blank(out: &mut String) {
	if out.ends_with(' ') {
		out.pop();
		out.push_str("\\x20");
	} else if out.ends_with('\t') {
		out.pop();
		out.push_str("\\t");
	}
}
