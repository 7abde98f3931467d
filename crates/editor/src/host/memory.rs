use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use ropey::Rope;
use stanza_primitives::{Position, VersionId};

use super::{BufferAccess, HostEditor, ProviderDisposer};
use crate::completion::Suggestion;

/// A completion provider currently registered with a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRegistration {
	pub id: u64,
	pub trigger_characters: Vec<char>,
	pub suggestions: Vec<Suggestion>,
}

/// Headless [`HostEditor`] backed by a rope.
///
/// Every edit bumps the version marker, as a code editor model would. The
/// host records provider registrations so callers can inspect which
/// providers are live.
#[derive(Debug)]
pub struct MemoryHost {
	rope: Rope,
	cursor: Position,
	version: VersionId,
	next_registration: u64,
	registered: usize,
	live: Rc<RefCell<BTreeMap<u64, LiveRegistration>>>,
	disposed: Rc<Cell<usize>>,
}

impl MemoryHost {
	pub fn new(text: &str) -> Self {
		Self {
			rope: Rope::from_str(text),
			cursor: Position::default(),
			version: VersionId::default(),
			next_registration: 0,
			registered: 0,
			live: Rc::default(),
			disposed: Rc::default(),
		}
	}

	/// Moves the cursor, clamped to the document.
	pub fn set_cursor(&mut self, position: Position) {
		let last_line = self.rope.len_lines().saturating_sub(1);
		let line = position.line.min(last_line);
		let width = self.line_content(line).map_or(0, |l| l.chars().count());
		self.cursor = Position::new(line, position.column.min(width));
	}

	/// Moves the cursor to the end of `line`.
	pub fn set_cursor_to_line_end(&mut self, line: usize) {
		self.set_cursor(Position::new(line, usize::MAX));
	}

	/// Inserts `text` at the cursor as one edit and advances the cursor.
	pub fn type_text(&mut self, text: &str) {
		let offset = self.char_offset(self.cursor);
		self.rope.insert(offset, text);
		for c in text.chars() {
			if c == '\n' {
				self.cursor.line += 1;
				self.cursor.column = 0;
			} else {
				self.cursor.column += 1;
			}
		}
		self.version = self.version.next();
	}

	/// Providers registered and not yet disposed, oldest first.
	pub fn live_providers(&self) -> Vec<LiveRegistration> {
		self.live.borrow().values().cloned().collect()
	}

	/// Total registrations over the host's lifetime.
	pub fn registered_count(&self) -> usize {
		self.registered
	}

	/// Total disposals over the host's lifetime.
	pub fn disposed_count(&self) -> usize {
		self.disposed.get()
	}

	fn char_offset(&self, position: Position) -> usize {
		self.rope.line_to_char(position.line) + position.column
	}
}

impl BufferAccess for MemoryHost {
	fn text(&self) -> String {
		self.rope.to_string()
	}

	fn cursor(&self) -> Position {
		self.cursor
	}

	fn line_content(&self, line: usize) -> Option<String> {
		if line >= self.rope.len_lines() {
			return None;
		}
		let content = self.rope.line(line).to_string();
		let trimmed = content.trim_end_matches(['\n', '\r']);
		Some(trimmed.to_string())
	}
}

impl HostEditor for MemoryHost {
	fn version_id(&self) -> VersionId {
		self.version
	}

	fn replace_text(&mut self, text: &str) {
		self.rope = Rope::from_str(text);
		self.cursor = Position::default();
		self.version = self.version.next();
	}

	fn register_completion_provider(
		&mut self,
		trigger_characters: &[char],
		suggestions: Vec<Suggestion>,
	) -> Box<dyn ProviderDisposer> {
		self.next_registration += 1;
		self.registered += 1;
		let id = self.next_registration;
		self.live.borrow_mut().insert(
			id,
			LiveRegistration {
				id,
				trigger_characters: trigger_characters.to_vec(),
				suggestions,
			},
		);

		let live = Rc::clone(&self.live);
		let disposed = Rc::clone(&self.disposed);
		Box::new(move || {
			live.borrow_mut().remove(&id);
			disposed.set(disposed.get() + 1);
		})
	}
}
