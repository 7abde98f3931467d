//! Undo protection for programmatic buffer resets.
//!
//! When the session replaces the whole buffer (new structured input), the
//! host records that replacement as an undoable edit. Undoing it would
//! resurrect text the embedder has already superseded, so the first undo
//! after a reset is swallowed.

use stanza_primitives::{Key, VersionId};
use tracing::debug;


/// Tracks the version captured at the last wholesale text replacement.
#[derive(Debug, Clone)]
pub struct HistoryGuard {
	baseline: VersionId,
	undo_keys: Vec<Key>,
}

impl HistoryGuard {
	pub fn new(baseline: VersionId, undo_keys: Vec<Key>) -> Self {
		Self { baseline, undo_keys }
	}

	/// Records `version` as the new baseline.
	pub fn capture(&mut self, version: VersionId) {
		self.baseline = version;
	}

	pub fn baseline(&self) -> VersionId {
		self.baseline
	}

	pub fn is_undo(&self, key: &Key) -> bool {
		self.undo_keys.contains(key)
	}

	/// True when `key` is an undo chord and the document is exactly one
	/// version past the baseline.
	pub fn should_suppress(&self, key: &Key, current: VersionId) -> bool {
		let suppress = self.is_undo(key) && current == self.baseline.next();
		if suppress {
			debug!(baseline = self.baseline.0, current = current.0, "history.undo_suppressed");
		}
		suppress
	}
}
