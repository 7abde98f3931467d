use std::sync::Arc;

use parking_lot::RwLock;

use crate::diagnostics::DiagnosticsMap;

/// Identity of a [`SessionHandle`]; changes whenever the schema changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

/// State published by the session and read through handles.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
	pub(crate) text: String,
	pub(crate) diagnostics: Option<DiagnosticsMap>,
}

/// Read-only view of a session for the embedding page.
///
/// Cheap to clone and safe to move across threads. Reads always see the
/// last committed state, even while validation is still pending.
#[derive(Debug, Clone)]
pub struct SessionHandle {
	id: HandleId,
	shared: Arc<RwLock<SharedState>>,
}

impl SessionHandle {
	pub(crate) fn new(id: HandleId, shared: Arc<RwLock<SharedState>>) -> Self {
		Self { id, shared }
	}

	pub fn id(&self) -> HandleId {
		self.id
	}

	/// Last committed buffer text.
	pub fn latest_text(&self) -> String {
		self.shared.read().text.clone()
	}

	/// Last published diagnostics, or `None` when cleared or never validated.
	pub fn latest_validation_errors(&self) -> Option<DiagnosticsMap> {
		self.shared.read().diagnostics.clone()
	}
}
