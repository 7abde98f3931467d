use std::sync::Arc;

use stanza_primitives::Key;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ProviderKind, SuggestionRequests};
use crate::config::ExpressionConfig;
use crate::context::{TreePath, expression_fragment};
use crate::events::SessionEvent;
use crate::host::ExpressionSupplier;

/// Why expression completion fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionTrigger {
	/// The trigger chord right after the marker character.
	Marker,
	/// The path separator inside an open expression.
	Separator,
}

/// Expression completion for one session.
pub struct ExpressionCompletion {
	syntax: ExpressionConfig,
	trigger_key: Key,
	supplier: Option<Arc<dyn ExpressionSupplier>>,
	requests: SuggestionRequests,
}

impl std::fmt::Debug for ExpressionCompletion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExpressionCompletion")
			.field("syntax", &self.syntax)
			.field("trigger_key", &self.trigger_key)
			.field("has_supplier", &self.supplier.is_some())
			.field("requests", &self.requests.issued())
			.finish()
	}
}

impl ExpressionCompletion {
	pub fn new(
		syntax: ExpressionConfig,
		trigger_key: Key,
		supplier: Option<Arc<dyn ExpressionSupplier>>,
		events: mpsc::UnboundedSender<SessionEvent>,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			syntax,
			trigger_key,
			supplier,
			requests: SuggestionRequests::new(ProviderKind::Expression, events, shutdown),
		}
	}

	/// Classifies a keystroke on `line` with the cursor at char `column`,
	/// before the key's character is inserted.
	pub fn trigger_for(&self, key: &Key, line: &str, column: usize) -> Option<ExpressionTrigger> {
		if self.supplier.is_none() {
			return None;
		}
		if *key == self.trigger_key {
			let preceding = column.checked_sub(1).and_then(|i| line.chars().nth(i));
			return (preceding == Some(self.syntax.marker)).then_some(ExpressionTrigger::Marker);
		}
		if key.is_char(self.syntax.separator)
			&& key.modifiers.is_printable()
			&& self.syntax.has_open_expression(expression_fragment(line))
		{
			return Some(ExpressionTrigger::Separator);
		}
		None
	}

	/// Partial expression passed to the supplier for `trigger`.
	pub fn partial_expression<'a>(&self, trigger: ExpressionTrigger, line: &'a str) -> &'a str {
		match trigger {
			ExpressionTrigger::Marker => "",
			ExpressionTrigger::Separator => expression_fragment(line),
		}
	}

	/// Asks the supplier for suggestions at `path`.
	///
	/// Returns the request number, or `None` when the supplier has nothing
	/// for this context.
	pub fn request(&mut self, path: &TreePath, partial_expression: &str) -> Option<u64> {
		let supplier = self.supplier.as_ref()?;
		let Some(future) = supplier.suggest(path, partial_expression) else {
			debug!(path = %path, "completion.expression.no_suggestions");
			return None;
		};
		let triggers = self.syntax.trigger_characters.clone();
		Some(self.requests.spawn(future, triggers))
	}

	/// Number of requests spawned so far.
	pub fn requests_issued(&self) -> u64 {
		self.requests.issued()
	}
}
