//! Context-sensitive completion.
//!
//! Two independent mechanisms feed the host editor's suggestion widget:
//!
//! - [`ExpressionCompletion`]: typed after an expression marker (`<` then
//!   `+`), or on the path separator inside an open expression
//! - [`RuntimeInputCompletion`]: an explicit chord on a property whose path
//!   matches one of the embedder's [`PathMappings`]
//!
//! Both spawn the supplier future on the runtime and report the outcome as a
//! [`SessionEvent::Suggestions`]. Applying that event registers a transient
//! provider through the session's [`ProviderRegistry`], which keeps at most
//! one live provider per [`ProviderKind`].

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::SessionEvent;
use crate::host::SuggestionFuture;

mod expression;
mod registry;
mod runtime_input;

#[cfg(test)]
mod tests;

pub use expression::{ExpressionCompletion, ExpressionTrigger};
pub use registry::ProviderRegistry;
pub use runtime_input::{PathMappings, RUNTIME_INPUT_TRIGGER, RuntimeInputCompletion};

/// Which completion mechanism owns a provider registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
	Expression,
	RuntimeInput,
}

/// A completion item handed to the host verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
	pub label: String,
	pub insert_text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
	#[serde(default)]
	pub kind: SuggestionKind,
}

impl Suggestion {
	/// A suggestion inserting its own label.
	pub fn new(label: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			insert_text: label.clone(),
			label,
			detail: None,
			kind: SuggestionKind::default(),
		}
	}

	pub fn with_insert_text(mut self, insert_text: impl Into<String>) -> Self {
		self.insert_text = insert_text.into();
		self
	}

	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}

	pub fn with_kind(mut self, kind: SuggestionKind) -> Self {
		self.kind = kind;
		self
	}
}

/// Icon hint for the host's suggestion widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
	#[default]
	Value,
	Field,
	Variable,
	Function,
	Keyword,
}

/// Sequence numbers and the event channel shared by both mechanisms.
#[derive(Debug)]
struct SuggestionRequests {
	kind: ProviderKind,
	issued: u64,
	events: mpsc::UnboundedSender<SessionEvent>,
	shutdown: CancellationToken,
}

impl SuggestionRequests {
	fn new(
		kind: ProviderKind,
		events: mpsc::UnboundedSender<SessionEvent>,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			kind,
			issued: 0,
			events,
			shutdown,
		}
	}

	/// Spawns `future`; its outcome is delivered for `trigger_characters`.
	///
	/// Requests are never superseded by later ones: whichever resolves last
	/// registers last. Only session shutdown abandons them.
	fn spawn(&mut self, future: SuggestionFuture, trigger_characters: Vec<char>) -> u64 {
		self.issued = self.issued.wrapping_add(1);
		let request = self.issued;
		let kind = self.kind;
		let events = self.events.clone();
		let shutdown = self.shutdown.clone();

		debug!(?kind, request, "completion.request");
		tokio::spawn(async move {
			let result = tokio::select! {
				_ = shutdown.cancelled() => {
					trace!(?kind, request, "completion.request_abandoned");
					return;
				}
				result = future => result,
			};
			let _ = events.send(SessionEvent::Suggestions {
				kind,
				request,
				trigger_characters,
				result,
			});
		});
		request
	}

	fn issued(&self) -> u64 {
		self.issued
	}
}
