//! Seams to the outside world.
//!
//! The editing core never talks to a concrete editor widget, network client
//! or toast system. It is handed implementations of these traits:
//!
//! - [`HostEditor`]: the code editor surface (text, cursor, versions, providers)
//! - [`SchemaValidator`]: asynchronous schema validation
//! - [`ExpressionSupplier`]: expression suggestions for a context path
//! - [`PathMappingCallback`]: runtime-input suggestions for matched paths
//! - [`SessionNotifier`]: toasts, error callbacks and change notifications
//!
//! Service traits are implemented for plain closures so embedders and tests
//! can pass `Fn`s directly.

use std::time::Duration;

use serde_json::{Map, Value};
use stanza_primitives::{BoxFutureStatic, Position, VersionId};
use tracing::{debug, error};

use crate::completion::Suggestion;
use crate::context::TreePath;
use crate::diagnostics::{LanguageSettings, SchemaDiagnostic};
use crate::error::{EditorError, ServiceError};

#[cfg(any(test, feature = "test-support"))]
mod memory;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{LiveRegistration, MemoryHost};

/// Caller-supplied parameters forwarded verbatim to path-mapping callbacks.
pub type AmbientParams = Map<String, Value>;

/// Future returned by suggestion suppliers.
pub type SuggestionFuture = BoxFutureStatic<Result<Vec<Suggestion>, ServiceError>>;

/// Future returned by schema validators.
pub type ValidationFuture = BoxFutureStatic<Result<Vec<SchemaDiagnostic>, ServiceError>>;

/// Read access to the live buffer.
pub trait BufferAccess {
	/// Full buffer text.
	fn text(&self) -> String;
	/// Cursor position.
	fn cursor(&self) -> Position;
	/// Content of `line` without its line break, or `None` past the end.
	fn line_content(&self, line: usize) -> Option<String>;
}

/// The host code editor.
pub trait HostEditor: BufferAccess {
	/// Current version marker of the host's model.
	fn version_id(&self) -> VersionId;

	/// Replaces the whole buffer (programmatic reset).
	fn replace_text(&mut self, text: &str);

	/// Registers a completion provider that offers `suggestions` when one of
	/// `trigger_characters` is typed. Dropping the returned disposer without
	/// calling [`ProviderDisposer::dispose`] leaks the registration.
	fn register_completion_provider(
		&mut self,
		trigger_characters: &[char],
		suggestions: Vec<Suggestion>,
	) -> Box<dyn ProviderDisposer>;
}

/// Unregisters a completion provider from the host.
pub trait ProviderDisposer {
	fn dispose(self: Box<Self>);
}

impl<F: FnOnce()> ProviderDisposer for F {
	fn dispose(self: Box<Self>) {
		(*self)()
	}
}

/// Validates YAML text against the schema carried in `settings`.
pub trait SchemaValidator: Send + Sync {
	fn validate(&self, text: String, settings: LanguageSettings) -> ValidationFuture;
}

impl<F> SchemaValidator for F
where
	F: Fn(String, LanguageSettings) -> ValidationFuture + Send + Sync,
{
	fn validate(&self, text: String, settings: LanguageSettings) -> ValidationFuture {
		self(text, settings)
	}
}

/// Supplies expression suggestions.
pub trait ExpressionSupplier: Send + Sync {
	/// Returns `None` when the supplier has nothing for this context.
	fn suggest(&self, path: &TreePath, partial_expression: &str) -> Option<SuggestionFuture>;
}

impl<F> ExpressionSupplier for F
where
	F: Fn(&TreePath, &str) -> Option<SuggestionFuture> + Send + Sync,
{
	fn suggest(&self, path: &TreePath, partial_expression: &str) -> Option<SuggestionFuture> {
		self(path, partial_expression)
	}
}

/// Supplies runtime-input suggestions for a path matched by a path mapping.
pub trait PathMappingCallback: Send + Sync {
	fn suggest(&self, path: &TreePath, text: &str, ambient: &AmbientParams) -> SuggestionFuture;
}

impl<F> PathMappingCallback for F
where
	F: Fn(&TreePath, &str, &AmbientParams) -> SuggestionFuture + Send + Sync,
{
	fn suggest(&self, path: &TreePath, text: &str, ambient: &AmbientParams) -> SuggestionFuture {
		self(path, text, ambient)
	}
}

/// Notifications from the session to the embedding page.
pub trait SessionNotifier {
	/// Shows a toast. `duration` is a minimum display time when given.
	fn report_error(&self, message: &str, duration: Option<Duration>);

	/// Reports a recovered failure (conversion, context resolution).
	fn on_error(&self, error: &EditorError);

	/// Called on every committed edit with whether the document is non-empty.
	fn on_change(&self, _non_empty: bool) {}
}

/// A [`SessionNotifier`] that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl SessionNotifier for TracingNotifier {
	fn report_error(&self, message: &str, duration: Option<Duration>) {
		error!(message, duration_ms = duration.map(|d| d.as_millis() as u64), "session.report_error");
	}

	fn on_error(&self, err: &EditorError) {
		error!(error = %err, "session.error");
	}

	fn on_change(&self, non_empty: bool) {
		debug!(non_empty, "session.change");
	}
}
