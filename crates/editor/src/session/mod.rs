//! The editing session: owner of all per-editor state.
//!
//! [`EditorSession`] is driven from the embedder's thread. Host callbacks
//! (text changed, key down) and embedder updates (structured input, schema,
//! path mappings) are synchronous. Background work reports back as
//! [`SessionEvent`]s which the embedder feeds in with
//! [`EditorSession::poll_events`] or [`EditorSession::next_event`].
//!
//! Every entry point recovers from its own failures: nothing returned to
//! the embedder is an error.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use stanza_primitives::Key;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::completion::{ExpressionCompletion, PathMappings, ProviderRegistry, RuntimeInputCompletion};
use crate::config::EditorConfig;
use crate::context::{ContextPath, resolve_context_path};
use crate::convert::{self, ConvertOptions};
use crate::diagnostics::{DiagnosticsMap, DiagnosticsPipeline, ValidationDispatch};
use crate::error::{EditorError, GENERIC_ERROR_MESSAGE, ServiceError};
use crate::events::SessionEvent;
use crate::history::HistoryGuard;
use crate::host::{AmbientParams, ExpressionSupplier, HostEditor, SchemaValidator, SessionNotifier};

mod handle;


pub use handle::{HandleId, SessionHandle};
use handle::SharedState;

/// External services a session talks to.
pub struct SessionServices {
	pub validator: Arc<dyn SchemaValidator>,
	/// Expression completion is disabled without a supplier.
	pub expressions: Option<Arc<dyn ExpressionSupplier>>,
	pub notifier: Box<dyn SessionNotifier>,
}

/// What the host should do with a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
	/// Swallow the key: no default action, no propagation.
	Suppressed,
	/// Let the host handle the key as usual.
	Continue,
}

type Binder = Box<dyn FnMut(SessionHandle)>;

/// One mounted editor.
pub struct EditorSession<H: HostEditor> {
	host: H,
	config: EditorConfig,
	notifier: Box<dyn SessionNotifier>,
	shared: Arc<RwLock<SharedState>>,
	handle: SessionHandle,
	binder: Option<Binder>,
	schema: Option<Value>,
	structured: Option<Value>,
	/// Last applied structured input. Typing leaves it alone; text input
	/// clears it.
	last_input: Option<Value>,
	history: HistoryGuard,
	diagnostics: DiagnosticsPipeline,
	providers: ProviderRegistry,
	expressions: ExpressionCompletion,
	runtime_inputs: RuntimeInputCompletion,
	events: mpsc::UnboundedReceiver<SessionEvent>,
	shutdown: CancellationToken,
	mounted: bool,
}

impl<H: HostEditor> EditorSession<H> {
	/// Mounts a session on `host`.
	///
	/// Must be called within a tokio runtime; background work is spawned on it.
	pub fn mount(host: H, config: EditorConfig, services: SessionServices) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();
		let text = host.text();
		let structured = convert::to_structured(&text).ok();
		let shared = Arc::new(RwLock::new(SharedState {
			text,
			diagnostics: None,
		}));

		let session = Self {
			history: HistoryGuard::new(host.version_id(), config.keys.undo.clone()),
			diagnostics: DiagnosticsPipeline::new(services.validator, config.validation_debounce(), tx.clone()),
			providers: ProviderRegistry::new(),
			expressions: ExpressionCompletion::new(
				config.expression.clone(),
				config.keys.expression_trigger,
				services.expressions,
				tx.clone(),
				shutdown.clone(),
			),
			runtime_inputs: RuntimeInputCompletion::new(config.keys.runtime_input_triggers.clone(), tx, shutdown.clone()),
			handle: SessionHandle::new(HandleId(1), Arc::clone(&shared)),
			shared,
			host,
			config,
			notifier: services.notifier,
			binder: None,
			schema: None,
			structured,
			last_input: None,
			events: rx,
			shutdown,
			mounted: true,
		};
		debug!(version = session.history.baseline().0, "session.mount");
		session
	}

	/// Installs the binding callback and invokes it with the current handle.
	///
	/// The callback is invoked again each time the handle is re-created.
	pub fn bind(&mut self, binder: impl FnMut(SessionHandle) + 'static) {
		let mut binder: Binder = Box::new(binder);
		binder(self.handle.clone());
		self.binder = Some(binder);
	}

	/// Replaces the buffer with the rendering of `value`.
	///
	/// Skipped when `value` is equivalent to the previous structured input,
	/// so edits typed since then survive a repeated value. On conversion
	/// failure the buffer is left unchanged.
	pub fn set_structured_input(&mut self, value: Value) {
		let repeated = self
			.last_input
			.as_ref()
			.is_some_and(|last| convert::is_equivalent(Some(&value), Some(last)));
		if repeated {
			trace!("session.structured_input_unchanged");
			return;
		}
		let options = ConvertOptions {
			sanitize: self.config.sanitize,
		};
		match convert::to_text(&value, &options) {
			Ok(text) => {
				self.replace_buffer(&text);
				self.structured = Some(value.clone());
				self.last_input = Some(value);
			}
			Err(err) => {
				warn!(error = %err, "session.convert_failed");
				self.notifier.on_error(&err.into());
			}
		}
	}

	/// Replaces the buffer with `text`. No-op when the buffer already holds it.
	pub fn set_text_input(&mut self, text: &str) {
		if self.host.text() == text {
			return;
		}
		self.replace_buffer(text);
		self.structured = convert::to_structured(text).ok();
		self.last_input = None;
	}

	fn replace_buffer(&mut self, text: &str) {
		self.host.replace_text(text);
		self.history.capture(self.host.version_id());
		self.commit_text(text.to_string());
		let dispatch = self.diagnostics.validate_now(text, self.schema.as_ref());
		self.after_dispatch(dispatch);
	}

	/// Host callback after the user edited the buffer.
	pub fn on_text_changed(&mut self) {
		let text = self.host.text();
		self.structured = convert::to_structured(&text).ok();
		let dispatch = self.diagnostics.schedule(&text, self.schema.as_ref());
		self.commit_text(text);
		self.after_dispatch(dispatch);
	}

	fn commit_text(&mut self, text: String) {
		let non_empty = !text.is_empty();
		self.shared.write().text = text;
		self.notifier.on_change(non_empty);
	}

	fn after_dispatch(&mut self, dispatch: Result<ValidationDispatch, ServiceError>) {
		match dispatch {
			Ok(ValidationDispatch::Cleared) => {
				self.shared.write().diagnostics = None;
				debug!("diagnostics.cleared");
			}
			Ok(ValidationDispatch::Skipped | ValidationDispatch::Requested { .. }) => {}
			Err(err) => {
				warn!(error = %err, "diagnostics.request_failed");
				self.notifier.report_error(GENERIC_ERROR_MESSAGE, None);
			}
		}
	}

	/// Host callback before a keystroke is applied.
	pub fn on_key_down(&mut self, key: Key) -> KeyOutcome {
		match self.dispatch_key(key) {
			Ok(outcome) => outcome,
			Err(err) => {
				error!(key = %key, error = %err, "session.key_handler_failed");
				self.notifier.report_error(GENERIC_ERROR_MESSAGE, None);
				KeyOutcome::Continue
			}
		}
	}

	fn dispatch_key(&mut self, key: Key) -> Result<KeyOutcome, EditorError> {
		if self.history.should_suppress(&key, self.host.version_id()) {
			return Ok(KeyOutcome::Suppressed);
		}
		if key == self.config.keys.clear_suggestions {
			let disposed = self.providers.dispose_all();
			trace!(disposed, "completion.cleared");
			return Ok(KeyOutcome::Continue);
		}

		let cursor = self.host.cursor();
		let line = self
			.host
			.line_content(cursor.line)
			.ok_or_else(|| EditorError::KeyHandler(format!("cursor line {} is out of range", cursor.line)))?;

		if let Some(trigger) = self.expressions.trigger_for(&key, &line, cursor.column) {
			trace!(?trigger, "completion.expression.trigger");
			if let Some(context) = self.resolve_context() {
				let partial = self.expressions.partial_expression(trigger, &line);
				self.expressions.request(&context.path, partial);
			}
		} else if self.runtime_inputs.is_trigger(&key) {
			trace!(key = %key, "completion.runtime_input.trigger");
			if let Some(context) = self.resolve_context() {
				self.runtime_inputs.request(&context.path, &context.text);
			}
		}
		Ok(KeyOutcome::Continue)
	}

	/// Resolves the cursor context, repairing the cursor line if needed.
	///
	/// Falls back to the unrepaired text when the repair itself breaks the
	/// line (for example after `key: `). Reports the failure only when
	/// neither parses.
	fn resolve_context(&self) -> Option<ContextPath> {
		let mut repair_error = None;
		if let Some(context) = resolve_context_path(&self.host, |err| repair_error = Some(err), true) {
			return Some(context);
		}
		let repair_error = repair_error?;
		trace!(error = %repair_error, "context.repair_rejected");
		let context = resolve_context_path(&self.host, |_| {}, false);
		if context.is_none() {
			warn!(error = %repair_error, "context.unresolved");
			self.notifier.on_error(&repair_error.into());
		}
		context
	}

	/// Replaces the schema, re-creates the handle and revalidates.
	///
	/// No-op when `schema` equals the current one.
	pub fn set_schema(&mut self, schema: Option<Value>) {
		if schema == self.schema {
			trace!("session.schema_unchanged");
			return;
		}
		self.schema = schema;
		let HandleId(previous) = self.handle.id();
		self.handle = SessionHandle::new(HandleId(previous + 1), Arc::clone(&self.shared));
		debug!(handle = previous + 1, has_schema = self.schema.is_some(), "session.schema_changed");
		if let Some(binder) = self.binder.as_mut() {
			binder(self.handle.clone());
		}

		let text = self.shared.read().text.clone();
		let dispatch = self.diagnostics.validate_now(&text, self.schema.as_ref());
		self.after_dispatch(dispatch);
	}

	pub fn set_path_mappings(&mut self, mappings: PathMappings) {
		self.runtime_inputs.set_mappings(mappings);
	}

	pub fn set_ambient_params(&mut self, ambient: AmbientParams) {
		self.runtime_inputs.set_ambient(ambient);
	}

	/// Applies every finished background result. Returns how many were applied.
	pub fn poll_events(&mut self) -> usize {
		let mut applied = 0;
		while let Ok(event) = self.events.try_recv() {
			self.apply_event(event);
			applied += 1;
		}
		applied
	}

	/// Waits for the next background result and applies it.
	pub async fn next_event(&mut self) {
		if let Some(event) = self.events.recv().await {
			self.apply_event(event);
		}
	}

	/// Applies one background result.
	pub fn apply_event(&mut self, event: SessionEvent) {
		if !self.mounted {
			trace!("session.event_after_unmount");
			return;
		}
		match event {
			SessionEvent::Validation { generation, outcome } => match outcome {
				Ok(map) => {
					self.diagnostics.note_published(generation);
					debug!(generation, errors = map.len(), "diagnostics.publish");
					self.shared.write().diagnostics = Some(map);
				}
				Err(err) => {
					warn!(generation, error = %err, "diagnostics.validation_failed");
					self.notifier
						.report_error(&err.to_string(), Some(self.config.validation_error_toast()));
				}
			},
			SessionEvent::Suggestions {
				kind,
				request,
				trigger_characters,
				result,
			} => match result {
				Ok(suggestions) => {
					trace!(?kind, request, "completion.resolved");
					self.providers
						.register(kind, &trigger_characters, suggestions, &mut self.host);
				}
				Err(err) => {
					warn!(?kind, request, error = %err, "completion.supplier_failed");
					self.notifier.report_error(&err.to_string(), None);
				}
			},
		}
	}

	/// Disposes live providers and abandons background work.
	///
	/// Idempotent; also runs on drop.
	pub fn unmount(&mut self) {
		if !self.mounted {
			return;
		}
		self.mounted = false;
		let disposed = self.providers.dispose_all();
		self.diagnostics.cancel_pending();
		self.shutdown.cancel();
		debug!(disposed, "session.unmount");
	}

	pub fn handle(&self) -> SessionHandle {
		self.handle.clone()
	}

	/// Last published diagnostics.
	pub fn diagnostics(&self) -> Option<DiagnosticsMap> {
		self.shared.read().diagnostics.clone()
	}

	pub fn diagnostics_pipeline(&self) -> &DiagnosticsPipeline {
		&self.diagnostics
	}

	pub fn providers(&self) -> &ProviderRegistry {
		&self.providers
	}

	/// Structured view of the buffer; `None` while the text does not parse.
	pub fn structured(&self) -> Option<&Value> {
		self.structured.as_ref()
	}

	pub fn schema(&self) -> Option<&Value> {
		self.schema.as_ref()
	}

	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	pub fn is_mounted(&self) -> bool {
		self.mounted
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	/// Mutable host access. Call [`Self::on_text_changed`] after editing.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}
}

impl<H: HostEditor> Drop for EditorSession<H> {
	fn drop(&mut self) {
		self.unmount();
	}
}
