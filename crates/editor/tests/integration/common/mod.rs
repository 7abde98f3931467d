//! Common utilities for editor integration tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use stanza_editor::host::ValidationFuture;
use stanza_editor::{
	BufferAccess, EditorConfig, EditorError, EditorSession, ExpressionSupplier, LanguageSettings, MemoryHost,
	SchemaDiagnostic, SessionNotifier, SessionServices,
};

/// Something the session told the embedding page.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
	Toast(String, Option<Duration>),
	Error(String),
	Change(bool),
}

/// Notifier that records every call.
#[derive(Clone, Default)]
pub struct Notices(Arc<Mutex<Vec<Notice>>>);

impl Notices {
	pub fn all(&self) -> Vec<Notice> {
		self.0.lock().clone()
	}
}

impl SessionNotifier for Notices {
	fn report_error(&self, message: &str, duration: Option<Duration>) {
		self.0.lock().push(Notice::Toast(message.to_string(), duration));
	}

	fn on_error(&self, error: &EditorError) {
		self.0.lock().push(Notice::Error(error.to_string()));
	}

	fn on_change(&self, non_empty: bool) {
		self.0.lock().push(Notice::Change(non_empty));
	}
}

/// Validator that reports every top-level `required` key missing from the
/// text, spanning the whole document.
pub fn required_keys_validator(calls: Arc<Mutex<Vec<String>>>) -> impl Fn(String, LanguageSettings) -> ValidationFuture {
	move |text: String, settings: LanguageSettings| {
		calls.lock().push(text.clone());
		let required: Vec<String> = settings.schemas[0]
			.schema
			.get("required")
			.and_then(Value::as_array)
			.map(|keys| keys.iter().filter_map(Value::as_str).map(str::to_string).collect())
			.unwrap_or_default();
		let last_line = text.lines().count().saturating_sub(1);
		let diagnostics: Vec<_> = required
			.iter()
			.filter(|key| !text.lines().any(|line| line.starts_with(&format!("{key}:"))))
			.map(|key| SchemaDiagnostic::new(0, last_line, format!("Missing property \"{key}\"")))
			.collect();
		Box::pin(async move { Ok(diagnostics) })
	}
}

/// A mounted session plus everything it reported.
pub struct Harness {
	pub session: EditorSession<MemoryHost>,
	pub notices: Notices,
	pub validations: Arc<Mutex<Vec<String>>>,
}

impl Harness {
	pub fn mount(text: &str, config: EditorConfig, expressions: Option<Arc<dyn ExpressionSupplier>>) -> Self {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
		let validations = Arc::new(Mutex::new(Vec::new()));
		let notices = Notices::default();
		let services = SessionServices {
			validator: Arc::new(required_keys_validator(Arc::clone(&validations))),
			expressions,
			notifier: Box::new(notices.clone()),
		};
		Self {
			session: EditorSession::mount(MemoryHost::new(text), config, services),
			notices,
			validations,
		}
	}

	/// Types `text` at the cursor and notifies the session.
	pub fn type_text(&mut self, text: &str) {
		self.session.host_mut().type_text(text);
		self.session.on_text_changed();
	}

	/// Advances time and applies finished background work.
	pub async fn settle(&mut self, ms: u64) {
		tokio::time::sleep(Duration::from_millis(ms)).await;
		self.session.poll_events();
	}

	pub fn text(&self) -> String {
		self.session.host().text()
	}
}
