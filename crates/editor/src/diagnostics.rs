//! Schema validation of the text buffer.
//!
//! [`DiagnosticsPipeline`] turns text changes into validator requests:
//!
//! - typed changes go through [`DiagnosticsPipeline::schedule`], which waits
//!   for the debounce window and is cancelled by the next change
//! - wholesale replacements go through [`DiagnosticsPipeline::validate_now`]
//!
//! Requests are fire-and-forget. Once a request has left the debounce window
//! it is never cancelled, and its response is published whenever it arrives,
//! even if a newer response was published first. Each request carries a
//! generation so that such out-of-order publishes are visible in logs and
//! through [`DiagnosticsPipeline::last_published_generation`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stanza_primitives::Position;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::ServiceError;
use crate::events::SessionEvent;
use crate::host::SchemaValidator;


/// Schema URI used when the schema carries no `$id`.
pub const DEFAULT_SCHEMA_URI: &str = "inmemory://schema.json";

/// Validation messages keyed by zero-based line.
///
/// One message per line: when several diagnostics end on the same line, the
/// last one wins.
pub type DiagnosticsMap = BTreeMap<usize, String>;

/// Range of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRange {
	pub start: Position,
	pub end: Position,
}

/// A diagnostic reported by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiagnostic {
	pub range: DiagnosticRange,
	pub message: String,
}

impl SchemaDiagnostic {
	/// A diagnostic spanning `start_line..=end_line`.
	pub fn new(start_line: usize, end_line: usize, message: impl Into<String>) -> Self {
		Self {
			range: DiagnosticRange {
				start: Position::new(start_line, 0),
				end: Position::new(end_line, 0),
			},
			message: message.into(),
		}
	}
}

/// Validator configuration derived from the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSettings {
	pub validate: bool,
	pub completion: bool,
	pub hover: bool,
	pub format: bool,
	pub schemas: Vec<SchemaAssociation>,
}

/// Associates a schema with the files it applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAssociation {
	pub uri: String,
	pub file_match: Vec<String>,
	pub schema: Value,
}

impl LanguageSettings {
	/// Settings validating every document against `schema`.
	///
	/// Fails if `schema` is not a JSON object.
	pub fn for_schema(schema: &Value) -> Result<Self, ServiceError> {
		let Value::Object(object) = schema else {
			return Err(ServiceError::Request(format!(
				"schema must be a JSON object, got {}",
				json_type_name(schema)
			)));
		};
		let uri = object
			.get("$id")
			.and_then(Value::as_str)
			.unwrap_or(DEFAULT_SCHEMA_URI)
			.to_string();

		Ok(Self {
			validate: true,
			completion: true,
			hover: true,
			format: false,
			schemas: vec![SchemaAssociation {
				uri,
				file_match: vec!["*".to_string()],
				schema: schema.clone(),
			}],
		})
	}
}

fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// Builds the line map from validator output, keyed by each range's end line.
pub fn build_diagnostics_map(diagnostics: &[SchemaDiagnostic]) -> DiagnosticsMap {
	let mut map = DiagnosticsMap::new();
	for diag in diagnostics {
		map.insert(diag.range.end.line, diag.message.clone());
	}
	map
}

/// What a validation call did synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationDispatch {
	/// No schema and non-empty text; nothing to validate against.
	Skipped,
	/// Empty text, with or without a schema; the caller clears the
	/// diagnostics map.
	Cleared,
	/// A request was spawned.
	Requested { generation: u64 },
}

/// Debounced validation requests with generation tracking.
pub struct DiagnosticsPipeline {
	validator: Arc<dyn SchemaValidator>,
	debounce: Duration,
	generation: u64,
	published: u64,
	pending: Option<CancellationToken>,
	events: mpsc::UnboundedSender<SessionEvent>,
}

impl std::fmt::Debug for DiagnosticsPipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DiagnosticsPipeline")
			.field("debounce", &self.debounce)
			.field("generation", &self.generation)
			.field("published", &self.published)
			.finish()
	}
}

impl DiagnosticsPipeline {
	pub fn new(
		validator: Arc<dyn SchemaValidator>,
		debounce: Duration,
		events: mpsc::UnboundedSender<SessionEvent>,
	) -> Self {
		Self {
			validator,
			debounce,
			generation: 0,
			published: 0,
			pending: None,
			events,
		}
	}

	/// Validates immediately, superseding any debounced request.
	pub fn validate_now(
		&mut self,
		text: &str,
		schema: Option<&Value>,
	) -> Result<ValidationDispatch, ServiceError> {
		self.dispatch(text, schema, Duration::ZERO)
	}

	/// Validates after the debounce window unless another change arrives first.
	pub fn schedule(
		&mut self,
		text: &str,
		schema: Option<&Value>,
	) -> Result<ValidationDispatch, ServiceError> {
		self.dispatch(text, schema, self.debounce)
	}

	fn dispatch(
		&mut self,
		text: &str,
		schema: Option<&Value>,
		debounce: Duration,
	) -> Result<ValidationDispatch, ServiceError> {
		self.cancel_pending();
		if text.is_empty() {
			return Ok(ValidationDispatch::Cleared);
		}
		let Some(schema) = schema else {
			trace!("diagnostics.no_schema");
			return Ok(ValidationDispatch::Skipped);
		};
		let settings = LanguageSettings::for_schema(schema)?;
		let generation = self.spawn_request(text.to_string(), settings, debounce);
		Ok(ValidationDispatch::Requested { generation })
	}

	fn spawn_request(&mut self, text: String, settings: LanguageSettings, debounce: Duration) -> u64 {
		self.generation = self.generation.wrapping_add(1);
		let generation = self.generation;

		let cancel = (debounce > Duration::ZERO).then(|| {
			let token = CancellationToken::new();
			self.pending = Some(token.clone());
			token
		});
		let validator = Arc::clone(&self.validator);
		let events = self.events.clone();

		debug!(
			generation,
			debounce_ms = debounce.as_millis() as u64,
			bytes = text.len(),
			"diagnostics.request"
		);

		tokio::spawn(async move {
			if let Some(cancel) = cancel {
				tokio::select! {
					_ = cancel.cancelled() => {
						trace!(generation, "diagnostics.debounce_superseded");
						return;
					}
					_ = sleep(debounce) => {}
				}
			}

			let outcome = validator
				.validate(text, settings)
				.await
				.map(|diagnostics| build_diagnostics_map(&diagnostics));
			let _ = events.send(SessionEvent::Validation { generation, outcome });
		});

		generation
	}

	/// Cancels a request still waiting out its debounce window.
	pub fn cancel_pending(&mut self) {
		if let Some(token) = self.pending.take() {
			token.cancel();
		}
	}

	/// Records that the response of `generation` was published.
	///
	/// Returns true when it replaced a newer response.
	pub fn note_published(&mut self, generation: u64) -> bool {
		let stale = generation < self.published;
		if stale {
			warn!(generation, published = self.published, "diagnostics.stale_publish");
		}
		self.published = generation;
		stale
	}

	/// Generation of the most recently issued request.
	pub fn latest_requested_generation(&self) -> u64 {
		self.generation
	}

	/// Generation whose response is currently published.
	pub fn last_published_generation(&self) -> u64 {
		self.published
	}
}
