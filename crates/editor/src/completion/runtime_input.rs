use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use stanza_primitives::Key;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{ProviderKind, SuggestionRequests};
use crate::context::TreePath;
use crate::events::SessionEvent;
use crate::host::{AmbientParams, PathMappingCallback};

/// Trigger character of runtime-input providers.
pub const RUNTIME_INPUT_TRIGGER: char = ' ';

#[derive(Clone)]
struct PathMapping {
	pattern: Regex,
	callback: Arc<dyn PathMappingCallback>,
}

/// Path patterns mapped to runtime-input suggestion callbacks.
///
/// Patterns are regular expressions matched against the dot-joined tree path
/// (`pipeline.stages.0.name`) and are tried in insertion order.
#[derive(Clone, Default)]
pub struct PathMappings {
	entries: IndexMap<String, PathMapping>,
}

impl std::fmt::Debug for PathMappings {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.entries.keys()).finish()
	}
}

impl PathMappings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Maps `pattern` to `callback`, replacing an existing entry for the same
	/// pattern in place.
	pub fn insert<C>(&mut self, pattern: &str, callback: C) -> Result<(), regex::Error>
	where
		C: PathMappingCallback + 'static,
	{
		let compiled = Regex::new(pattern)?;
		self.entries.insert(
			pattern.to_string(),
			PathMapping {
				pattern: compiled,
				callback: Arc::new(callback),
			},
		);
		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Patterns in insertion order.
	pub fn patterns(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	fn matching<'a>(&'a self, path: &'a str) -> impl Iterator<Item = (&'a str, &'a PathMapping)> {
		self.entries
			.iter()
			.filter(move |(_, mapping)| mapping.pattern.is_match(path))
			.map(|(pattern, mapping)| (pattern.as_str(), mapping))
	}
}

/// Runtime-input completion for one session.
pub struct RuntimeInputCompletion {
	triggers: Vec<Key>,
	mappings: PathMappings,
	ambient: AmbientParams,
	requests: SuggestionRequests,
}

impl std::fmt::Debug for RuntimeInputCompletion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RuntimeInputCompletion")
			.field("triggers", &self.triggers)
			.field("mappings", &self.mappings)
			.field("requests", &self.requests.issued())
			.finish()
	}
}

impl RuntimeInputCompletion {
	pub fn new(
		triggers: Vec<Key>,
		events: mpsc::UnboundedSender<SessionEvent>,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			triggers,
			mappings: PathMappings::default(),
			ambient: AmbientParams::new(),
			requests: SuggestionRequests::new(ProviderKind::RuntimeInput, events, shutdown),
		}
	}

	/// True for a trigger chord while at least one path mapping exists.
	pub fn is_trigger(&self, key: &Key) -> bool {
		!self.mappings.is_empty() && self.triggers.contains(key)
	}

	pub fn set_mappings(&mut self, mappings: PathMappings) {
		self.mappings = mappings;
	}

	pub fn mappings(&self) -> &PathMappings {
		&self.mappings
	}

	pub fn set_ambient(&mut self, ambient: AmbientParams) {
		self.ambient = ambient;
	}

	/// Invokes every callback whose pattern matches `path`.
	///
	/// Returns the spawned request numbers in pattern order.
	pub fn request(&mut self, path: &TreePath, text: &str) -> Vec<u64> {
		let joined = path.to_string();
		let futures: Vec<_> = self
			.mappings
			.matching(&joined)
			.map(|(pattern, mapping)| {
				trace!(pattern, path = %joined, "completion.runtime_input.match");
				mapping.callback.suggest(path, text, &self.ambient)
			})
			.collect();
		if futures.is_empty() {
			debug!(path = %joined, "completion.runtime_input.no_match");
		}

		futures
			.into_iter()
			.map(|future| self.requests.spawn(future, vec![RUNTIME_INPUT_TRIGGER]))
			.collect()
	}

	/// Number of requests spawned so far.
	pub fn requests_issued(&self) -> u64 {
		self.requests.issued()
	}
}
