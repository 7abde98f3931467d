use std::collections::BTreeMap;

use tracing::debug;

use super::{ProviderKind, Suggestion};
use crate::host::{HostEditor, ProviderDisposer};

struct LiveProvider {
	generation: u64,
	disposer: Box<dyn ProviderDisposer>,
}

/// Completion providers currently registered with the host, one per kind.
///
/// Registering disposes the live provider of the same kind first, so the
/// host never holds two providers of one kind. Dropping the registry
/// disposes everything.
#[derive(Default)]
pub struct ProviderRegistry {
	live: BTreeMap<ProviderKind, LiveProvider>,
	generation: u64,
}

impl std::fmt::Debug for ProviderRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let live: BTreeMap<_, _> = self.live.iter().map(|(kind, p)| (*kind, p.generation)).collect();
		f.debug_struct("ProviderRegistry")
			.field("live", &live)
			.field("generation", &self.generation)
			.finish()
	}
}

impl ProviderRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `suggestions` with the host, replacing any live provider of
	/// `kind`. Returns the registration's generation.
	pub fn register<H>(
		&mut self,
		kind: ProviderKind,
		trigger_characters: &[char],
		suggestions: Vec<Suggestion>,
		host: &mut H,
	) -> u64
	where
		H: HostEditor + ?Sized,
	{
		self.dispose(kind);
		self.generation = self.generation.wrapping_add(1);
		let generation = self.generation;
		let count = suggestions.len();
		let disposer = host.register_completion_provider(trigger_characters, suggestions);
		self.live.insert(kind, LiveProvider { generation, disposer });
		debug!(?kind, generation, count, "completion.provider.register");
		generation
	}

	/// Disposes the live provider of `kind`. Returns false if none was live.
	pub fn dispose(&mut self, kind: ProviderKind) -> bool {
		let Some(provider) = self.live.remove(&kind) else {
			return false;
		};
		debug!(?kind, generation = provider.generation, "completion.provider.dispose");
		provider.disposer.dispose();
		true
	}

	/// Disposes every live provider. Returns how many were disposed.
	pub fn dispose_all(&mut self) -> usize {
		let kinds: Vec<_> = self.live.keys().copied().collect();
		kinds.into_iter().filter(|kind| self.dispose(*kind)).count()
	}

	pub fn is_active(&self, kind: ProviderKind) -> bool {
		self.live.contains_key(&kind)
	}

	/// Generation of the live provider of `kind`.
	pub fn generation(&self, kind: ProviderKind) -> Option<u64> {
		self.live.get(&kind).map(|p| p.generation)
	}
}

impl Drop for ProviderRegistry {
	fn drop(&mut self) {
		self.dispose_all();
	}
}
