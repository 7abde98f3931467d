use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use stanza_primitives::{Key, KeyCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::ExpressionConfig;
use crate::context::TreePath;
use crate::error::ServiceError;
use crate::host::{AmbientParams, ExpressionSupplier, MemoryHost};

fn suggestions(labels: &[&str]) -> Vec<Suggestion> {
	labels.iter().map(|l| Suggestion::new(*l)).collect()
}

fn ready(result: Result<Vec<Suggestion>, ServiceError>) -> SuggestionFuture {
	Box::pin(async move { result })
}

#[test]
fn suggestion_serializes_camel_case() {
	let value = serde_json::to_value(Suggestion::new("pipeline").with_kind(SuggestionKind::Field)).unwrap();
	assert_eq!(
		value,
		serde_json::json!({ "label": "pipeline", "insertText": "pipeline", "kind": "field" })
	);
}

#[test]
fn registering_disposes_previous_provider_of_same_kind() {
	let mut host = MemoryHost::new("a: 1\n");
	let mut registry = ProviderRegistry::new();

	let first = registry.register(ProviderKind::Expression, &['+'], suggestions(&["x"]), &mut host);
	let second = registry.register(ProviderKind::Expression, &['+'], suggestions(&["y"]), &mut host);

	assert!(second > first);
	assert_eq!(registry.generation(ProviderKind::Expression), Some(second));
	let live = host.live_providers();
	assert_eq!(live.len(), 1);
	assert_eq!(live[0].suggestions, suggestions(&["y"]));
	assert_eq!(host.disposed_count(), 1);
}

#[test]
fn kinds_are_independent() {
	let mut host = MemoryHost::new("a: 1\n");
	let mut registry = ProviderRegistry::new();

	registry.register(ProviderKind::Expression, &['+', '.'], suggestions(&["x"]), &mut host);
	registry.register(ProviderKind::RuntimeInput, &[' '], suggestions(&["dev"]), &mut host);

	assert!(registry.is_active(ProviderKind::Expression));
	assert!(registry.is_active(ProviderKind::RuntimeInput));
	assert_eq!(host.live_providers().len(), 2);

	assert!(registry.dispose(ProviderKind::Expression));
	assert!(!registry.dispose(ProviderKind::Expression));
	assert_eq!(host.live_providers().len(), 1);
	assert_eq!(host.live_providers()[0].trigger_characters, vec![' ']);
}

#[test]
fn dropping_registry_disposes_everything() {
	let mut host = MemoryHost::new("a: 1\n");
	{
		let mut registry = ProviderRegistry::new();
		registry.register(ProviderKind::Expression, &['+'], suggestions(&["x"]), &mut host);
		registry.register(ProviderKind::RuntimeInput, &[' '], suggestions(&["y"]), &mut host);
	}
	assert!(host.live_providers().is_empty());
	assert_eq!(host.disposed_count(), 2);
}

fn expression_completion(
	supplier: Option<Arc<dyn ExpressionSupplier>>,
) -> (ExpressionCompletion, mpsc::UnboundedReceiver<SessionEvent>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let completion = ExpressionCompletion::new(
		ExpressionConfig::default(),
		Key::char('+').with_shift(),
		supplier,
		tx,
		CancellationToken::new(),
	);
	(completion, rx)
}

fn fixed_supplier(labels: &'static [&'static str]) -> Arc<dyn ExpressionSupplier> {
	Arc::new(move |_: &TreePath, _: &str| Some(ready(Ok(suggestions(labels)))))
}

#[test]
fn marker_trigger_requires_marker_before_cursor() {
	let (completion, _rx) = expression_completion(Some(fixed_supplier(&["pipeline"])));
	let plus = Key::char('+').with_shift();

	assert_eq!(completion.trigger_for(&plus, "name: <", 7), Some(ExpressionTrigger::Marker));
	assert_eq!(completion.trigger_for(&plus, "name: x", 7), None);
	assert_eq!(completion.trigger_for(&plus, "name: <x", 8), None);
	assert_eq!(completion.trigger_for(&plus, "", 0), None);
	assert_eq!(completion.trigger_for(&Key::char('+'), "name: <", 7), None);
}

#[test]
fn separator_trigger_requires_open_expression() {
	let (completion, _rx) = expression_completion(Some(fixed_supplier(&["stage"])));
	let dot = Key::char('.');

	assert_eq!(
		completion.trigger_for(&dot, "name: <+pipeline", 16),
		Some(ExpressionTrigger::Separator)
	);
	assert_eq!(completion.trigger_for(&dot, "name: <+pipeline.x> v1", 22), None);
	assert_eq!(completion.trigger_for(&dot, "version: 1", 10), None);
	assert_eq!(completion.trigger_for(&Key::ctrl('.'), "name: <+pipeline", 16), None);
}

#[test]
fn no_supplier_never_triggers() {
	let (completion, _rx) = expression_completion(None);
	assert_eq!(completion.trigger_for(&Key::char('+').with_shift(), "a: <", 4), None);
}

#[test]
fn partial_expression_depends_on_trigger() {
	let (completion, _rx) = expression_completion(Some(fixed_supplier(&[])));
	let line = "name: <+pipeline.stages";
	assert_eq!(completion.partial_expression(ExpressionTrigger::Marker, line), "");
	assert_eq!(completion.partial_expression(ExpressionTrigger::Separator, line), "<+pipeline.stages");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn expression_request_delivers_suggestions_over_trigger_characters() {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let record = Arc::clone(&seen);
	let supplier: Arc<dyn ExpressionSupplier> = Arc::new(move |path: &TreePath, partial: &str| {
		record.lock().push((path.to_string(), partial.to_string()));
		Some(ready(Ok(suggestions(&["pipeline"]))))
	});
	let (mut completion, mut rx) = expression_completion(Some(supplier));

	let request = completion.request(&TreePath::from_keys(["spec", "name"]), "").unwrap();
	assert_eq!(request, 1);
	tokio::task::yield_now().await;

	let SessionEvent::Suggestions { kind, request, trigger_characters, result } = rx.recv().await.unwrap() else {
		panic!("expected suggestions");
	};
	assert_eq!(kind, ProviderKind::Expression);
	assert_eq!(request, 1);
	assert_eq!(trigger_characters, vec!['+', '.']);
	assert_eq!(result.unwrap(), suggestions(&["pipeline"]));
	assert_eq!(*seen.lock(), vec![("spec.name".to_string(), String::new())]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn supplier_returning_none_spawns_nothing() {
	let supplier: Arc<dyn ExpressionSupplier> = Arc::new(|_: &TreePath, _: &str| None);
	let (mut completion, mut rx) = expression_completion(Some(supplier));

	assert_eq!(completion.request(&TreePath::new(), ""), None);
	assert_eq!(completion.requests_issued(), 0);
	tokio::task::yield_now().await;
	assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn shutdown_abandons_pending_requests() {
	let supplier: Arc<dyn ExpressionSupplier> = Arc::new(|_: &TreePath, _: &str| {
		Some(Box::pin(async {
			tokio::time::sleep(std::time::Duration::from_secs(1)).await;
			Ok(suggestions(&["late"]))
		}) as SuggestionFuture)
	});
	let (tx, mut rx) = mpsc::unbounded_channel();
	let shutdown = CancellationToken::new();
	let mut completion = ExpressionCompletion::new(
		ExpressionConfig::default(),
		Key::char('+').with_shift(),
		Some(supplier),
		tx,
		shutdown.clone(),
	);

	completion.request(&TreePath::new(), "");
	shutdown.cancel();
	tokio::time::sleep(std::time::Duration::from_secs(2)).await;
	assert!(rx.try_recv().is_err());
}

#[test]
fn invalid_pattern_is_rejected() {
	let mut mappings = PathMappings::new();
	let callback = |_: &TreePath, _: &str, _: &AmbientParams| ready(Ok(Vec::new()));
	assert!(mappings.insert("stages.(", callback).is_err());
	assert!(mappings.is_empty());
}

#[test]
fn runtime_input_requires_mappings_and_chord() {
	let (tx, _rx) = mpsc::unbounded_channel();
	let chord = Key::new(KeyCode::Space).with_ctrl();
	let mut completion = RuntimeInputCompletion::new(vec![chord], tx, CancellationToken::new());

	assert!(!completion.is_trigger(&chord));

	let mut mappings = PathMappings::new();
	mappings
		.insert("^env$", |_: &TreePath, _: &str, _: &AmbientParams| ready(Ok(Vec::new())))
		.unwrap();
	completion.set_mappings(mappings);

	assert!(completion.is_trigger(&chord));
	assert!(!completion.is_trigger(&Key::char(' ')));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn every_matching_pattern_is_invoked_in_order() {
	let calls = Arc::new(Mutex::new(Vec::new()));
	let mut mappings = PathMappings::new();
	for (pattern, label) in [("stages\\.\\d+\\.env$", "by-stage"), ("env$", "any"), ("^service$", "never")] {
		let calls = Arc::clone(&calls);
		mappings
			.insert(pattern, move |path: &TreePath, text: &str, ambient: &AmbientParams| {
				calls.lock().push((label, path.to_string(), text.to_string(), ambient.clone()));
				ready(Ok(suggestions(&[label])))
			})
			.unwrap();
	}

	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut completion = RuntimeInputCompletion::new(Vec::new(), tx, CancellationToken::new());
	completion.set_mappings(mappings);
	let mut ambient = AmbientParams::new();
	ambient.insert("account".into(), "acme".into());
	completion.set_ambient(ambient.clone());

	let mut path = TreePath::from_keys(["stages"]);
	path.push(crate::context::PathSegment::Index(0));
	path.push(crate::context::PathSegment::Key("env".into()));
	let requests = completion.request(&path, "stages:\n- env: placeholder\n");
	assert_eq!(requests, vec![1, 2]);

	let labels: Vec<_> = calls.lock().iter().map(|c| c.0).collect();
	assert_eq!(labels, vec!["by-stage", "any"]);
	assert_eq!(calls.lock()[0].1, "stages.0.env");
	assert_eq!(calls.lock()[0].3, ambient);

	for expected in [1, 2] {
		let SessionEvent::Suggestions { request, trigger_characters, .. } = rx.recv().await.unwrap() else {
			panic!("expected suggestions");
		};
		assert_eq!(request, expected);
		assert_eq!(trigger_characters, vec![RUNTIME_INPUT_TRIGGER]);
	}
}
