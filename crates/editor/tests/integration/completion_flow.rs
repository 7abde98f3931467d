use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use stanza_editor::{
	AmbientParams, EditorConfig, ExpressionSupplier, Key, KeyCode, PathMappings, ProviderKind, Suggestion,
	SuggestionKind, TreePath,
};

use crate::common::Harness;

fn expressions(seen: Arc<Mutex<Vec<String>>>) -> Arc<dyn ExpressionSupplier> {
	Arc::new(move |path: &TreePath, partial: &str| {
		seen.lock().push(format!("{path}|{partial}"));
		let suggestions = vec![
			Suggestion::new("pipeline").with_kind(SuggestionKind::Variable),
			Suggestion::new("stage").with_detail("current stage"),
		];
		Some(Box::pin(async move { Ok(suggestions) }) as stanza_editor::SuggestionFuture)
	})
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn typing_an_expression_offers_suggestions() {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let mut h = Harness::mount("", EditorConfig::default(), Some(expressions(Arc::clone(&seen))));
	h.session.set_structured_input(json!({ "stage": { "name": "deploy" } }));
	h.session.host_mut().set_cursor_to_line_end(1);

	h.type_text(" <");
	h.session.on_key_down(Key::char('+').with_shift());
	h.type_text("+");
	h.settle(1).await;

	assert_eq!(*seen.lock(), vec!["stage.name|".to_string()]);
	let live = h.session.host().live_providers();
	assert_eq!(live.len(), 1);
	assert_eq!(live[0].trigger_characters, vec!['+', '.']);
	assert_eq!(live[0].suggestions[1].detail.as_deref(), Some("current stage"));

	h.type_text("pipeline");
	h.session.on_key_down(Key::char('.'));
	h.type_text(".");
	h.settle(1).await;

	assert_eq!(seen.lock().len(), 2);
	assert_eq!(seen.lock()[1], "stage.name|deploy <+pipeline");
	assert_eq!(h.session.host().live_providers().len(), 1);
	assert_eq!(h.session.host().disposed_count(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn runtime_inputs_follow_path_mappings_and_ambient_params() {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let mut mappings = PathMappings::new();
	let record = Arc::clone(&seen);
	mappings
		.insert(r"^stages\.\d+\.env$", move |path: &TreePath, _: &str, ambient: &AmbientParams| {
			record.lock().push((path.to_string(), ambient.get("account").cloned()));
			let suggestions = vec![Suggestion::new("dev"), Suggestion::new("prod")];
			Box::pin(async move { Ok(suggestions) }) as stanza_editor::SuggestionFuture
		})
		.unwrap();

	let mut h = Harness::mount("stages:\n- env", EditorConfig::default(), None);
	h.session.set_path_mappings(mappings);
	let mut ambient = AmbientParams::new();
	ambient.insert("account".into(), json!("acme"));
	h.session.set_ambient_params(ambient);
	h.session.host_mut().set_cursor_to_line_end(1);

	h.session.on_key_down(Key::new(KeyCode::Space).with_ctrl());
	h.settle(1).await;

	assert_eq!(*seen.lock(), vec![("stages.0.env".to_string(), Some(json!("acme")))]);
	assert!(h.session.providers().is_active(ProviderKind::RuntimeInput));
	assert_eq!(h.session.host().live_providers()[0].trigger_characters, vec![' ']);

	h.session.unmount();
	assert!(h.session.host().live_providers().is_empty());
}
