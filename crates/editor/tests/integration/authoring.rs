use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use stanza_editor::{DiagnosticsMap, EditorConfig, Key, KeyOutcome};

use crate::common::{Harness, Notice};

fn schema() -> serde_json::Value {
	json!({ "type": "object", "required": ["name", "version"] })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn structured_input_round_trips_through_the_buffer() {
	let mut h = Harness::mount("", EditorConfig::default(), None);
	h.session.set_schema(Some(schema()));

	h.session.set_structured_input(json!({
		"name": "build",
		"version": 2,
		"notes": "",
		"stages": [{ "step": null }],
		"tags": []
	}));
	h.settle(1).await;

	assert_eq!(h.text(), "name: build\nversion: 2\nstages:\n- step:\n");
	assert_eq!(h.session.handle().latest_text(), h.text());
	assert_eq!(h.session.diagnostics(), Some(DiagnosticsMap::new()));
	assert_eq!(
		h.session.structured(),
		Some(&json!({ "name": "build", "version": 2, "notes": "", "stages": [{ "step": null }], "tags": [] }))
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn typed_edits_are_validated_after_the_configured_debounce() {
	let config = EditorConfig::from_toml_str("validation-debounce-ms = 50").unwrap();
	let mut h = Harness::mount("", config, None);
	h.session.set_schema(Some(schema()));

	h.type_text("name: build\n");
	h.settle(10).await;
	h.type_text("stages: []\n");
	h.settle(10).await;
	assert!(h.validations.lock().is_empty());

	h.settle(50).await;
	assert_eq!(*h.validations.lock(), vec!["name: build\nstages: []\n".to_string()]);
	assert_eq!(
		h.session.diagnostics(),
		Some(DiagnosticsMap::from([(1, "Missing property \"version\"".to_string())]))
	);

	h.type_text("version: 1\n");
	h.settle(60).await;
	assert_eq!(h.session.diagnostics(), Some(DiagnosticsMap::new()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn clearing_the_input_clears_everything() {
	let mut h = Harness::mount("", EditorConfig::default(), None);
	h.session.set_schema(Some(schema()));
	h.session.set_structured_input(json!({ "name": "build" }));
	h.settle(1).await;
	assert!(h.session.diagnostics().is_some());

	h.session.set_structured_input(json!({}));

	assert_eq!(h.text(), "");
	assert_eq!(h.session.diagnostics(), None);
	assert_eq!(
		h.notices.all(),
		vec![Notice::Change(true), Notice::Change(false)]
	);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn undo_cannot_reach_past_the_supplied_document() {
	let mut h = Harness::mount("", EditorConfig::default(), None);
	h.session.set_structured_input(json!({ "name": "build" }));
	h.session.host_mut().set_cursor_to_line_end(0);

	h.type_text("s");
	assert_eq!(h.session.on_key_down(Key::ctrl('z')), KeyOutcome::Suppressed);

	h.type_text("s");
	assert_eq!(h.session.on_key_down(Key::ctrl('z')), KeyOutcome::Continue);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn configured_undo_chords_replace_the_defaults() {
	let config = EditorConfig::from_toml_str("[keys]\nundo = [\"alt-u\"]\n").unwrap();
	let mut h = Harness::mount("", config, None);
	h.session.set_text_input("name: build\n");
	h.type_text("x");

	assert_eq!(h.session.on_key_down(Key::ctrl('z')), KeyOutcome::Continue);
	assert_eq!(h.session.on_key_down(Key::char('u').with_alt()), KeyOutcome::Suppressed);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn validation_errors_toast_for_the_configured_duration() {
	let config = EditorConfig::from_toml_str("validation-error-toast-ms = 8000").unwrap();
	let mut h = Harness::mount("name: build\n", config, None);

	h.session.set_schema(Some(json!("not a schema")));
	h.settle(1).await;

	assert_eq!(h.notices.all(), vec![Notice::Toast("Something went wrong".into(), None)]);
	assert_eq!(h.session.config().validation_error_toast(), Duration::from_secs(8));
}
