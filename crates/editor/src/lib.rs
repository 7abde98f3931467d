#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Structured YAML editing core.
//!
//! This crate keeps a YAML text buffer and its structured (JSON-like) value
//! in sync, validates the buffer against a schema, and drives the
//! context-sensitive completion providers of the authoring surface.
//!
//! # Main Types
//!
//! - [`EditorSession`] - owns one editing surface: text, diagnostics, providers
//! - [`SessionHandle`] - read-only view of the latest text and diagnostics
//! - [`HostEditor`] - the seam to the host code editor
//!
//! # Architecture
//!
//! ```text
//! keydown ──▶ HistoryGuard ──▶ context::resolve_context_path ──▶ completion
//!                  │                                              │
//!                  ▼                                              ▼
//!            (suppress undo)                          tokio task ──▶ SessionEvent
//! text change ──▶ convert ──▶ DiagnosticsPipeline (debounced) ───▶ SessionEvent
//!                                                                 │
//!                               EditorSession::poll_events ◀──────┘
//! ```
//!
//! Asynchronous work (schema validation, suggestion suppliers) runs on tokio
//! tasks. Results return to the session over a channel and are applied on
//! the owning thread, so session state is never mutated concurrently.

/// Completion providers: expression and runtime-input suggestions.
pub mod completion;
/// Editor configuration loaded from TOML.
pub mod config;
/// Cursor context resolution and placeholder repair.
pub mod context;
/// YAML text ⇄ structured value conversion.
pub mod convert;
/// Debounced schema validation.
pub mod diagnostics;
/// Error types.
pub mod error;
/// Messages from background tasks back to the session.
pub mod events;
/// Undo history guard.
pub mod history;
/// Host editor and external service seams.
pub mod host;
/// Editing session and its handle.
pub mod session;

pub use completion::{
	ExpressionCompletion, PathMappings, ProviderKind, ProviderRegistry, RuntimeInputCompletion, Suggestion,
	SuggestionKind,
};
pub use config::EditorConfig;
pub use context::{ContextPath, PathSegment, TreePath};
pub use convert::{ConvertOptions, SanitizePolicy};
pub use diagnostics::{DiagnosticsMap, DiagnosticsPipeline, LanguageSettings, SchemaDiagnostic, ValidationDispatch};
pub use error::{ConfigError, ContextError, ConvertError, EditorError, ServiceError};
pub use events::SessionEvent;
pub use history::HistoryGuard;
#[cfg(any(test, feature = "test-support"))]
pub use host::MemoryHost;
pub use host::{
	AmbientParams, BufferAccess, ExpressionSupplier, HostEditor, PathMappingCallback, ProviderDisposer,
	SchemaValidator, SessionNotifier, SuggestionFuture, TracingNotifier, ValidationFuture,
};
pub use session::{EditorSession, HandleId, KeyOutcome, SessionHandle, SessionServices};
pub use stanza_primitives::{Key, KeyCode, Modifiers, Position, VersionId};
