#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Core types shared between the editing core and the host editor: key
//! events, cursor positions, document version markers and future aliases.

/// Async future aliases.
pub mod future;
/// Key event types and key chord parsing.
pub mod key;
/// Cursor positions in line/column coordinates.
pub mod position;
/// Opaque document version markers.
pub mod version;

pub use future::BoxFutureStatic;
pub use key::{Key, KeyCode, KeyParseError, Modifiers};
pub use position::Position;
pub use version::VersionId;
