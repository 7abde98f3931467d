//! Error types for the editing core.
//!
//! Nothing here is fatal to a session: each public entry point of
//! [`EditorSession`](crate::EditorSession) catches these and degrades a single
//! interaction (one keystroke, one validation cycle, one input update).

use std::path::PathBuf;

use thiserror::Error;

/// Message shown when an interaction fails for a reason the user cannot act on.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Conversion between YAML text and the structured value failed.
#[derive(Debug, Error)]
pub enum ConvertError {
	/// The structured value could not be rendered as YAML.
	#[error("failed to serialize document: {0}")]
	Serialize(#[source] serde_yaml::Error),
	/// The text is not a valid YAML document.
	#[error("failed to parse document: {0}")]
	Parse(#[source] serde_yaml::Error),
}

/// The cursor context could not be derived, even after placeholder repair.
#[derive(Debug, Error)]
pub enum ContextError {
	/// The (possibly repaired) buffer does not parse.
	#[error("cannot resolve context for '{property}': {source}")]
	Parse {
		/// Property name on the cursor line.
		property: String,
		/// The underlying parse failure.
		#[source]
		source: ConvertError,
	},
}

/// An external service (validator, suggestion supplier) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
	/// The service rejected the request.
	#[error("{0}")]
	Rejected(String),
	/// The request could not be built.
	#[error("failed to build request: {0}")]
	Request(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an invalid value.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// Top-level error reported to the embedder.
#[derive(Debug, Error)]
pub enum EditorError {
	#[error(transparent)]
	Convert(#[from] ConvertError),
	#[error(transparent)]
	Context(#[from] ContextError),
	#[error(transparent)]
	Service(#[from] ServiceError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A path-mapping pattern is not a valid regular expression.
	#[error("invalid path pattern: {0}")]
	Pattern(#[from] regex::Error),
	/// Keystroke dispatch failed.
	#[error("key handler failed: {0}")]
	KeyHandler(String),
}

/// Result type for editing-core operations.
pub type Result<T, E = EditorError> = std::result::Result<T, E>;
