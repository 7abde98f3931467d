use crate::completion::{ProviderKind, Suggestion};
use crate::diagnostics::DiagnosticsMap;
use crate::error::ServiceError;

/// Result of a background task, applied by the owning session.
#[derive(Debug)]
pub enum SessionEvent {
	/// A validation request finished.
	Validation {
		/// Request generation, in issue order.
		generation: u64,
		outcome: Result<DiagnosticsMap, ServiceError>,
	},
	/// A suggestion supplier resolved.
	Suggestions {
		kind: ProviderKind,
		/// Request sequence number within `kind`, in issue order.
		request: u64,
		trigger_characters: Vec<char>,
		result: Result<Vec<Suggestion>, ServiceError>,
	},
}
