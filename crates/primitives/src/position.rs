/// Cursor position in zero-based line and character coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
	/// Zero-based line index.
	pub line: usize,
	/// Zero-based character offset in the line.
	pub column: usize,
}

impl Position {
	/// Creates a new position.
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}
