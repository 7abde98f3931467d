/// Opaque document version marker reported by the host editor.
///
/// Only compared for equality, or against [`VersionId::next`] to detect a
/// document that is exactly one edit ahead of a captured baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionId(pub u64);

impl VersionId {
	/// The version following this one.
	pub const fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}
}
