/// Modifier keys held during a keydown.
///
/// `cmd` is the platform meta key, so that `ctrl-z` and `cmd-z` can be
/// bound separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
	pub ctrl: bool,
	pub cmd: bool,
	pub alt: bool,
	pub shift: bool,
}

impl Modifiers {
	pub const NONE: Self = Self {
		ctrl: false,
		cmd: false,
		alt: false,
		shift: false,
	};

	pub fn ctrl(self) -> Self {
		Self { ctrl: true, ..self }
	}

	pub fn cmd(self) -> Self {
		Self { cmd: true, ..self }
	}

	pub fn alt(self) -> Self {
		Self { alt: true, ..self }
	}

	pub fn shift(self) -> Self {
		Self { shift: true, ..self }
	}

	/// True when the held modifiers still type a character: nothing, or
	/// Shift alone.
	pub fn is_printable(self) -> bool {
		!self.ctrl && !self.cmd && !self.alt
	}
}
