use std::cell::Cell;
use std::fmt;

/// Generation stamp of a single invocation.
///
/// Ticks are handed out in start order, so comparing two ticks tells which
/// invocation started later, independent of which one finished first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Tick(u64);

impl fmt::Display for Tick {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Monotonic tick clock owned by one `Async`.
#[derive(Debug, Default)]
pub(crate) struct TickCounter {
	current: Cell<u64>,
}

impl TickCounter {
	/// Creates a counter whose first `next` returns `Tick(1)`.
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Advances the clock and returns the new current tick.
	pub(crate) fn next(&self) -> Tick {
		let next = self.current.get() + 1;
		self.current.set(next);
		Tick(next)
	}

	pub(crate) fn current(&self) -> Tick {
		Tick(self.current.get())
	}

	pub(crate) fn is_current(&self, tick: Tick) -> bool {
		self.current.get() == tick.0
	}
}
