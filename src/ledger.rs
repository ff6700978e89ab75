use std::cell::Cell;

use crate::tick::{Tick, TickCounter};

/// How a settling invocation is allowed to touch shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
	/// The invocation is the latest one and nobody cancelled it.
	Apply,
	/// A newer invocation started after this one.
	Stale,
	/// `cancel()` ran while this invocation was the latest one.
	Cancelled,
}

/// Tick clock plus the cancellation mark.
///
/// The mark stores the tick that was current when `cancel()` last ran, so a
/// cancellation is armed exactly for the invocation that was in charge at
/// that moment and for nobody started afterwards.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
	ticks: TickCounter,
	cancelled_at: Cell<Option<Tick>>,
}

impl Ledger {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn start(&self) -> Tick {
		self.ticks.next()
	}

	pub(crate) fn current(&self) -> Tick {
		self.ticks.current()
	}

	pub(crate) fn is_current(&self, tick: Tick) -> bool {
		self.ticks.is_current(tick)
	}

	pub(crate) fn cancel(&self) -> Tick {
		let current = self.ticks.current();
		self.cancelled_at.set(Some(current));
		current
	}

	/// Verdict for a successful outcome. Staleness wins over cancellation.
	pub(crate) fn on_success(&self, tick: Tick) -> Verdict {
		if !self.ticks.is_current(tick) {
			Verdict::Stale
		} else if self.cancelled_at.get() == Some(tick) {
			Verdict::Cancelled
		} else {
			Verdict::Apply
		}
	}

	/// Verdict for a failed outcome. Failures are gated on staleness only.
	pub(crate) fn on_failure(&self, tick: Tick) -> Verdict {
		if self.ticks.is_current(tick) {
			Verdict::Apply
		} else {
			Verdict::Stale
		}
	}
}
