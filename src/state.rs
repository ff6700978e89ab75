/// Snapshot of an async slot, as seen by listeners and getters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsyncState<T, E> {
	/// Last successfully applied result. Survives failures and cancellation.
	pub result: Option<T>,
	pub error: Option<E>,
	pub is_running: bool,
	pub is_cancelled: bool,
}

impl<T, E> Default for AsyncState<T, E> {
	fn default() -> Self {
		AsyncState {
			result: None,
			error: None,
			is_running: false,
			is_cancelled: false,
		}
	}
}

impl<T, E> AsyncState<T, E>
where
	T: Clone,
	E: Clone,
{
	/// A pending invocation started: the old result stays visible.
	pub fn running(&self) -> Self {
		AsyncState {
			result: self.result.clone(),
			error: None,
			is_running: true,
			is_cancelled: false,
		}
	}

	pub fn failed(&self, error: E) -> Self {
		AsyncState {
			result: self.result.clone(),
			error: Some(error),
			is_running: false,
			is_cancelled: self.is_cancelled,
		}
	}

	pub fn cancelled(&self) -> Self {
		AsyncState {
			result: self.result.clone(),
			error: None,
			is_running: self.is_running,
			is_cancelled: true,
		}
	}
}

impl<T, E> AsyncState<T, E> {
	pub fn resolved(value: T) -> Self {
		AsyncState {
			result: Some(value),
			..Default::default()
		}
	}

	pub fn is_errored(&self) -> bool {
		self.error.is_some()
	}
}
