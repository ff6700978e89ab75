use std::sync::{Arc, Mutex, MutexGuard};

use mockall::*;
use observe_async::AsyncState;

pub type State = AsyncState<&'static str, String>;

#[automock]
pub trait Spy {
	fn notify(&self, state: State);
}

#[derive(Clone)]
pub struct SharedMock(Arc<Mutex<MockSpy>>);

impl SharedMock {
	pub fn new() -> SharedMock {
		SharedMock(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get<'a>(&'a self) -> MutexGuard<'a, MockSpy> {
		return self.0.lock().unwrap();
	}

	/// Listener forwarding every snapshot to the mock.
	pub fn listener(&self) -> impl Fn(&State) + Send + Sync + 'static {
		let mock = self.clone();
		move |state: &State| mock.get().notify(state.clone())
	}
}
