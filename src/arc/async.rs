use std::sync::{Arc, Weak};

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::arc::value::{Subscription, Value};
use crate::error::AsyncError;
use crate::ledger::{Ledger, Verdict};
use crate::outcome::{Outcome, SendOutcome};
use crate::state::AsyncState;
use crate::task;
use crate::tick::Tick;
use crate::value::ListenOptions;

/// Future returned by `run` and `resolve`. Dropping it does not stop the
/// invocation.
pub type Invocation<T, E> = BoxFuture<'static, Result<T, AsyncError<E>>>;

/// Thread-safe async slot.
///
/// Tick allocation, the staleness check and the state write that follows it
/// run under one lock, so invocations settling on different threads still
/// obey start order. Listeners are notified after the lock is released.
///
/// Pending outcomes are awaited on a task spawned with [`tokio::spawn`], so
/// they must be started from within a tokio runtime.
pub struct Async<T, E, A = ()>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
{
	producer: Arc<dyn Fn(A) -> SendOutcome<T, E> + Send + Sync>,
	body: Arc<AsyncBody<T, E>>,
}

impl<T, E, A> Clone for Async<T, E, A>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
{
	fn clone(&self) -> Self {
		Self {
			producer: self.producer.clone(),
			body: self.body.clone(),
		}
	}
}

pub struct AsyncBody<T, E>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
{
	state: Value<AsyncState<T, E>>,
	ledger: Mutex<Ledger>,
}

impl<T, E, A> Async<T, E, A>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
	A: Send + 'static,
{
	pub fn new(producer: impl Fn(A) -> SendOutcome<T, E> + Send + Sync + 'static) -> Self {
		Async {
			producer: Arc::new(producer),
			body: Arc::new(AsyncBody {
				state: Value::new(AsyncState::default()),
				ledger: Mutex::new(Ledger::new()),
			}),
		}
	}

	pub fn run(&self, args: A) -> Invocation<T, E> {
		let producer = self.producer.clone();
		self.invoke(move || producer(args))
	}

	pub fn resolve(&self, outcome: impl Into<SendOutcome<T, E>>) -> Invocation<T, E> {
		let outcome = outcome.into();
		self.invoke(move || outcome)
	}

	pub fn resolve_with(&self, producer: impl FnOnce() -> SendOutcome<T, E>) -> Invocation<T, E> {
		self.invoke(producer)
	}

	pub fn cancel(&self) {
		{
			let ledger = self.body.ledger.lock();
			let tick = ledger.cancel();
			tracing::debug!(%tick, "async cancelled");
			let next = self.body.state.with(AsyncState::cancelled);
			self.body.state.store(next);
		}
		self.body.state.flush();
	}

	fn invoke(&self, producer: impl FnOnce() -> SendOutcome<T, E>) -> Invocation<T, E> {
		let tick = self.body.ledger.lock().start();
		tracing::trace!(%tick, "async invocation started");

		match producer() {
			Outcome::Ready(result) => future::ready(self.body.settle(tick, result)).boxed(),
			Outcome::Pending(pending) => {
				{
					let ledger = self.body.ledger.lock();
					if ledger.is_current(tick) {
						let next = self.body.state.with(AsyncState::running);
						self.body.state.store(next);
					}
				}
				self.body.state.flush();

				let this = Arc::downgrade(&self.body);
				let handle = tokio::spawn(async move {
					let result = pending.await;
					AsyncBody::settle_weak(&this, tick, result)
				});
				task::joined(handle).boxed()
			}
		}
	}

	#[inline]
	pub fn get_state(&self) -> AsyncState<T, E> {
		self.body.state.get()
	}

	#[inline]
	pub fn get_result(&self) -> Option<T> {
		self.body.state.with(|state| state.result.clone())
	}

	#[inline]
	pub fn get_error(&self) -> Option<E> {
		self.body.state.with(|state| state.error.clone())
	}

	#[inline]
	pub fn is_running(&self) -> bool {
		self.body.state.with(|state| state.is_running)
	}

	#[inline]
	pub fn is_errored(&self) -> bool {
		self.body.state.with(AsyncState::is_errored)
	}

	#[inline]
	pub fn is_cancelled(&self) -> bool {
		self.body.state.with(|state| state.is_cancelled)
	}

	pub fn listen(
		&self,
		listener: impl Fn(&AsyncState<T, E>) + Send + Sync + 'static,
		options: ListenOptions,
	) -> Subscription<AsyncState<T, E>> {
		self.body.state.listen(listener, options)
	}
}

impl<T, E> AsyncBody<T, E>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
{
	fn settle_weak(this: &Weak<Self>, tick: Tick, result: Result<T, E>) -> Result<T, AsyncError<E>> {
		match this.upgrade() {
			Some(this) => this.settle(tick, result),
			None => result.map_err(AsyncError::Failed),
		}
	}

	fn settle(&self, tick: Tick, result: Result<T, E>) -> Result<T, AsyncError<E>> {
		let settled = self.record(tick, result);
		self.state.flush();
		settled
	}

	/// Applies the verdict for `tick` to the stored state without notifying.
	fn record(&self, tick: Tick, result: Result<T, E>) -> Result<T, AsyncError<E>> {
		let ledger = self.ledger.lock();
		match result {
			Ok(value) => match ledger.on_success(tick) {
				Verdict::Apply => {
					tracing::trace!(%tick, "async result applied");
					self.state.store(AsyncState::resolved(value.clone()));
					Ok(value)
				}
				Verdict::Stale => {
					tracing::debug!(%tick, current = %ledger.current(), "stale async result dropped");
					Ok(value)
				}
				Verdict::Cancelled => {
					tracing::debug!(%tick, "async result rejected after cancel");
					Err(AsyncError::Cancelled)
				}
			},
			Err(error) => {
				if ledger.on_failure(tick) == Verdict::Stale {
					tracing::debug!(%tick, current = %ledger.current(), "stale async failure dropped");
				} else {
					tracing::debug!(%tick, "async invocation failed");
					let next = self.state.with(|state| state.failed(error.clone()));
					self.state.store(next);
				}
				Err(AsyncError::Failed(error))
			}
		}
	}
}

impl<T, E, A> std::fmt::Debug for Async<T, E, A>
where
	T: Clone + Send + Sync + std::fmt::Debug + 'static,
	E: Clone + Send + Sync + std::fmt::Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Async")
			.field("state", &self.body.state)
			.field("tick", &self.body.ledger.lock().current())
			.finish()
	}
}
