use std::rc::{Rc, Weak};

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;

use crate::error::AsyncError;
use crate::ledger::{Ledger, Verdict};
use crate::outcome::{LocalOutcome, Outcome};
use crate::state::AsyncState;
use crate::task;
use crate::tick::Tick;
use crate::value::{ListenOptions, Subscription, Value};

/// Future returned by `run` and `resolve`, yielding the invocation's own
/// outcome. Dropping it does not stop the invocation.
pub type Invocation<T, E> = LocalBoxFuture<'static, Result<T, AsyncError<E>>>;

/// Single async operation slot.
///
/// Every `run`/`resolve` starts a new invocation stamped with a fresh tick.
/// Whatever order the invocations settle in, only the latest one may publish
/// its result to the observable state.
///
/// Pending outcomes are awaited on a task spawned with
/// [`tokio::task::spawn_local`], so they must be started inside a
/// [`tokio::task::LocalSet`]. Ready outcomes are applied before `run` returns.
pub struct Async<T, E, A = ()>
where
	T: Clone + 'static,
	E: Clone + 'static,
{
	producer: Rc<dyn Fn(A) -> LocalOutcome<T, E>>,
	body: Rc<AsyncBody<T, E>>,
}

impl<T, E, A> Clone for Async<T, E, A>
where
	T: Clone + 'static,
	E: Clone + 'static,
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
	T: Clone + 'static,
	E: Clone + 'static,
{
	state: Value<AsyncState<T, E>>,
	ledger: Ledger,
}

impl<T, E, A> Async<T, E, A>
where
	T: Clone + 'static,
	E: Clone + 'static,
	A: 'static,
{
	pub fn new(producer: impl Fn(A) -> LocalOutcome<T, E> + 'static) -> Self {
		Async {
			producer: Rc::new(producer),
			body: Rc::new(AsyncBody {
				state: Value::new(AsyncState::default()),
				ledger: Ledger::new(),
			}),
		}
	}

	/// Calls the constructor producer with `args`.
	pub fn run(&self, args: A) -> Invocation<T, E> {
		let producer = self.producer.clone();
		self.invoke(move || producer(args))
	}

	/// Tracks an outcome without calling the constructor producer.
	pub fn resolve(&self, outcome: impl Into<LocalOutcome<T, E>>) -> Invocation<T, E> {
		let outcome = outcome.into();
		self.invoke(move || outcome)
	}

	/// Tracks the outcome of a substitute producer.
	pub fn resolve_with(&self, producer: impl FnOnce() -> LocalOutcome<T, E>) -> Invocation<T, E> {
		self.invoke(producer)
	}

	/// Marks the current invocation as cancelled. The producer keeps running;
	/// only the application of its result is suppressed.
	pub fn cancel(&self) {
		let tick = self.body.ledger.cancel();
		tracing::debug!(%tick, "async cancelled");
		let next = self.body.state.with(AsyncState::cancelled);
		self.body.state.set(next);
	}

	fn invoke(&self, producer: impl FnOnce() -> LocalOutcome<T, E>) -> Invocation<T, E> {
		let tick = self.body.ledger.start();
		tracing::trace!(%tick, "async invocation started");

		match producer() {
			Outcome::Ready(result) => {
				let result = self.body.settle(tick, result);
				future::ready(result).boxed_local()
			}
			Outcome::Pending(pending) => {
				// a re-entrant call from inside the producer may have superseded us
				if self.body.ledger.is_current(tick) {
					let next = self.body.state.with(AsyncState::running);
					self.body.state.set(next);
				}

				let this = Rc::downgrade(&self.body);
				let handle = tokio::task::spawn_local(async move {
					let result = pending.await;
					AsyncBody::settle_weak(&this, tick, result)
				});
				task::joined(handle).boxed_local()
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
		listener: impl Fn(&AsyncState<T, E>) + 'static,
		options: ListenOptions,
	) -> Subscription<AsyncState<T, E>> {
		self.body.state.listen(listener, options)
	}
}

impl<T, E> AsyncBody<T, E>
where
	T: Clone + 'static,
	E: Clone + 'static,
{
	fn settle_weak(this: &Weak<Self>, tick: Tick, result: Result<T, E>) -> Result<T, AsyncError<E>> {
		match this.upgrade() {
			Some(this) => this.settle(tick, result),
			None => result.map_err(AsyncError::Failed),
		}
	}

	fn settle(&self, tick: Tick, result: Result<T, E>) -> Result<T, AsyncError<E>> {
		match result {
			Ok(value) => match self.ledger.on_success(tick) {
				Verdict::Apply => {
					tracing::trace!(%tick, "async result applied");
					self.state.set(AsyncState::resolved(value.clone()));
					Ok(value)
				}
				Verdict::Stale => {
					tracing::debug!(%tick, current = %self.ledger.current(), "stale async result dropped");
					Ok(value)
				}
				Verdict::Cancelled => {
					tracing::debug!(%tick, "async result rejected after cancel");
					Err(AsyncError::Cancelled)
				}
			},
			Err(error) => {
				match self.ledger.on_failure(tick) {
					Verdict::Stale => {
						tracing::debug!(%tick, current = %self.ledger.current(), "stale async failure dropped");
					}
					_ => {
						tracing::debug!(%tick, "async invocation failed");
						let next = self.state.with(|state| state.failed(error.clone()));
						self.state.set(next);
					}
				}
				Err(AsyncError::Failed(error))
			}
		}
	}
}

impl<T, E, A> std::fmt::Debug for Async<T, E, A>
where
	T: Clone + std::fmt::Debug + 'static,
	E: Clone + std::fmt::Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Async")
			.field("state", &self.body.state)
			.field("tick", &self.body.ledger.current())
			.finish()
	}
}
