use std::future::Future;

use futures::future::{BoxFuture, LocalBoxFuture};
use futures::FutureExt;

/// What a producer call yields: a value available right now, or a future.
///
/// `F` is the boxed future type; the single-threaded `Async` uses
/// [`LocalOutcome`], the `arc` flavour uses [`SendOutcome`].
pub enum Outcome<T, E, F> {
	Ready(Result<T, E>),
	Pending(F),
}

pub type LocalOutcome<T, E> = Outcome<T, E, LocalBoxFuture<'static, Result<T, E>>>;

pub type SendOutcome<T, E> = Outcome<T, E, BoxFuture<'static, Result<T, E>>>;

impl<T, E, F> Outcome<T, E, F> {
	pub fn ok(value: T) -> Self {
		Outcome::Ready(Ok(value))
	}

	pub fn err(error: E) -> Self {
		Outcome::Ready(Err(error))
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, Outcome::Pending(_))
	}
}

impl<T, E> LocalOutcome<T, E> {
	pub fn pending(future: impl Future<Output = Result<T, E>> + 'static) -> Self {
		Outcome::Pending(future.boxed_local())
	}
}

impl<T, E> SendOutcome<T, E> {
	pub fn pending(future: impl Future<Output = Result<T, E>> + Send + 'static) -> Self {
		Outcome::Pending(future.boxed())
	}
}

impl<T, E, F> From<Result<T, E>> for Outcome<T, E, F> {
	fn from(result: Result<T, E>) -> Self {
		Outcome::Ready(result)
	}
}

impl<T, E, F> std::fmt::Debug for Outcome<T, E, F>
where
	T: std::fmt::Debug,
	E: std::fmt::Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Outcome::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
			Outcome::Pending(_) => f.write_str("Pending"),
		}
	}
}
