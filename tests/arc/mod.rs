use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mockall::predicate::eq;
use observe_async::arc::{Async, Outcome};
use observe_async::{AsyncError, ListenOptions};
use tokio::sync::oneshot;

use crate::mock::{SharedMock, State};

fn deferred() -> (oneshot::Sender<Result<&'static str, String>>, Outcome<&'static str, String>) {
	let (tx, rx) = oneshot::channel();
	let outcome = Outcome::pending(async move {
		rx.await.unwrap_or_else(|_| Err("sender dropped".to_string()))
	});
	(tx, outcome)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_invocations_obey_start_order() {
	crate::init();
	let slot: Async<&'static str, String> = Async::new(|()| Outcome::ok("foo"));
	slot.run(()).await.unwrap();

	let (tx1, p1) = deferred();
	let (tx2, p2) = deferred();
	let first = tokio::spawn(slot.resolve(p1));
	let second = tokio::spawn(slot.resolve(p2));

	tx2.send(Ok("bar")).unwrap();
	assert_eq!(second.await.unwrap(), Ok("bar"));
	assert_eq!(slot.get_state(), State::resolved("bar"));

	tx1.send(Ok("baz")).unwrap();
	assert_eq!(first.await.unwrap(), Ok("baz"));
	assert_eq!(slot.get_state(), State::resolved("bar"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_from_another_task() {
	let slot: Async<&'static str, String> = Async::new(|()| Outcome::ok("foo"));
	slot.run(()).await.unwrap();

	let (tx, pending) = deferred();
	let invocation = tokio::spawn(slot.resolve(pending));

	let canceller = slot.clone();
	tokio::spawn(async move { canceller.cancel() }).await.unwrap();
	assert!(slot.is_cancelled());

	tx.send(Ok("bar")).unwrap();
	assert_eq!(invocation.await.unwrap(), Err(AsyncError::Cancelled));
	assert_eq!(slot.get_result(), Some("foo"));
	assert!(slot.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn latest_of_many_wins() {
	let slot: Async<usize, String, usize> = Async::new(|n: usize| {
		Outcome::pending(async move {
			tokio::task::yield_now().await;
			Ok(n)
		})
	});

	let handles: Vec<_> = (0..32).map(|n| tokio::spawn(slot.run(n))).collect();
	for (n, handle) in handles.into_iter().enumerate() {
		assert_eq!(handle.await.unwrap(), Ok(n));
	}

	assert_eq!(slot.get_result(), Some(31));
	assert!(!slot.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listeners_see_every_transition() {
	let slot: Async<&'static str, String> = Async::new(|()| Outcome::ok("foo"));
	let mock = SharedMock::new();

	mock.get()
		.expect_notify()
		.with(eq(State::default()))
		.times(1)
		.return_const(());
	let subscription = slot.listen(mock.listener(), ListenOptions::immediate());
	mock.get().checkpoint();

	mock.get()
		.expect_notify()
		.with(eq(State::resolved("foo")))
		.times(1)
		.return_const(());
	tokio::spawn(slot.run(())).await.unwrap().unwrap();
	mock.get().checkpoint();

	subscription.unsubscribe();
	mock.get().expect_notify().times(0).return_const(());
	slot.cancel();
	mock.get().checkpoint();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_is_published_once() {
	let slot: Async<&'static str, String> =
		Async::new(|()| Outcome::pending(async { Err("boom".to_string()) }));
	let errors = Arc::new(AtomicUsize::new(0));
	let _subscription = slot.listen(
		{
			let errors = errors.clone();
			move |state| {
				if state.error.is_some() {
					errors.fetch_add(1, Ordering::SeqCst);
				}
			}
		},
		ListenOptions::default(),
	);

	let result = tokio::spawn(slot.run(())).await.unwrap();
	assert_eq!(result, Err(AsyncError::Failed("boom".to_string())));
	assert_eq!(errors.load(Ordering::SeqCst), 1);
	assert_eq!(slot.get_error(), Some("boom".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_handle_still_settles() {
	let slot: Async<&'static str, String> = Async::new(|()| Outcome::ok("foo"));
	let (settled_tx, mut settled_rx) = tokio::sync::mpsc::unbounded_channel();
	let _subscription = slot.listen(
		move |state: &State| {
			if !state.is_running {
				let _ = settled_tx.send(state.clone());
			}
		},
		ListenOptions::default(),
	);

	let (tx, pending) = deferred();
	drop(slot.resolve(pending));
	assert!(slot.is_running());

	assert!(tx.send(Ok("bar")).is_ok());
	assert_eq!(settled_rx.recv().await, Some(State::resolved("bar")));
	assert_eq!(slot.get_state(), State::resolved("bar"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listener_may_wait_for_cancel_on_another_thread() {
	let slot: Async<&'static str, String> = Async::new(|()| Outcome::ok("foo"));
	let _subscription = slot.listen(
		{
			let slot = slot.clone();
			move |state: &State| {
				if state.result.is_some() && !state.is_cancelled {
					let other = slot.clone();
					std::thread::spawn(move || other.cancel()).join().unwrap();
				}
			}
		},
		ListenOptions::default(),
	);

	let (tx, pending) = deferred();
	let invocation = slot.resolve(pending);
	tx.send(Ok("bar")).unwrap();

	assert_eq!(invocation.await, Ok("bar"));
	assert!(slot.is_cancelled());
	assert_eq!(slot.get_result(), Some("bar"));
}
