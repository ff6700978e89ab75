use tokio::task::JoinHandle;

use crate::error::AsyncError;

/// Waits for a settle task spawned by an invocation.
///
/// Dropping the returned future detaches from the task; the task itself keeps
/// running and still applies its outcome.
pub(crate) async fn joined<T, E>(task: JoinHandle<Result<T, AsyncError<E>>>) -> Result<T, AsyncError<E>> {
	match task.await {
		Ok(result) => result,
		Err(error) => match error.try_into_panic() {
			Ok(panic) => std::panic::resume_unwind(panic),
			Err(_) => Err(AsyncError::Aborted),
		},
	}
}
