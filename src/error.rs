use thiserror::Error;

/// Error an invocation's caller receives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsyncError<E> {
	/// The producer failed, either right away or once its future settled.
	#[error("{0}")]
	Failed(E),
	/// `cancel()` ran while the invocation was the latest one.
	#[error("Async has been cancelled")]
	Cancelled,
	/// The runtime shut down before the invocation settled.
	#[error("Async task was aborted before settling")]
	Aborted,
}

impl<E> AsyncError<E> {
	pub fn is_cancelled(&self) -> bool {
		matches!(self, AsyncError::Cancelled)
	}

	/// The producer's own error, if this is not a cancellation.
	pub fn into_cause(self) -> Option<E> {
		match self {
			AsyncError::Failed(cause) => Some(cause),
			AsyncError::Cancelled | AsyncError::Aborted => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages() {
		assert_eq!(
			AsyncError::<String>::Cancelled.to_string(),
			"Async has been cancelled"
		);
		assert_eq!(
			AsyncError::Failed("Synthetic error").to_string(),
			"Synthetic error"
		);
		assert_eq!(
			AsyncError::<String>::Aborted.to_string(),
			"Async task was aborted before settling"
		);
	}

	#[test]
	fn cause() {
		assert_eq!(AsyncError::Failed(7).into_cause(), Some(7));
		assert!(AsyncError::<i32>::Cancelled.into_cause().is_none());
		assert!(AsyncError::<i32>::Cancelled.is_cancelled());
		assert!(AsyncError::<i32>::Aborted.into_cause().is_none());
		assert!(!AsyncError::<i32>::Aborted.is_cancelled());
	}
}
