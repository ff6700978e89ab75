//! Observable async operation slot.
//!
//! An [`Async`] wraps a producer and tracks the latest invocation of it in an
//! observable [`AsyncState`]. Invocations are stamped with increasing ticks;
//! an outcome is only published while its tick is still the current one, so
//! a slow, older invocation can never overwrite the result of a newer one.

pub mod macros;

#[cfg(feature = "arc")]
pub mod arc;

mod r#async;
mod error;
mod ledger;
mod outcome;
mod state;
mod task;
mod tick;
mod value;

pub use error::AsyncError;
pub use outcome::{LocalOutcome, Outcome, SendOutcome};
pub use r#async::{Async, AsyncBody, Invocation};
pub use state::AsyncState;
pub use value::{ListenOptions, Subscription, Value, ValueBody};
