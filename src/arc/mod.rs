//! `Send + Sync` flavour of the async slot and its observable cell.
//!
//! Same semantics as the crate root types, for producers whose futures run
//! on a multi-threaded executor.

mod r#async;
mod value;

pub use r#async::{Async, AsyncBody, Invocation};
pub use value::{Subscription, Value, ValueBody};

pub use crate::outcome::SendOutcome as Outcome;
