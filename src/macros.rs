pub use enclose::*;

/// Builds an [`Async`](crate::Async) from a producer closure, cloning the
/// listed captures into it first.
///
/// ```ignore
/// let slot = producer!((client) |id: u64| LocalOutcome::pending(client.fetch(id)));
/// ```
#[macro_export]
macro_rules! producer {
    (( $($d_tt:tt)* ) | $($b:tt)*) => {
        $crate::Async::new($crate::macros::enclose!(($( $d_tt )*) move | $($b)*))
    };
    (| $($b:tt)*) => {
        $crate::Async::new(move | $($b)*)
    };
}
