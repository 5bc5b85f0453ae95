//! Containment for calls that cross the foreign boundary.
//!
//! Foreign-side implementations may panic (a failed FFI read surfaced as a
//! panic, a probe that trips an assertion). Those panics must end at the
//! boundary that made the call.

use std::any::Any;
use std::panic;
use std::panic::AssertUnwindSafe;

/// Run `f`, turning a panic into `None`.
pub fn contain<T>(f: impl FnOnce() -> T) -> Option<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).ok()
}

/// Run `f`, turning a panic into its message.
pub fn contain_with_message<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
