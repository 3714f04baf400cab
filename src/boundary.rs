use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, turning a panic into its message so the window can show a
/// recovery screen instead of going away.
pub fn guard<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| describe(payload.as_ref()))
}

pub fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "An unexpected error occurred.".to_string()
    }
}
