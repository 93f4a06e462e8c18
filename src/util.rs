//! Shared utility functions.

use std::any::Any;

use tokio::task::{spawn_blocking, JoinError};

/// Outcome of a closure run on the blocking pool.
///
/// A panic inside the closure is captured as [`Blocking::Panicked`] instead of
/// unwinding into the caller.
#[derive(Debug)]
pub enum Blocking<T> {
    Finished(T),
    Panicked(String),
}

pub async fn blocking<F, T>(f: F) -> crate::Result<Blocking<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match spawn_blocking(f).await {
        Ok(value) => Ok(Blocking::Finished(value)),
        Err(join_err) => from_join_error(join_err),
    }
}

fn from_join_error<T>(err: JoinError) -> crate::Result<Blocking<T>> {
    if err.is_panic() {
        Ok(Blocking::Panicked(panic_message(err.into_panic().as_ref())))
    } else {
        Err(crate::Error::TaskJoin(err.to_string()))
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
