//! Blocking adapter for driving async rule bodies from synchronous callers.

use std::future::Future;
use std::thread;

use tokio::runtime::Builder;

use crate::error::EngineError;

/// Drives `future` to completion, blocking the calling thread.
///
/// The future runs on a scoped helper thread with its own current-thread
/// runtime. That keeps this usable from inside an existing runtime, where
/// blocking the runtime's own thread on a nested runtime would panic. A panic
/// inside the future is resumed on the caller's thread.
pub(crate) fn block_on<F>(future: F) -> Result<F::Output, EngineError>
where
    F: Future + Send,
    F::Output: Send,
{
    tracing::trace!("blocking on async rule body");
    thread::scope(|scope| {
        let handle = scope.spawn(move || -> Result<F::Output, EngineError> {
            let runtime = Builder::new_current_thread().enable_all().build()?;
            Ok(runtime.block_on(future))
        });
        match handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    })
}
