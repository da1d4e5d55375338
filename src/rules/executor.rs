//! Dual-mode rule bodies.
//!
//! A rule body is authored either synchronously or asynchronously, and the
//! choice is fixed when the [`RuleExecutor`] is built. Whichever convention a
//! run uses, every rule honors it: an async body driven synchronously blocks
//! until it completes, and a sync body driven asynchronously completes
//! immediately.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::blocking;
use crate::error::{EngineError, ValidationFailure};
use crate::validation::ValidationContext;

/// A synchronous rule body.
pub type SyncBody<T> =
    Arc<dyn Fn(&T, &ValidationContext<'_>) -> Vec<ValidationFailure> + Send + Sync>;

/// An asynchronous rule body.
pub type AsyncBody<T> = Arc<
    dyn for<'a> Fn(&'a T, &'a ValidationContext<'a>, CancellationToken) -> BoxFuture<'a, Vec<ValidationFailure>>
        + Send
        + Sync,
>;

/// One rule body in its native calling convention.
///
/// # Example
///
/// ```rust
/// use inquest::{RuleExecutor, ValidationContext};
/// use futures::FutureExt;
///
/// struct Account { balance: i64 }
///
/// let sync_rule = RuleExecutor::sync(|account: &Account, ctx: &ValidationContext<'_>| {
///     if account.balance < 0 {
///         vec![ctx.failure("Balance", "must not be negative")]
///     } else {
///         Vec::new()
///     }
/// });
///
/// let async_rule = RuleExecutor::asynchronous(|account: &Account, ctx, _cancel| {
///     async move {
///         if account.balance < 0 {
///             vec![ctx.failure("Balance", "must not be negative")]
///         } else {
///             Vec::new()
///         }
///     }
///     .boxed()
/// });
///
/// let account = Account { balance: -5 };
/// let ctx = ValidationContext::new(&account);
/// assert_eq!(sync_rule.execute(&ctx).unwrap(), async_rule.execute(&ctx).unwrap());
/// ```
pub enum RuleExecutor<T> {
    /// Plain function of model and context.
    Sync(SyncBody<T>),
    /// Function of model, context and cancellation returning a pending result.
    Async(AsyncBody<T>),
}

impl<T: Any + Send + Sync> RuleExecutor<T> {
    /// Builds an executor around a synchronous body.
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(&T, &ValidationContext<'_>) -> Vec<ValidationFailure> + Send + Sync + 'static,
    {
        RuleExecutor::Sync(Arc::new(body))
    }

    /// Builds an executor around an asynchronous body.
    pub fn asynchronous<F>(body: F) -> Self
    where
        F: for<'a> Fn(&'a T, &'a ValidationContext<'a>, CancellationToken) -> BoxFuture<'a, Vec<ValidationFailure>>
            + Send
            + Sync
            + 'static,
    {
        RuleExecutor::Async(Arc::new(body))
    }

    /// Returns true if the body was authored asynchronously.
    pub fn is_async(&self) -> bool {
        matches!(self, RuleExecutor::Async(_))
    }

    /// Runs the body on the calling thread.
    ///
    /// An async body is driven to completion on a helper thread while the
    /// caller blocks. It receives a fresh token that is never cancelled, so
    /// once started it cannot be stopped from here.
    pub fn execute(&self, ctx: &ValidationContext<'_>) -> Result<Vec<ValidationFailure>, EngineError> {
        let model = ctx.model_as::<T>()?;
        match self {
            RuleExecutor::Sync(body) => Ok(body(model, ctx)),
            RuleExecutor::Async(body) => blocking::block_on(body(model, ctx, CancellationToken::new())),
        }
    }

    /// Runs the body asynchronously.
    ///
    /// A sync body runs straight away and the returned future is already
    /// complete. An async body is raced against `cancel`; if the token fires
    /// first the result is [`EngineError::Cancelled`].
    pub fn execute_async<'a>(
        &'a self,
        ctx: &'a ValidationContext<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ValidationFailure>, EngineError>> {
        let model = match ctx.model_as::<T>() {
            Ok(model) => model,
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        match self {
            RuleExecutor::Sync(body) => future::ready(Ok(body(model, ctx))).boxed(),
            RuleExecutor::Async(body) => {
                let pending = body(model, ctx, cancel.clone());
                async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(EngineError::Cancelled),
                        failures = pending => Ok(failures),
                    }
                }
                .boxed()
            }
        }
    }

    /// Whether this body should be awaited rather than run inline.
    ///
    /// Both sides must agree: the body must be async and the run must have
    /// been started asynchronously.
    pub fn should_run_async(&self, ctx: &ValidationContext<'_>) -> bool {
        self.is_async() && ctx.is_async()
    }
}

impl<T> Clone for RuleExecutor<T> {
    fn clone(&self) -> Self {
        match self {
            RuleExecutor::Sync(body) => RuleExecutor::Sync(Arc::clone(body)),
            RuleExecutor::Async(body) => RuleExecutor::Async(Arc::clone(body)),
        }
    }
}

impl<T> fmt::Debug for RuleExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleExecutor::Sync(_) => f.write_str("RuleExecutor::Sync"),
            RuleExecutor::Async(_) => f.write_str("RuleExecutor::Async"),
        }
    }
}
