//! Shutdown capability traits.
//!
//! Four accepted shapes, from most to least capable:
//! [`ShutdownWithContextAndError`], [`ShutdownWithError`],
//! [`ShutdownWithContext`] and [`Shutdown`]. When an instance declares more
//! than one, the most capable shape is the one invoked.

use crate::cancellation::CancellationToken;
use crate::error::BoxError;

/// Trait for services that need structured teardown.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{CancellationToken, Resolver, Scope, Shutdown};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Shutdown for Cache {
///     fn shutdown(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let scope = Scope::new();
/// scope.service::<Cache>()
///     .shutdown()
///     .lazy(|_| Ok(Cache { flushed: AtomicBool::new(false) }))
///     .unwrap();
///
/// let cache = scope.invoke::<Cache>().unwrap();
/// scope.shutdown(&CancellationToken::new()).unwrap();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Shutdown: Send + Sync {
    /// Releases the resources held by the service.
    fn shutdown(&self);
}

/// Fallible variant of [`Shutdown`].
pub trait ShutdownWithError: Send + Sync {
    /// Releases the resources held by the service, reporting failures.
    fn shutdown(&self) -> Result<(), BoxError>;
}

/// Context-aware variant of [`Shutdown`].
pub trait ShutdownWithContext: Send + Sync {
    /// Releases the resources held by the service, honouring `token`.
    fn shutdown(&self, token: &CancellationToken);
}

/// Context-aware, fallible variant of [`Shutdown`].
pub trait ShutdownWithContextAndError: Send + Sync {
    /// Releases the resources held by the service, honouring `token` and
    /// reporting failures.
    fn shutdown(&self, token: &CancellationToken) -> Result<(), BoxError>;
}
