//! Cancellation tokens passed to health-check and shutdown hooks.
//!
//! A single token flows from the top-level `health_check`/`shutdown` call
//! down to every probed instance. The runtime never imposes a deadline of its
//! own unless one is configured through `InjectorOptions`; hooks are expected
//! to poll the token cooperatively.

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::{Duration, Instant};

/// A token that can be used to signal cancellation to lifecycle hooks.
///
/// Cloning is cheap and clones observe the same cancellation state.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{CancellationToken, Scope, ShutdownWithContext};
///
/// struct Flusher;
///
/// impl ShutdownWithContext for Flusher {
///     fn shutdown(&self, token: &CancellationToken) {
///         if token.is_cancelled() {
///             return;
///         }
///         // flush buffers...
///     }
/// }
///
/// let scope = Scope::new();
/// scope.service::<Flusher>()
///     .shutdown_with_context()
///     .lazy(|_| Ok(Flusher))
///     .unwrap();
///
/// let token = CancellationToken::new();
/// assert!(scope.shutdown(&token).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

#[derive(Debug)]
struct CancellationTokenInner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
    created_at: Instant,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                created_at: Instant::now(),
                deadline: None,
            })
        }
    }

    /// Creates a token that reports itself cancelled once `timeout` has elapsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_scopes::CancellationToken;
    /// use std::time::Duration;
    ///
    /// let token = CancellationToken::with_timeout(Duration::from_secs(30));
    /// assert!(!token.is_cancelled());
    /// assert!(token.remaining().unwrap() <= Duration::from_secs(30));
    /// ```
    pub fn with_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                created_at: now,
                deadline: now.checked_add(timeout),
            })
        }
    }

    /// Creates a child token that will be cancelled when either this token
    /// or the child itself is cancelled.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_scopes::CancellationToken;
    ///
    /// let parent_token = CancellationToken::new();
    /// let child_token = parent_token.child_token();
    ///
    /// parent_token.cancel();
    /// assert!(child_token.is_cancelled());
    /// ```
    pub fn child_token(&self) -> Self {
        self.child(None)
    }

    /// Creates a child token that additionally expires after `timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.child(Instant::now().checked_add(timeout))
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
                created_at: Instant::now(),
                deadline,
            })
        }
    }

    /// Cancels the token, signaling that associated operations should stop.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if cancellation has been requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }

        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }

        if let Some(ref parent) = self.inner.parent {
            return parent.is_cancelled();
        }

        false
    }

    /// Returns `Err` if the token is cancelled.
    ///
    /// Convenient inside hooks: `token.check()?;`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Time left before the nearest deadline in the chain, if any is set.
    pub fn remaining(&self) -> Option<Duration> {
        let own = self
            .inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        let parent = self.inner.parent.as_ref().and_then(|p| p.remaining());
        match (own, parent) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the elapsed time since this token was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by [`CancellationToken::check`] once cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_basic() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_child_token_cancellation() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        assert!(!parent.is_cancelled());
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(parent.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_token_independent_cancellation() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        child.cancel();
        assert!(!parent.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_check() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());

        token.cancel();
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn test_timeout_expires() {
        let token = CancellationToken::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        assert_eq!(token.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_child_deadline_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_with_timeout(Duration::ZERO);

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert_eq!(parent.remaining(), None);
    }
}
