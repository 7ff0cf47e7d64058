//! Capability probes for built instances.
//!
//! Rust has no runtime interface assertions, so optional behaviour is
//! declared when a service is registered: each declaration adds a typed
//! adapter to an ordered probe list. At health-check or shutdown time the
//! runtime picks the highest-priority adapter for the instance and calls it.
//! An instance without adapters simply has no hook to run.

use std::fmt;
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::error::BoxError;
use crate::traits::{
    HealthCheck, HealthCheckWithContext, Shutdown, ShutdownWithContext,
    ShutdownWithContextAndError, ShutdownWithError,
};

type HookFn<T> = Arc<dyn Fn(&T, &CancellationToken) -> Result<(), BoxError> + Send + Sync>;

/// Accepted health-check shapes, most capable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthSignature {
    /// `health_check(&self, &CancellationToken) -> Result`
    WithContext,
    /// `health_check(&self) -> Result`
    Plain,
}

/// Accepted shutdown shapes, most capable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShutdownSignature {
    /// `shutdown(&self, &CancellationToken) -> Result`
    WithContextAndError,
    /// `shutdown(&self) -> Result`
    WithError,
    /// `shutdown(&self, &CancellationToken)`
    WithContext,
    /// `shutdown(&self)`
    Plain,
}

struct Probe<S, T: ?Sized> {
    signature: S,
    call: HookFn<T>,
}

impl<S: Copy, T: ?Sized> Clone for Probe<S, T> {
    fn clone(&self) -> Self {
        Self { signature: self.signature, call: self.call.clone() }
    }
}

/// Ordered probe list describing the optional hooks of a service type.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{BoxError, Capabilities, Shutdown, ShutdownWithError, ShutdownSignature};
///
/// struct Pool;
///
/// impl Shutdown for Pool {
///     fn shutdown(&self) {}
/// }
///
/// impl ShutdownWithError for Pool {
///     fn shutdown(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// let caps = Capabilities::<Pool>::new().shutdown().shutdown_with_error();
/// // The richer signature wins regardless of declaration order.
/// assert_eq!(caps.shutdown_signature(), Some(ShutdownSignature::WithError));
/// ```
pub struct Capabilities<T: ?Sized> {
    health: Vec<Probe<HealthSignature, T>>,
    shutdown: Vec<Probe<ShutdownSignature, T>>,
}

impl<T: ?Sized> Clone for Capabilities<T> {
    fn clone(&self) -> Self {
        Self { health: self.health.clone(), shutdown: self.shutdown.clone() }
    }
}

impl<T: ?Sized> Default for Capabilities<T> {
    fn default() -> Self {
        Self { health: Vec::new(), shutdown: Vec::new() }
    }
}

impl<T: ?Sized> fmt::Debug for Capabilities<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("health", &self.health.iter().map(|p| p.signature).collect::<Vec<_>>())
            .field("shutdown", &self.shutdown.iter().map(|p| p.signature).collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized + 'static> Capabilities<T> {
    /// Empty probe list: no health check, no shutdown hook.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_health<F>(mut self, signature: HealthSignature, call: F) -> Self
    where
        F: Fn(&T, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.health.retain(|p| p.signature != signature);
        self.health.push(Probe { signature, call: Arc::new(call) });
        self.health.sort_by_key(|p| p.signature);
        self
    }

    fn with_shutdown<F>(mut self, signature: ShutdownSignature, call: F) -> Self
    where
        F: Fn(&T, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.shutdown.retain(|p| p.signature != signature);
        self.shutdown.push(Probe { signature, call: Arc::new(call) });
        self.shutdown.sort_by_key(|p| p.signature);
        self
    }

    /// Declares [`HealthCheck`].
    pub fn health_check(self) -> Self
    where
        T: HealthCheck,
    {
        self.with_health(HealthSignature::Plain, |t, _| HealthCheck::health_check(t))
    }

    /// Declares [`HealthCheckWithContext`].
    pub fn health_check_with_context(self) -> Self
    where
        T: HealthCheckWithContext,
    {
        self.with_health(HealthSignature::WithContext, |t, token| {
            HealthCheckWithContext::health_check(t, token)
        })
    }

    /// Declares a health check through a closure, for types that cannot
    /// implement the traits (foreign types, trait objects).
    pub fn health_check_fn<F>(self, check: F) -> Self
    where
        F: Fn(&T, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.with_health(HealthSignature::WithContext, check)
    }

    /// Declares [`Shutdown`].
    pub fn shutdown(self) -> Self
    where
        T: Shutdown,
    {
        self.with_shutdown(ShutdownSignature::Plain, |t, _| {
            Shutdown::shutdown(t);
            Ok(())
        })
    }

    /// Declares [`ShutdownWithError`].
    pub fn shutdown_with_error(self) -> Self
    where
        T: ShutdownWithError,
    {
        self.with_shutdown(ShutdownSignature::WithError, |t, _| ShutdownWithError::shutdown(t))
    }

    /// Declares [`ShutdownWithContext`].
    pub fn shutdown_with_context(self) -> Self
    where
        T: ShutdownWithContext,
    {
        self.with_shutdown(ShutdownSignature::WithContext, |t, token| {
            ShutdownWithContext::shutdown(t, token);
            Ok(())
        })
    }

    /// Declares [`ShutdownWithContextAndError`].
    pub fn shutdown_with_context_and_error(self) -> Self
    where
        T: ShutdownWithContextAndError,
    {
        self.with_shutdown(ShutdownSignature::WithContextAndError, |t, token| {
            ShutdownWithContextAndError::shutdown(t, token)
        })
    }

    /// Declares a shutdown hook through a closure.
    pub fn shutdown_fn<F>(self, hook: F) -> Self
    where
        F: Fn(&T, &CancellationToken) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.with_shutdown(ShutdownSignature::WithContextAndError, hook)
    }

    /// Signature of the health hook that would run, if any.
    pub fn health_signature(&self) -> Option<HealthSignature> {
        self.health.first().map(|p| p.signature)
    }

    /// Signature of the shutdown hook that would run, if any.
    pub fn shutdown_signature(&self) -> Option<ShutdownSignature> {
        self.shutdown.first().map(|p| p.signature)
    }

    pub(crate) fn is_health_checker(&self) -> bool {
        !self.health.is_empty()
    }

    pub(crate) fn is_shutdowner(&self) -> bool {
        !self.shutdown.is_empty()
    }

    /// Runs the highest-priority health probe; no probe means healthy.
    pub(crate) fn run_health_check(
        &self,
        instance: &T,
        token: &CancellationToken,
    ) -> Result<(), BoxError> {
        match self.health.first() {
            Some(probe) => (probe.call)(instance, token),
            None => Ok(()),
        }
    }

    /// Runs the highest-priority shutdown probe; no probe is a no-op.
    pub(crate) fn run_shutdown(
        &self,
        instance: &T,
        token: &CancellationToken,
    ) -> Result<(), BoxError> {
        match self.shutdown.first() {
            Some(probe) => (probe.call)(instance, token),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Shutdown for Recorder {
        fn shutdown(&self) {
            self.calls.lock().unwrap().push("plain");
        }
    }

    impl ShutdownWithContext for Recorder {
        fn shutdown(&self, _token: &CancellationToken) {
            self.calls.lock().unwrap().push("context");
        }
    }

    impl ShutdownWithContextAndError for Recorder {
        fn shutdown(&self, _token: &CancellationToken) -> Result<(), BoxError> {
            self.calls.lock().unwrap().push("context-and-error");
            Err("boom".into())
        }
    }

    impl HealthCheck for Recorder {
        fn health_check(&self) -> Result<(), BoxError> {
            self.calls.lock().unwrap().push("health");
            Ok(())
        }
    }

    #[test]
    fn test_empty_capabilities_are_no_ops() {
        let caps = Capabilities::<Recorder>::new();
        let recorder = Recorder::default();
        let token = CancellationToken::new();

        assert!(!caps.is_health_checker());
        assert!(!caps.is_shutdowner());
        assert!(caps.run_health_check(&recorder, &token).is_ok());
        assert!(caps.run_shutdown(&recorder, &token).is_ok());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_richest_shutdown_shape_wins() {
        let caps = Capabilities::<Recorder>::new()
            .shutdown()
            .shutdown_with_context()
            .shutdown_with_context_and_error();
        let recorder = Recorder::default();

        let result = caps.run_shutdown(&recorder, &CancellationToken::new());

        assert!(result.is_err());
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["context-and-error"]);
        assert_eq!(caps.shutdown_signature(), Some(ShutdownSignature::WithContextAndError));
    }

    #[test]
    fn test_context_shape_beats_plain() {
        let caps = Capabilities::<Recorder>::new().shutdown().shutdown_with_context();
        let recorder = Recorder::default();

        caps.run_shutdown(&recorder, &CancellationToken::new()).unwrap();

        assert_eq!(*recorder.calls.lock().unwrap(), vec!["context"]);
    }

    #[test]
    fn test_redeclaring_a_shape_replaces_it() {
        let caps = Capabilities::<Recorder>::new()
            .shutdown_fn(|_, _| Err("first".into()))
            .shutdown_fn(|_, _| Ok(()));

        assert!(caps.run_shutdown(&Recorder::default(), &CancellationToken::new()).is_ok());
    }

    #[test]
    fn test_health_probe_on_trait_object() {
        let caps = Capabilities::<dyn HealthCheck>::new().health_check();
        let recorder = Recorder::default();
        let object: &dyn HealthCheck = &recorder;

        caps.run_health_check(object, &CancellationToken::new()).unwrap();

        assert_eq!(*recorder.calls.lock().unwrap(), vec!["health"]);
        assert_eq!(caps.health_signature(), Some(HealthSignature::Plain));
    }
}
