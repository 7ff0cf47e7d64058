//! Lifecycle observers for scope traceability.
//!
//! The runtime logs through `tracing` on its own. Observers are for callers
//! that want the same events as values: metrics, audit trails, or assertions
//! in tests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DiError, HookError};
use crate::key::ServiceRef;
use crate::lifetime::ServiceKind;

/// Observer trait for scope lifecycle events.
///
/// Every method has a no-op default, so implementations only override the
/// events they care about.
///
/// # Performance
///
/// Observer calls are made synchronously, outside of any descriptor lock but
/// on the thread doing the work. Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{InjectorOptions, Resolver, Scope, ScopeObserver, ServiceRef};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct BuildCounter(AtomicUsize);
///
/// impl ScopeObserver for BuildCounter {
///     fn built(&self, _service: &ServiceRef, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let counter = Arc::new(BuildCounter::default());
/// let scope = Scope::new_with_options(InjectorOptions::new().with_observer(counter.clone()));
/// scope.provide(|_| Ok(42u32)).unwrap();
///
/// scope.invoke::<u32>().unwrap();
/// scope.invoke::<u32>().unwrap();
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ScopeObserver: Send + Sync {
    /// Called after a descriptor was added to (or replaced in) a registry.
    fn registered(&self, _service: &ServiceRef, _kind: ServiceKind) {}

    /// Called after a lazy service was built.
    ///
    /// # Arguments
    ///
    /// * `service` - The service that was built
    /// * `elapsed` - Time spent in the provider
    fn built(&self, _service: &ServiceRef, _elapsed: Duration) {}

    /// Called when a lazy service's provider failed or panicked.
    fn build_failed(&self, _service: &ServiceRef, _error: &DiError) {}

    /// Called after a service was torn down, with the hook's error if any.
    fn shut_down(&self, _service: &ServiceRef, _error: Option<&HookError>) {}
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ScopeObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn ScopeObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn registered(&self, service: &ServiceRef, kind: ServiceKind) {
        for observer in &self.observers {
            observer.registered(service, kind);
        }
    }

    #[inline]
    pub(crate) fn built(&self, service: &ServiceRef, elapsed: Duration) {
        for observer in &self.observers {
            observer.built(service, elapsed);
        }
    }

    #[inline]
    pub(crate) fn build_failed(&self, service: &ServiceRef, error: &DiError) {
        for observer in &self.observers {
            observer.build_failed(service, error);
        }
    }

    #[inline]
    pub(crate) fn shut_down(&self, service: &ServiceRef, error: Option<&HookError>) {
        for observer in &self.observers {
            observer.shut_down(service, error);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} observers", self.observers.len())
    }
}
