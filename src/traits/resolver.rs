//! Resolver traits for service invocation.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::invocation::Frame;
use crate::key::name_of;

/// Core resolver trait for object-safe service invocation.
///
/// Handles the low-level mechanics: walking the scope chain, cycle and depth
/// detection through the thread-local resolution chain, and building or
/// replaying the instance.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed methods built on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Invokes the service called `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - Service name, looked up from this scope towards the root
    /// * `caller` - Call site recorded in the service's invocation trace
    ///
    /// # Returns
    ///
    /// * `Ok((instance, type_name))` - The erased instance (always an
    ///   `Arc<Arc<T>>` behind `dyn Any`) and the name of `T`
    /// * `Err(DiError)` - Not found, provider failure, cycle, ...
    fn resolve_any(
        &self,
        name: &str,
        caller: Frame,
    ) -> DiResult<(Arc<dyn Any + Send + Sync>, &'static str)>;
}

/// Typed invocation interface.
///
/// Services registered without a name are keyed by [`name_of::<T>()`](name_of),
/// so `invoke::<T>()` finds them; named services need `invoke_named`.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{Resolver, Scope};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let scope = Scope::new();
/// scope.provide_value(42usize).unwrap();
/// scope.provide_value(ConsoleLogger).unwrap();
/// scope.as_alias::<ConsoleLogger, dyn Logger>(|l| l as Arc<dyn Logger>).unwrap();
///
/// assert_eq!(*scope.invoke::<usize>().unwrap(), 42);
///
/// let logger = scope.invoke::<dyn Logger>().unwrap();
/// logger.log("service invoked through its interface");
/// ```
pub trait Resolver: ResolverCore {
    /// Invokes the service registered under `name_of::<T>()`.
    #[track_caller]
    fn invoke<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.invoke_named::<T>(name_of::<T>())
    }

    /// Invokes the service called `name`, checking that it produces `T`.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the service exists but produces another type.
    #[track_caller]
    fn invoke_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        let (instance, actual) = self.resolve_any(name, Frame::caller())?;
        instance
            .downcast::<Arc<T>>()
            .map(|typed| Arc::clone(typed.as_ref()))
            .map_err(|_| DiError::TypeMismatch { declared: name_of::<T>(), actual })
    }

    /// Like [`invoke`](Self::invoke), panicking on error.
    ///
    /// # Panics
    ///
    /// Panics with the error's message if the invocation fails.
    #[track_caller]
    fn must_invoke<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.must_invoke_named::<T>(name_of::<T>())
    }

    /// Like [`invoke_named`](Self::invoke_named), panicking on error.
    ///
    /// # Panics
    ///
    /// Panics with the error's message if the invocation fails.
    #[track_caller]
    fn must_invoke_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Arc<T> {
        match self.invoke_named::<T>(name) {
            Ok(instance) => instance,
            Err(error) => panic!("{}", error),
        }
    }
}
