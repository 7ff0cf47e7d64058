//! Registration API.

use std::sync::Arc;

use crate::capabilities::Capabilities;
use crate::error::{BoxError, DiResult};
use crate::invocation::Frame;
use crate::key::name_of;
use crate::service::{AliasService, LazyService, ServiceEntry, TransientService, ValueService};
use crate::traits::{
    HealthCheck, HealthCheckWithContext, Shutdown, ShutdownWithContext,
    ShutdownWithContextAndError, ShutdownWithError,
};

use super::Scope;

/// Fluent registration of one service of type `T`.
///
/// Created by [`Scope::service`]. Choose a name (default `name_of::<T>()`),
/// declare the lifecycle hooks the type supports, then finish with a policy:
/// `value`, `lazy` or `transient` (or their `_arc` forms for unsized types
/// such as trait objects).
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{BoxError, CancellationToken, HealthCheck, Resolver, Scope, Shutdown};
///
/// struct Pool;
///
/// impl HealthCheck for Pool {
///     fn health_check(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
///
/// impl Shutdown for Pool {
///     fn shutdown(&self) {}
/// }
///
/// let scope = Scope::new();
/// scope.service::<Pool>()
///     .named("primary-pool")
///     .health_check()
///     .shutdown()
///     .lazy(|_| Ok(Pool))
///     .unwrap();
///
/// scope.invoke_named::<Pool>("primary-pool").unwrap();
/// let token = CancellationToken::new();
/// assert!(scope.health_check(&token).is_ok());
/// assert!(scope.shutdown(&token).is_ok());
/// ```
#[must_use = "a service is only registered once a policy method is called"]
pub struct ServiceBuilder<'s, T: ?Sized> {
    scope: &'s Scope,
    name: Option<String>,
    replace: bool,
    capabilities: Capabilities<T>,
    frame: Frame,
}

impl Scope {
    /// Starts registering a service of type `T` in this scope.
    #[track_caller]
    pub fn service<T: ?Sized + Send + Sync + 'static>(&self) -> ServiceBuilder<'_, T> {
        ServiceBuilder {
            scope: self,
            name: None,
            replace: false,
            capabilities: Capabilities::new(),
            frame: Frame::caller(),
        }
    }
}

impl<'s, T: ?Sized + Send + Sync + 'static> ServiceBuilder<'s, T> {
    /// Registers under `name` instead of `name_of::<T>()`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces an existing local registration instead of failing with
    /// `DuplicateService`.
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Uses a prepared probe list, replacing any hooks declared so far.
    pub fn capabilities(mut self, capabilities: Capabilities<T>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn health_check(mut self) -> Self
    where
        T: HealthCheck,
    {
        self.capabilities = self.capabilities.health_check();
        self
    }

    pub fn health_check_with_context(mut self) -> Self
    where
        T: HealthCheckWithContext,
    {
        self.capabilities = self.capabilities.health_check_with_context();
        self
    }

    pub fn shutdown(mut self) -> Self
    where
        T: Shutdown,
    {
        self.capabilities = self.capabilities.shutdown();
        self
    }

    pub fn shutdown_with_error(mut self) -> Self
    where
        T: ShutdownWithError,
    {
        self.capabilities = self.capabilities.shutdown_with_error();
        self
    }

    pub fn shutdown_with_context(mut self) -> Self
    where
        T: ShutdownWithContext,
    {
        self.capabilities = self.capabilities.shutdown_with_context();
        self
    }

    pub fn shutdown_with_context_and_error(mut self) -> Self
    where
        T: ShutdownWithContextAndError,
    {
        self.capabilities = self.capabilities.shutdown_with_context_and_error();
        self
    }

    fn service_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| name_of::<T>().to_string())
    }

    fn finish(self, entry: Arc<dyn ServiceEntry>) -> DiResult<()> {
        self.scope.register(entry, self.replace)
    }

    /// Registers an already built, shared instance.
    pub fn value_arc(self, instance: Arc<T>) -> DiResult<()> {
        let entry =
            ValueService::new(self.service_name(), instance, self.capabilities.clone(), self.frame);
        self.finish(Arc::new(entry))
    }

    /// Registers a provider run at most once, on first invocation.
    pub fn lazy_arc<F>(self, provider: F) -> DiResult<()>
    where
        F: Fn(&Scope) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let entry = LazyService::new(
            self.service_name(),
            Arc::new(provider),
            self.capabilities.clone(),
            self.frame,
            self.scope.options().trace_capacity(),
        );
        self.finish(Arc::new(entry))
    }

    /// Registers a provider run on every invocation. Declared hooks are
    /// ignored: a transient instance is owned by its caller.
    pub fn transient_arc<F>(self, provider: F) -> DiResult<()>
    where
        F: Fn(&Scope) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let entry = TransientService::new(self.service_name(), Arc::new(provider), self.frame);
        self.finish(Arc::new(entry))
    }
}

impl<'s, T: Send + Sync + 'static> ServiceBuilder<'s, T> {
    /// Registers an already built instance.
    pub fn value(self, instance: T) -> DiResult<()> {
        self.value_arc(Arc::new(instance))
    }

    /// Registers a provider run at most once, on first invocation.
    pub fn lazy<F>(self, provider: F) -> DiResult<()>
    where
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.lazy_arc(move |scope| provider(scope).map(Arc::new))
    }

    /// Registers a provider run on every invocation.
    pub fn transient<F>(self, provider: F) -> DiResult<()>
    where
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.transient_arc(move |scope| provider(scope).map(Arc::new))
    }
}

// Shorthands mirroring the builder for the common cases. All of them record
// the caller as the registration site.
impl Scope {
    /// Registers a lazy service named after `T`.
    #[track_caller]
    pub fn provide<T, F>(&self, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().lazy(provider)
    }

    #[track_caller]
    pub fn provide_named<T, F>(&self, name: impl Into<String>, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().named(name).lazy(provider)
    }

    /// Registers a value named after `T`.
    #[track_caller]
    pub fn provide_value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        self.service::<T>().value(value)
    }

    #[track_caller]
    pub fn provide_named_value<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
        value: T,
    ) -> DiResult<()> {
        self.service::<T>().named(name).value(value)
    }

    /// Registers a transient service named after `T`.
    #[track_caller]
    pub fn provide_transient<T, F>(&self, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().transient(provider)
    }

    #[track_caller]
    pub fn provide_named_transient<T, F>(
        &self,
        name: impl Into<String>,
        provider: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().named(name).transient(provider)
    }

    /// Like [`provide`](Self::provide), replacing an existing local entry.
    #[track_caller]
    pub fn override_provide<T, F>(&self, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().replace().lazy(provider)
    }

    #[track_caller]
    pub fn override_named<T, F>(&self, name: impl Into<String>, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().named(name).replace().lazy(provider)
    }

    #[track_caller]
    pub fn override_value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        self.service::<T>().replace().value(value)
    }

    #[track_caller]
    pub fn override_named_value<T: Send + Sync + 'static>(
        &self,
        name: impl Into<String>,
        value: T,
    ) -> DiResult<()> {
        self.service::<T>().named(name).replace().value(value)
    }

    #[track_caller]
    pub fn override_transient<T, F>(&self, provider: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().replace().transient(provider)
    }

    #[track_caller]
    pub fn override_named_transient<T, F>(
        &self,
        name: impl Into<String>,
        provider: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.service::<T>().named(name).replace().transient(provider)
    }

    /// Exposes the service named after `T` as `I`, under `name_of::<I>()`.
    ///
    /// The target does not need to exist yet; it is looked up and checked on
    /// each invocation of the alias.
    #[track_caller]
    pub fn as_alias<T, I>(
        &self,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        self.as_named_alias::<T, I>(name_of::<T>(), name_of::<I>(), cast)
    }

    /// Exposes the service `target` as `I`, under `name_of::<I>()`.
    #[track_caller]
    pub fn bind_alias<T, I>(
        &self,
        target: impl Into<String>,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        self.as_named_alias::<T, I>(target, name_of::<I>(), cast)
    }

    /// Exposes the service `target` (producing `T`) as `I` under `alias`.
    #[track_caller]
    pub fn as_named_alias<T, I>(
        &self,
        target: impl Into<String>,
        alias: impl Into<String>,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        let entry =
            AliasService::<T, I>::new(alias.into(), target.into(), Arc::new(cast), Frame::caller());
        self.register(Arc::new(entry), false)
    }

    /// Like [`as_alias`](Self::as_alias), panicking on error.
    ///
    /// # Panics
    ///
    /// Panics if the alias name is already registered in this scope.
    #[track_caller]
    pub fn must_as_alias<T, I>(&self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static)
    where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        self.must_as_named_alias::<T, I>(name_of::<T>(), name_of::<I>(), cast)
    }

    /// Like [`bind_alias`](Self::bind_alias), panicking on error.
    ///
    /// # Panics
    ///
    /// Panics if the alias name is already registered in this scope.
    #[track_caller]
    pub fn must_bind_alias<T, I>(
        &self,
        target: impl Into<String>,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        self.must_as_named_alias::<T, I>(target, name_of::<I>(), cast)
    }

    /// Like [`as_named_alias`](Self::as_named_alias), panicking on error.
    ///
    /// # Panics
    ///
    /// Panics if `alias` is already registered in this scope.
    #[track_caller]
    pub fn must_as_named_alias<T, I>(
        &self,
        target: impl Into<String>,
        alias: impl Into<String>,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) where
        T: ?Sized + Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        if let Err(error) = self.as_named_alias::<T, I>(target, alias, cast) {
            panic!("{}", error);
        }
    }
}
