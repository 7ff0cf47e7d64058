//! Packages: reusable bundles of registrations.
//!
//! A package groups the registrations of one feature so that it can be
//! installed into any scope, as often as needed.
//!
//! # Examples
//!
//! ```
//! use ferrous_scopes::{package, Package, Resolver, Scope};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Repository { config: Arc<Config> }
//!
//! let storage = Package::new("storage")
//!     .with(package::eager(Config { url: "sqlite::memory:".to_string() }))
//!     .with(package::lazy(|scope: &Scope| {
//!         Ok(Repository { config: scope.invoke::<Config>()? })
//!     }));
//!
//! let scope = Scope::new_with_packages(&[storage]).unwrap();
//! assert_eq!(scope.invoke::<Repository>().unwrap().config.url, "sqlite::memory:");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiResult};
use crate::scope::Scope;

/// A unit of registration logic.
///
/// Implemented for every `Fn(&Scope) -> DiResult<()>`, so plain closures and
/// functions work as modules.
pub trait ServiceModule: Send + Sync {
    /// Registers this module's services in `scope`.
    fn register_services(&self, scope: &Scope) -> DiResult<()>;
}

impl<F> ServiceModule for F
where
    F: Fn(&Scope) -> DiResult<()> + Send + Sync,
{
    fn register_services(&self, scope: &Scope) -> DiResult<()> {
        self(scope)
    }
}

/// Ordered list of modules installed together.
#[derive(Clone)]
pub struct Package {
    name: String,
    modules: Vec<Arc<dyn ServiceModule>>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), modules: Vec::new() }
    }

    /// Appends a module.
    pub fn with(mut self, module: impl ServiceModule + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Runs every module against `scope`, stopping at the first error.
    pub fn register(&self, scope: &Scope) -> DiResult<()> {
        tracing::debug!(
            scope = %scope.name(),
            package = %self.name,
            modules = self.modules.len(),
            "installing package"
        );
        for module in &self.modules {
            module.register_services(scope)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("modules", &self.modules.len())
            .finish()
    }
}

/// Module registering a lazy service named after `T`.
pub fn lazy<T, F>(provider: F) -> impl ServiceModule
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    let provider = Arc::new(provider);
    move |scope: &Scope| {
        let provider = provider.clone();
        scope.service::<T>().lazy(move |s| provider(s))
    }
}

/// Module registering a lazy service under `name`.
pub fn lazy_named<T, F>(name: &str, provider: F) -> impl ServiceModule
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    let name = name.to_string();
    let provider = Arc::new(provider);
    move |scope: &Scope| {
        let provider = provider.clone();
        scope.service::<T>().named(name.clone()).lazy(move |s| provider(s))
    }
}

/// Module registering a value named after `T`. Every scope the package is
/// installed into shares the same instance.
pub fn eager<T: Send + Sync + 'static>(value: T) -> impl ServiceModule {
    let value = Arc::new(value);
    move |scope: &Scope| scope.service::<T>().value_arc(value.clone())
}

/// Module registering a value under `name`.
pub fn eager_named<T: Send + Sync + 'static>(name: &str, value: T) -> impl ServiceModule {
    let name = name.to_string();
    let value = Arc::new(value);
    move |scope: &Scope| scope.service::<T>().named(name.clone()).value_arc(value.clone())
}

/// Module registering a transient service named after `T`.
pub fn transient<T, F>(provider: F) -> impl ServiceModule
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    let provider = Arc::new(provider);
    move |scope: &Scope| {
        let provider = provider.clone();
        scope.service::<T>().transient(move |s| provider(s))
    }
}

/// Module registering a transient service under `name`.
pub fn transient_named<T, F>(name: &str, provider: F) -> impl ServiceModule
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    let name = name.to_string();
    let provider = Arc::new(provider);
    move |scope: &Scope| {
        let provider = provider.clone();
        scope.service::<T>().named(name.clone()).transient(move |s| provider(s))
    }
}

/// Module exposing the service named after `T` as `I`.
pub fn bind<T, I>(cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> impl ServiceModule
where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    let cast = Arc::new(cast);
    move |scope: &Scope| {
        let cast = cast.clone();
        scope.as_alias::<T, I>(move |instance| cast(instance))
    }
}

/// Module exposing the service `target` as `I` under `alias`.
pub fn bind_named<T, I>(
    target: &str,
    alias: &str,
    cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
) -> impl ServiceModule
where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    let target = target.to_string();
    let alias = alias.to_string();
    let cast = Arc::new(cast);
    move |scope: &Scope| {
        let cast = cast.clone();
        scope.as_named_alias::<T, I>(target.clone(), alias.clone(), move |instance| cast(instance))
    }
}
