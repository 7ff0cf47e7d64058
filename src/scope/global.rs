//! Process-wide default scope.
//!
//! Application code that does not want to thread a [`Scope`] through every
//! layer can use the default root scope. It is created on first use, safely
//! from any number of threads, and can be replaced with
//! [`set_default_scope`]. The free functions in this module take an
//! `Option<&Scope>` and fall back to the default when given `None`; the core
//! API never consults it.
//!
//! # Examples
//!
//! ```
//! use ferrous_scopes::global;
//!
//! struct Settings { verbose: bool }
//!
//! let scope = ferrous_scopes::Scope::new();
//! global::provide_value(Some(&scope), Settings { verbose: true }).unwrap();
//! assert!(global::invoke::<Settings>(Some(&scope)).unwrap().verbose);
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cancellation::CancellationToken;
use crate::error::{AggregateError, BoxError, DiResult};
use crate::traits::Resolver;

use super::Scope;

static DEFAULT_SCOPE: Lazy<RwLock<Scope>> = Lazy::new(|| RwLock::new(Scope::new()));

/// The current default root scope.
pub fn default_scope() -> Scope {
    DEFAULT_SCOPE.read().clone()
}

/// Replaces the default root scope, returning the previous one. The previous
/// scope is not shut down.
pub fn set_default_scope(scope: Scope) -> Scope {
    std::mem::replace(&mut *DEFAULT_SCOPE.write(), scope)
}

/// Replaces the default root scope with a fresh one, returning the previous.
pub fn reset_default_scope() -> Scope {
    set_default_scope(Scope::new())
}

/// `scope`, or the default root scope.
pub fn scope_or_default(scope: Option<&Scope>) -> Scope {
    match scope {
        Some(scope) => scope.clone(),
        None => default_scope(),
    }
}

#[track_caller]
pub fn provide<T, F>(scope: Option<&Scope>, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).provide(provider)
}

#[track_caller]
pub fn provide_named<T, F>(scope: Option<&Scope>, name: &str, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).provide_named(name, provider)
}

#[track_caller]
pub fn provide_value<T: Send + Sync + 'static>(scope: Option<&Scope>, value: T) -> DiResult<()> {
    scope_or_default(scope).provide_value(value)
}

#[track_caller]
pub fn provide_named_value<T: Send + Sync + 'static>(
    scope: Option<&Scope>,
    name: &str,
    value: T,
) -> DiResult<()> {
    scope_or_default(scope).provide_named_value(name, value)
}

#[track_caller]
pub fn provide_transient<T, F>(scope: Option<&Scope>, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).provide_transient(provider)
}

#[track_caller]
pub fn provide_named_transient<T, F>(scope: Option<&Scope>, name: &str, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).provide_named_transient(name, provider)
}

#[track_caller]
pub fn override_provide<T, F>(scope: Option<&Scope>, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).override_provide(provider)
}

#[track_caller]
pub fn override_named<T, F>(scope: Option<&Scope>, name: &str, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).override_named(name, provider)
}

#[track_caller]
pub fn override_value<T: Send + Sync + 'static>(scope: Option<&Scope>, value: T) -> DiResult<()> {
    scope_or_default(scope).override_value(value)
}

#[track_caller]
pub fn override_named_value<T: Send + Sync + 'static>(
    scope: Option<&Scope>,
    name: &str,
    value: T,
) -> DiResult<()> {
    scope_or_default(scope).override_named_value(name, value)
}

#[track_caller]
pub fn override_transient<T, F>(scope: Option<&Scope>, provider: F) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).override_transient(provider)
}

#[track_caller]
pub fn override_named_transient<T, F>(
    scope: Option<&Scope>,
    name: &str,
    provider: F,
) -> DiResult<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> Result<T, BoxError> + Send + Sync + 'static,
{
    scope_or_default(scope).override_named_transient(name, provider)
}

#[track_caller]
pub fn as_alias<T, I>(
    scope: Option<&Scope>,
    cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
) -> DiResult<()>
where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    scope_or_default(scope).as_alias::<T, I>(cast)
}

/// # Panics
///
/// Panics if the alias name is already registered.
#[track_caller]
pub fn must_as_alias<T, I>(
    scope: Option<&Scope>,
    cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
) where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    scope_or_default(scope).must_as_alias::<T, I>(cast)
}

#[track_caller]
pub fn invoke<T: ?Sized + Send + Sync + 'static>(scope: Option<&Scope>) -> DiResult<Arc<T>> {
    scope_or_default(scope).invoke::<T>()
}

#[track_caller]
pub fn invoke_named<T: ?Sized + Send + Sync + 'static>(
    scope: Option<&Scope>,
    name: &str,
) -> DiResult<Arc<T>> {
    scope_or_default(scope).invoke_named::<T>(name)
}

/// # Panics
///
/// Panics if the invocation fails.
#[track_caller]
pub fn must_invoke<T: ?Sized + Send + Sync + 'static>(scope: Option<&Scope>) -> Arc<T> {
    scope_or_default(scope).must_invoke::<T>()
}

/// # Panics
///
/// Panics if the invocation fails.
#[track_caller]
pub fn must_invoke_named<T: ?Sized + Send + Sync + 'static>(
    scope: Option<&Scope>,
    name: &str,
) -> Arc<T> {
    scope_or_default(scope).must_invoke_named::<T>(name)
}

pub fn health_check(
    scope: Option<&Scope>,
    token: &CancellationToken,
) -> Result<(), AggregateError> {
    scope_or_default(scope).health_check(token)
}

pub fn shutdown(scope: Option<&Scope>, token: &CancellationToken) -> Result<(), AggregateError> {
    scope_or_default(scope).shutdown(token)
}
