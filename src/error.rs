//! Error types for the scoped injection runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::key::ServiceRef;

/// Boxed error returned by providers and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared, cloneable error produced by a health-check or shutdown hook.
pub type HookError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Represents the various error conditions that can occur during service
/// registration, resolution, or scope lifecycle operations.
///
/// # Examples
///
/// ```rust
/// use ferrous_scopes::{DiError, Resolver, Scope};
///
/// let scope = Scope::new();
/// scope.provide_named_value("port", 8080u16).unwrap();
///
/// match scope.invoke_named::<u16>("host") {
///     Err(DiError::ServiceNotFound { name, known }) => {
///         assert_eq!(name, "host");
///         assert_eq!(known, vec!["port".to_string()]);
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// A service with this name already exists in the local registry
    #[error("DI: service `{0}` has already been declared")]
    DuplicateService(String),
    /// No scope in the resolution chain declares the service
    #[error("DI: could not find service `{name}`, available services: {}", format_names(.known))]
    ServiceNotFound {
        /// Requested service name
        name: String,
        /// Every name visible from the scope the lookup started at
        known: Vec<String>,
    },
    /// The resolved instance is not of the requested or declared type
    #[error("DI: service found, but type mismatch: invoking `{declared}` but registered `{actual}`")]
    TypeMismatch {
        /// Type the caller asked for
        declared: &'static str,
        /// Type the descriptor actually produces
        actual: &'static str,
    },
    /// The provider panicked while building the service
    #[error("DI: provider of `{name}` panicked: {cause}")]
    ProviderFailure {
        /// Service whose provider panicked
        name: String,
        /// Panic payload rendered as text
        cause: String,
    },
    /// The provider returned an error
    #[error("DI: provider of `{name}` failed: {source}")]
    ProviderError {
        /// Service whose provider failed
        name: String,
        /// Error returned by the provider
        #[source]
        source: HookError,
    },
    /// Circular dependency detected (includes path)
    #[error("DI: circular dependency detected: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("DI: max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// One or more lifecycle hooks failed during a sweep
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl DiError {
    pub(crate) fn not_found(name: impl Into<String>, known: Vec<String>) -> Self {
        DiError::ServiceNotFound { name: name.into(), known }
    }

    /// Returns the service name this error is about, when there is one.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            DiError::DuplicateService(name) => Some(name),
            DiError::ServiceNotFound { name, .. }
            | DiError::ProviderFailure { name, .. }
            | DiError::ProviderError { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        return "none".to_string();
    }
    names
        .iter()
        .map(|name| format!("`{}`", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;

/// Per-service failures collected by a health-check or shutdown sweep.
///
/// A sweep never stops at the first failing hook; every service is visited
/// and each failure is recorded under the service that produced it.
#[derive(Debug, Clone, Default)]
pub struct AggregateError {
    errors: BTreeMap<ServiceRef, HookError>,
}

impl AggregateError {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, service: ServiceRef, error: HookError) {
        self.errors.insert(service, error);
    }

    pub(crate) fn merge(&mut self, other: AggregateError) {
        self.errors.extend(other.errors);
    }

    pub(crate) fn into_result(self) -> Result<(), AggregateError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Number of failed services.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when no service failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failure of the service called `name`, in any scope of the sweep.
    pub fn get(&self, name: &str) -> Option<&HookError> {
        self.errors
            .iter()
            .find(|(service, _)| service.service == name)
            .map(|(_, error)| error)
    }

    /// Iterates over failures in scope-id, then service-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ServiceRef, &HookError)> {
        self.errors.iter()
    }

    /// Consumes the aggregate, returning the underlying map.
    pub fn into_map(self) -> BTreeMap<ServiceRef, HookError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DI: {} service(s) failed:", self.errors.len())?;
        for (service, error) in &self.errors {
            write!(f, "\n  - {}: {}", service, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Error payload for a hook that panicked instead of returning.
#[derive(Debug, Clone, thiserror::Error)]
#[error("hook panicked: {0}")]
pub struct HookPanic(pub String);
