//! Health-check capability traits.

use crate::cancellation::CancellationToken;
use crate::error::BoxError;

/// Trait for services that can report their own health.
///
/// Implement this trait and declare it at registration time (see
/// [`ServiceBuilder::health_check`](crate::ServiceBuilder::health_check)) so
/// that [`Scope::health_check`](crate::Scope::health_check) probes the built
/// instance.
///
/// # Examples
///
/// ```
/// use ferrous_scopes::{BoxError, CancellationToken, HealthCheck, Scope};
///
/// struct Database {
///     connected: bool,
/// }
///
/// impl HealthCheck for Database {
///     fn health_check(&self) -> Result<(), BoxError> {
///         if self.connected {
///             Ok(())
///         } else {
///             Err("database disconnected".into())
///         }
///     }
/// }
///
/// let scope = Scope::new();
/// scope.service::<Database>()
///     .health_check()
///     .value(Database { connected: false })
///     .unwrap();
///
/// let report = scope.health_check(&CancellationToken::new()).unwrap_err();
/// assert!(report.get(ferrous_scopes::name_of::<Database>()).is_some());
/// ```
pub trait HealthCheck: Send + Sync {
    /// Checks the service, returning an error when it is unhealthy.
    fn health_check(&self) -> Result<(), BoxError>;
}

/// Context-aware variant of [`HealthCheck`].
///
/// Preferred over [`HealthCheck`] when an instance declares both.
pub trait HealthCheckWithContext: Send + Sync {
    /// Checks the service, honouring cancellation of `token`.
    fn health_check(&self, token: &CancellationToken) -> Result<(), BoxError>;
}
