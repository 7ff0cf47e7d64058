//! Core traits: capability hooks and resolution.

mod health;
mod resolver;
mod shutdown;

pub use health::{HealthCheck, HealthCheckWithContext};
pub use resolver::{Resolver, ResolverCore};
pub use shutdown::{Shutdown, ShutdownWithContext, ShutdownWithContextAndError, ShutdownWithError};
