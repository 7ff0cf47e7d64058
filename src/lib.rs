//! # ferrous-scopes
//!
//! Hierarchical, scope-based dependency injection for Rust.
//!
//! ## Features
//!
//! - **Scope tree**: child scopes shadow their ancestors, siblings are isolated
//! - **Four service kinds**: Value, Lazy, Transient, and Alias
//! - **At-most-once builds**: concurrent first invocations share one build
//! - **Lifecycle hooks**: health checks and shutdown across a whole subtree
//! - **Panic containment**: a panicking provider becomes an error, not a crash
//! - **Circular dependency detection**: with the full path in the error, even
//!   when the cycle spans threads
//! - **Introspection**: invocation call sites, build times, tree dumps
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_scopes::{Resolver, Scope};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let scope = Scope::new();
//! scope.provide_value(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! }).unwrap();
//! scope.provide(|scope| {
//!     Ok(UserService { db: scope.invoke::<Database>()? })
//! }).unwrap();
//!
//! let users = scope.invoke::<UserService>().unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Kinds
//!
//! - **Value**: built by the caller, registered as is
//! - **Lazy**: built on first invocation, cached until the scope shuts down
//! - **Transient**: built on every invocation
//! - **Alias**: another service exposed under a different type, usually a
//!   trait object
//!
//! ## Trait Objects
//!
//! ```rust
//! use ferrous_scopes::{Resolver, Scope};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("[LOG] {}", message);
//!     }
//! }
//!
//! let scope = Scope::new();
//! scope.provide(|_| Ok(ConsoleLogger)).unwrap();
//! scope.as_alias::<ConsoleLogger, dyn Logger>(|logger| logger as Arc<dyn Logger>).unwrap();
//!
//! let logger = scope.invoke::<dyn Logger>().unwrap();
//! logger.log("Hello, World!");
//! ```
//!
//! ## Lifecycle
//!
//! ```rust
//! use ferrous_scopes::{CancellationToken, Resolver, Scope, Shutdown};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! static CLOSED: AtomicUsize = AtomicUsize::new(0);
//!
//! struct Connection;
//! impl Shutdown for Connection {
//!     fn shutdown(&self) {
//!         CLOSED.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let root = Scope::new();
//! let request = root.scope("request");
//! request.service::<Connection>().shutdown().lazy(|_| Ok(Connection)).unwrap();
//!
//! request.invoke::<Connection>().unwrap();
//! root.shutdown(&CancellationToken::new()).unwrap();
//! assert_eq!(CLOSED.load(Ordering::SeqCst), 1);
//!
//! // The scope stays usable: the next invocation builds a fresh connection.
//! request.invoke::<Connection>().unwrap();
//! ```

// Module declarations
pub mod cancellation;
pub mod capabilities;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod explain;
pub mod invocation;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod package;
pub mod scope;
pub mod traits;

// Internal modules
mod internal;
mod registration;
mod service;

// Re-export core types
pub use cancellation::{CancellationToken, Cancelled};
pub use capabilities::{Capabilities, HealthSignature, ShutdownSignature};
pub use config::{ConfigError, InjectorOptions, InjectorSettings, DEFAULT_MAX_DEPTH};
pub use descriptors::ServiceDescription;
pub use error::{AggregateError, BoxError, DiError, DiResult, HookError, HookPanic};
pub use explain::ScopeExplanation;
pub use invocation::{Frame, DEFAULT_TRACE_CAPACITY};
pub use key::{name_of, ServiceRef};
pub use lifetime::ServiceKind;
pub use observer::ScopeObserver;
pub use package::{Package, ServiceModule};
pub use scope::{global, Scope, ServiceBuilder, ROOT_SCOPE_NAME};
pub use traits::{
    HealthCheck, HealthCheckWithContext, Resolver, ResolverCore, Shutdown, ShutdownWithContext,
    ShutdownWithContextAndError, ShutdownWithError,
};
