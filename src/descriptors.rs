//! Service descriptions for introspection and diagnostics.

use std::time::Duration;

use crate::invocation::Frame;
use crate::key::ServiceRef;
use crate::lifetime::ServiceKind;

/// Snapshot of a registered service for debugging and introspection
///
/// Produced by [`Scope::describe`](crate::Scope::describe),
/// [`Scope::resolve`](crate::Scope::resolve) and the listing operations. It is
/// a copy: later builds or shutdowns do not update it.
///
/// # Use Cases
///
/// - **Debugging**: which scope answers a name, and whether it was built
/// - **Diagnostics**: who invokes a singleton and how often
/// - **Health checks**: which services expose lifecycle hooks
///
/// # Examples
///
/// ```rust
/// use ferrous_scopes::{Resolver, Scope, ServiceKind};
///
/// struct Config { port: u16 }
///
/// let root = Scope::new();
/// root.provide(|_| Ok(Config { port: 8080 })).unwrap();
/// let child = root.scope("api");
///
/// let name = ferrous_scopes::name_of::<Config>();
/// let before = child.resolve(name).unwrap();
/// assert_eq!(before.kind, ServiceKind::Lazy);
/// assert_eq!(before.owner.scope_id, root.id());
/// assert!(!before.built);
///
/// child.invoke::<Config>().unwrap();
/// let after = root.describe(name).unwrap();
/// assert!(after.built);
/// assert_eq!(after.invocation_count, 1);
/// assert!(after.build_time.is_some());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServiceDescription {
    /// Scope owning the descriptor, and the service name within it
    pub owner: ServiceRef,
    /// Name of the produced type (the alias type for aliases)
    pub type_name: &'static str,
    /// Lifecycle policy
    pub kind: ServiceKind,
    /// Whether an instance currently exists
    pub built: bool,
    /// Duration of the current build (lazy services only)
    pub build_time: Option<Duration>,
    /// Whether the built instance exposes a health hook
    pub is_health_checker: bool,
    /// Whether the built instance exposes a shutdown hook
    pub is_shutdowner: bool,
    /// Target service name (aliases only)
    pub target: Option<String>,
    /// Where the service was registered
    pub provider_frame: Option<Frame>,
    /// Distinct call sites that invoked the service, up to the trace capacity
    pub invocation_frames: Vec<Frame>,
    /// Total invocations, including those past the trace capacity
    pub invocation_count: u64,
}

impl ServiceDescription {
    pub(crate) fn new(owner: ServiceRef, type_name: &'static str, kind: ServiceKind) -> Self {
        Self {
            owner,
            type_name,
            kind,
            built: false,
            build_time: None,
            is_health_checker: false,
            is_shutdowner: false,
            target: None,
            provider_frame: None,
            invocation_frames: Vec::new(),
            invocation_count: 0,
        }
    }

    /// Service name within its owning scope.
    pub fn name(&self) -> &str {
        &self.owner.service
    }
}
