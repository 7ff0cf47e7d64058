//! Service descriptors: one named unit of construction logic per entry.
//!
//! Each lifecycle policy is its own generic type; the registry stores them
//! behind the object-safe [`ServiceEntry`] trait.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cancellation::CancellationToken;
use crate::descriptors::ServiceDescription;
use crate::error::{BoxError, DiResult, HookError};
use crate::invocation::Frame;
use crate::lifetime::ServiceKind;
use crate::scope::Scope;

mod alias;
mod lazy;
mod transient;
mod value;

pub(crate) use alias::AliasService;
pub(crate) use lazy::LazyService;
pub(crate) use transient::TransientService;
pub(crate) use value::ValueService;

/// Type-erased instance. Always wraps an `Arc<T>` so that sized types and
/// trait objects share one representation.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Provider stored by lazy and transient descriptors.
pub(crate) type ProviderFn<T> = Arc<dyn Fn(&Scope) -> Result<Arc<T>, BoxError> + Send + Sync>;

static BUILD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Monotonic stamp used to tear services down in reverse build order.
pub(crate) fn next_build_stamp() -> u64 {
    BUILD_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> AnyArc {
    Arc::new(instance)
}

/// Object-safe view of a descriptor, whatever its policy.
///
/// `scope` is always the scope that owns the descriptor: providers run
/// against it and aliases resolve their target from it.
pub(crate) trait ServiceEntry: Send + Sync {
    fn name(&self) -> &str;

    fn type_name(&self) -> &'static str;

    fn kind(&self) -> ServiceKind;

    /// Produces (or replays) the instance.
    fn instance(&self, scope: &Scope, caller: Frame) -> DiResult<AnyArc>;

    /// Whether an instance currently exists that lifecycle hooks apply to.
    fn is_built(&self) -> bool;

    /// Stamp of the current build; 0 when nothing is built.
    fn build_stamp(&self) -> u64;

    fn is_health_checker(&self, scope: &Scope) -> bool;

    fn health_check(&self, scope: &Scope, token: &CancellationToken) -> Result<(), HookError>;

    fn is_shutdowner(&self) -> bool;

    /// Runs the shutdown hook of a built instance and resets build state,
    /// whatever the hook returns.
    fn shutdown(&self, token: &CancellationToken) -> Result<(), HookError>;

    /// Independent copy with the same provider/target and a reset build state.
    fn clone_reset(&self) -> Arc<dyn ServiceEntry>;

    fn describe(&self, scope: &Scope) -> ServiceDescription;
}

pub(crate) fn hook_error(error: BoxError) -> HookError {
    Arc::from(error)
}
