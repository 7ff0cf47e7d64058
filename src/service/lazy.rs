//! Lazily built, memoised services.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use crate::cancellation::CancellationToken;
use crate::capabilities::Capabilities;
use crate::descriptors::ServiceDescription;
use crate::error::{DiError, DiResult, HookError};
use crate::internal::{call_provider, BuilderCell, WaitGuard};
use crate::invocation::{Frame, InvocationTrace};
use crate::lifetime::ServiceKind;
use crate::scope::Scope;

use super::{erase, hook_error, next_build_stamp, AnyArc, ProviderFn, ServiceEntry};

// How long a blocked caller waits before looking for a cross-thread cycle again.
const WAIT_SLICE: Duration = Duration::from_millis(5);

/// Build state. The instance is present if and only if the service is built,
/// and every field is mutated under the descriptor's single lock.
struct LazyState<T: ?Sized> {
    instance: Option<Arc<T>>,
    build_time: Option<Duration>,
    stamp: u64,
    last_error: Option<DiError>,
    trace: InvocationTrace,
}

/// Builds its instance on first invocation and caches it until shutdown.
pub(crate) struct LazyService<T: ?Sized> {
    name: String,
    provider: ProviderFn<T>,
    capabilities: Capabilities<T>,
    frame: Frame,
    state: Mutex<LazyState<T>>,
    // Bumped on every failed build, read before waiting on the lock so that
    // callers queued behind a failing build share its error.
    failures: AtomicU64,
    builder: BuilderCell,
}

impl<T: ?Sized + Send + Sync + 'static> LazyService<T> {
    pub(crate) fn new(
        name: String,
        provider: ProviderFn<T>,
        capabilities: Capabilities<T>,
        frame: Frame,
        trace_capacity: usize,
    ) -> Self {
        Self {
            name,
            provider,
            capabilities,
            frame,
            state: Mutex::new(LazyState {
                instance: None,
                build_time: None,
                stamp: 0,
                last_error: None,
                trace: InvocationTrace::new(trace_capacity),
            }),
            failures: AtomicU64::new(0),
            builder: BuilderCell::default(),
        }
    }

    /// Takes the state lock. While another thread holds it, the caller is
    /// registered in the wait-for graph and gives up with `Circular` once the
    /// holder turns out to be waiting, directly or not, on the caller.
    fn lock_state(&self, scope: &Scope) -> DiResult<MutexGuard<'_, LazyState<T>>> {
        if let Some(state) = self.state.try_lock() {
            return Ok(state);
        }

        let waiting = WaitGuard::enter(&self.builder, scope.id(), &self.name)?;
        loop {
            if let Some(state) = self.state.try_lock_for(WAIT_SLICE) {
                return Ok(state);
            }
            waiting.check()?;
        }
    }

    fn built_instance(&self) -> Option<Arc<T>> {
        self.state.lock().instance.clone()
    }
}

impl<T: ?Sized + Send + Sync + 'static> ServiceEntry for LazyService<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Lazy
    }

    fn instance(&self, scope: &Scope, caller: Frame) -> DiResult<AnyArc> {
        let failures_seen = self.failures.load(Ordering::Acquire);
        let mut state = self.lock_state(scope)?;
        state.trace.record(caller);

        if let Some(instance) = &state.instance {
            return Ok(erase(instance.clone()));
        }

        if self.failures.load(Ordering::Acquire) != failures_seen {
            if let Some(error) = &state.last_error {
                return Err(error.clone());
            }
        }

        let start = Instant::now();
        *self.builder.lock() = Some(thread::current().id());
        let built = call_provider(&self.name, || (self.provider)(scope));
        *self.builder.lock() = None;

        match built {
            Ok(instance) => {
                let elapsed = start.elapsed();
                state.instance = Some(instance.clone());
                state.build_time = Some(elapsed);
                state.stamp = next_build_stamp();
                state.last_error = None;
                drop(state);

                tracing::debug!(
                    scope = scope.name(),
                    service = %self.name,
                    ?elapsed,
                    "service built"
                );
                scope.observers().built(&scope.service_ref(&self.name), elapsed);
                Ok(erase(instance))
            }
            Err(error) => {
                state.last_error = Some(error.clone());
                self.failures.fetch_add(1, Ordering::AcqRel);
                drop(state);

                tracing::debug!(
                    scope = scope.name(),
                    service = %self.name,
                    %error,
                    "service build failed"
                );
                scope.observers().build_failed(&scope.service_ref(&self.name), &error);
                Err(error)
            }
        }
    }

    fn is_built(&self) -> bool {
        self.state.lock().instance.is_some()
    }

    fn build_stamp(&self) -> u64 {
        let state = self.state.lock();
        if state.instance.is_some() { state.stamp } else { 0 }
    }

    fn is_health_checker(&self, _scope: &Scope) -> bool {
        self.is_built() && self.capabilities.is_health_checker()
    }

    fn health_check(&self, _scope: &Scope, token: &CancellationToken) -> Result<(), HookError> {
        // The hook runs outside the lock so it may invoke other services.
        match self.built_instance() {
            Some(instance) => {
                self.capabilities.run_health_check(&instance, token).map_err(hook_error)
            }
            None => Ok(()),
        }
    }

    fn is_shutdowner(&self) -> bool {
        self.is_built() && self.capabilities.is_shutdowner()
    }

    fn shutdown(&self, token: &CancellationToken) -> Result<(), HookError> {
        // Waits for an in-flight build, then resets state before the hook
        // runs, so the descriptor is rebuildable whatever the hook returns.
        let taken = {
            let mut state = self.state.lock();
            state.build_time = None;
            state.stamp = 0;
            state.last_error = None;
            state.instance.take()
        };

        match taken {
            Some(instance) => self.capabilities.run_shutdown(&instance, token).map_err(hook_error),
            None => Ok(()),
        }
    }

    fn clone_reset(&self) -> Arc<dyn ServiceEntry> {
        let trace = self.state.lock().trace.reset();
        Arc::new(Self {
            name: self.name.clone(),
            provider: self.provider.clone(),
            capabilities: self.capabilities.clone(),
            frame: self.frame,
            state: Mutex::new(LazyState {
                instance: None,
                build_time: None,
                stamp: 0,
                last_error: None,
                trace,
            }),
            failures: AtomicU64::new(0),
            builder: BuilderCell::default(),
        })
    }

    fn describe(&self, scope: &Scope) -> ServiceDescription {
        let state = self.state.lock();
        let built = state.instance.is_some();
        let mut description =
            ServiceDescription::new(scope.service_ref(&self.name), self.type_name(), self.kind());
        description.built = built;
        description.build_time = state.build_time;
        description.is_health_checker = built && self.capabilities.is_health_checker();
        description.is_shutdowner = built && self.capabilities.is_shutdowner();
        description.provider_frame = Some(self.frame);
        description.invocation_frames = state.trace.frames();
        description.invocation_count = state.trace.count();
        description
    }
}
