//! Pre-built value services.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::cancellation::CancellationToken;
use crate::capabilities::Capabilities;
use crate::descriptors::ServiceDescription;
use crate::error::{DiResult, HookError};
use crate::invocation::Frame;
use crate::lifetime::ServiceKind;
use crate::scope::Scope;

use super::{erase, hook_error, next_build_stamp, AnyArc, ServiceEntry};

/// Holds an instance built by the caller.
///
/// A value is "armed" while in use: shutdown runs its hook once and disarms
/// it, and the next invocation re-arms it. The instance itself stays
/// registered so the scope remains usable after shutdown.
pub(crate) struct ValueService<T: ?Sized> {
    name: String,
    instance: Arc<T>,
    capabilities: Capabilities<T>,
    armed: AtomicBool,
    stamp: AtomicU64,
    frame: Frame,
}

impl<T: ?Sized + Send + Sync + 'static> ValueService<T> {
    pub(crate) fn new(
        name: String,
        instance: Arc<T>,
        capabilities: Capabilities<T>,
        frame: Frame,
    ) -> Self {
        Self {
            name,
            instance,
            capabilities,
            armed: AtomicBool::new(true),
            stamp: AtomicU64::new(next_build_stamp()),
            frame,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> ServiceEntry for ValueService<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Value
    }

    fn instance(&self, _scope: &Scope, _caller: Frame) -> DiResult<AnyArc> {
        if !self.armed.swap(true, Ordering::AcqRel) {
            self.stamp.store(next_build_stamp(), Ordering::Release);
        }
        Ok(erase(self.instance.clone()))
    }

    fn is_built(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    fn build_stamp(&self) -> u64 {
        if self.is_built() {
            self.stamp.load(Ordering::Acquire)
        } else {
            0
        }
    }

    fn is_health_checker(&self, _scope: &Scope) -> bool {
        self.capabilities.is_health_checker()
    }

    fn health_check(&self, _scope: &Scope, token: &CancellationToken) -> Result<(), HookError> {
        self.capabilities
            .run_health_check(&self.instance, token)
            .map_err(hook_error)
    }

    fn is_shutdowner(&self) -> bool {
        self.capabilities.is_shutdowner()
    }

    fn shutdown(&self, token: &CancellationToken) -> Result<(), HookError> {
        if !self.armed.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.capabilities
            .run_shutdown(&self.instance, token)
            .map_err(hook_error)
    }

    fn clone_reset(&self) -> Arc<dyn ServiceEntry> {
        Arc::new(Self::new(
            self.name.clone(),
            self.instance.clone(),
            self.capabilities.clone(),
            self.frame,
        ))
    }

    fn describe(&self, scope: &Scope) -> ServiceDescription {
        let mut description =
            ServiceDescription::new(scope.service_ref(&self.name), self.type_name(), self.kind());
        description.built = self.is_built();
        description.is_health_checker = self.capabilities.is_health_checker();
        description.is_shutdowner = self.capabilities.is_shutdowner();
        description.provider_frame = Some(self.frame);
        description
    }
}
