//! Services whose provider runs on every invocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cancellation::CancellationToken;
use crate::descriptors::ServiceDescription;
use crate::error::{DiResult, HookError};
use crate::internal::call_provider;
use crate::invocation::Frame;
use crate::lifetime::ServiceKind;
use crate::scope::Scope;

use super::{erase, AnyArc, ProviderFn, ServiceEntry};

/// Calls its provider on every invocation. Nothing is cached, so there is
/// nothing to health-check or shut down.
pub(crate) struct TransientService<T: ?Sized> {
    name: String,
    provider: ProviderFn<T>,
    frame: Frame,
    invocations: AtomicU64,
}

impl<T: ?Sized + Send + Sync + 'static> TransientService<T> {
    pub(crate) fn new(name: String, provider: ProviderFn<T>, frame: Frame) -> Self {
        Self { name, provider, frame, invocations: AtomicU64::new(0) }
    }
}

impl<T: ?Sized + Send + Sync + 'static> ServiceEntry for TransientService<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Transient
    }

    fn instance(&self, scope: &Scope, _caller: Frame) -> DiResult<AnyArc> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let instance = call_provider(&self.name, || (self.provider)(scope))?;
        Ok(erase(instance))
    }

    fn is_built(&self) -> bool {
        false
    }

    fn build_stamp(&self) -> u64 {
        0
    }

    fn is_health_checker(&self, _scope: &Scope) -> bool {
        false
    }

    fn health_check(&self, _scope: &Scope, _token: &CancellationToken) -> Result<(), HookError> {
        Ok(())
    }

    fn is_shutdowner(&self) -> bool {
        false
    }

    fn shutdown(&self, _token: &CancellationToken) -> Result<(), HookError> {
        Ok(())
    }

    fn clone_reset(&self) -> Arc<dyn ServiceEntry> {
        Arc::new(Self::new(self.name.clone(), self.provider.clone(), self.frame))
    }

    fn describe(&self, scope: &Scope) -> ServiceDescription {
        let mut description =
            ServiceDescription::new(scope.service_ref(&self.name), self.type_name(), self.kind());
        description.provider_frame = Some(self.frame);
        description.invocation_count = self.invocations.load(Ordering::Relaxed);
        description
    }
}
