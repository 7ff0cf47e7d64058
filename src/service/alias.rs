//! Services that expose another registration under a second name and type.

use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::descriptors::ServiceDescription;
use crate::error::{DiError, DiResult, HookError};
use crate::invocation::Frame;
use crate::key::name_of;
use crate::lifetime::ServiceKind;
use crate::scope::Scope;

use super::{erase, AnyArc, ServiceEntry};

pub(crate) type CastFn<T, I> = Arc<dyn Fn(Arc<T>) -> Arc<I> + Send + Sync>;

/// Exposes the service `target` (producing `T`) under the type `I`.
///
/// The target is looked up by name at invocation time, from the scope owning
/// the alias, so it may be registered after the alias. Its instance is
/// checked against `T` and converted with `cast`, typically an unsizing
/// coercion such as `|db| db as Arc<dyn Store>`.
pub(crate) struct AliasService<T: ?Sized, I: ?Sized> {
    name: String,
    target: String,
    cast: CastFn<T, I>,
    frame: Frame,
}

impl<T, I> AliasService<T, I>
where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(name: String, target: String, cast: CastFn<T, I>, frame: Frame) -> Self {
        Self { name, target, cast, frame }
    }
}

impl<T, I> ServiceEntry for AliasService<T, I>
where
    T: ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        name_of::<I>()
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Alias
    }

    fn instance(&self, scope: &Scope, caller: Frame) -> DiResult<AnyArc> {
        let (instance, actual) = scope.invoke_any(&self.target, caller)?;
        let target = instance
            .downcast::<Arc<T>>()
            .map_err(|_| DiError::TypeMismatch { declared: name_of::<T>(), actual })?;
        Ok(erase((self.cast)(Arc::clone(target.as_ref()))))
    }

    fn is_built(&self) -> bool {
        false
    }

    fn build_stamp(&self) -> u64 {
        0
    }

    fn is_health_checker(&self, scope: &Scope) -> bool {
        match scope.lookup(&self.target) {
            Some((owner, entry)) => entry.is_health_checker(&owner),
            None => false,
        }
    }

    fn health_check(&self, scope: &Scope, token: &CancellationToken) -> Result<(), HookError> {
        match scope.lookup(&self.target) {
            Some((owner, entry)) if entry.is_built() => entry.health_check(&owner, token),
            _ => Ok(()),
        }
    }

    fn is_shutdowner(&self) -> bool {
        false
    }

    fn shutdown(&self, _token: &CancellationToken) -> Result<(), HookError> {
        Ok(())
    }

    fn clone_reset(&self) -> Arc<dyn ServiceEntry> {
        Arc::new(Self::new(self.name.clone(), self.target.clone(), self.cast.clone(), self.frame))
    }

    fn describe(&self, scope: &Scope) -> ServiceDescription {
        let mut description =
            ServiceDescription::new(scope.service_ref(&self.name), self.type_name(), self.kind());
        if let Some((owner, entry)) = scope.lookup(&self.target) {
            description.built = entry.is_built();
            description.is_health_checker = entry.is_health_checker(&owner);
        }
        description.target = Some(self.target.clone());
        description.provider_frame = Some(self.frame);
        description
    }
}
