//! Recoverable-fault boundary around user code.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult, HookError, HookPanic};

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(error) = payload.downcast_ref::<DiError>() {
        error.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs a provider, turning panics into `ProviderFailure` and returned
/// errors into `ProviderError`. A returned `DiError` passes through as is so
/// that failures of nested invocations keep their original variant.
pub(crate) fn call_provider<T, F>(name: &str, provider: F) -> DiResult<T>
where
    F: FnOnce() -> Result<T, BoxError>,
{
    match catch_unwind(AssertUnwindSafe(provider)) {
        Ok(Ok(instance)) => Ok(instance),
        Ok(Err(error)) => match error.downcast::<DiError>() {
            Ok(di_error) => Err(*di_error),
            Err(other) => Err(DiError::ProviderError {
                name: name.to_string(),
                source: Arc::from(other),
            }),
        },
        Err(payload) => Err(DiError::ProviderFailure {
            name: name.to_string(),
            cause: panic_message(payload.as_ref()),
        }),
    }
}

/// Runs a lifecycle hook, isolating panics as a per-service error.
pub(crate) fn call_hook<F>(hook: F) -> Result<(), HookError>
where
    F: FnOnce() -> Result<(), HookError>,
{
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(payload) => Err(Arc::new(HookPanic(panic_message(payload.as_ref())))),
    }
}
