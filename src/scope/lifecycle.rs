//! Health-check and shutdown sweeps over a scope subtree.

use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::error::{AggregateError, DiError, DiResult, HookError};
use crate::internal::call_hook;
use crate::service::ServiceEntry;

use super::Scope;

impl Scope {
    /// Runs the health hook of every built service in this scope and its
    /// descendants.
    ///
    /// Unbuilt lazy services and transients have nothing to check; aliases
    /// check their target. Every hook runs even if an earlier one failed, and
    /// a panicking hook is reported as that service's failure. When a
    /// health-check timeout is configured, each hook gets a child of `token`
    /// that expires after it.
    ///
    /// # Errors
    ///
    /// An [`AggregateError`] with one entry per failing service.
    pub fn health_check(&self, token: &CancellationToken) -> Result<(), AggregateError> {
        let mut errors = AggregateError::new();
        self.health_check_into(token, &mut errors);
        errors.into_result()
    }

    fn health_check_into(&self, token: &CancellationToken, errors: &mut AggregateError) {
        for entry in self.local_entries() {
            if let Err(error) = self.probe_health(&entry, token) {
                errors.insert(self.service_ref(entry.name()), error);
            }
        }
        for child in self.children() {
            child.health_check_into(token, errors);
        }
    }

    fn probe_health(
        &self,
        entry: &Arc<dyn ServiceEntry>,
        token: &CancellationToken,
    ) -> Result<(), HookError> {
        if !entry.is_health_checker(self) {
            return Ok(());
        }

        let token = match self.options().health_check_timeout() {
            Some(timeout) => token.child_with_timeout(timeout),
            None => token.clone(),
        };

        let result = call_hook(|| entry.health_check(self, &token));
        if let Err(error) = &result {
            tracing::warn!(
                scope = %self.name(),
                service = %entry.name(),
                %error,
                "health check failed"
            );
        }
        result
    }

    /// Health-checks the service `name` as seen from this scope.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` if no scope in the chain declares `name`, or an
    /// `Aggregate` error holding the hook's failure.
    pub fn health_check_named(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        let (owner, entry) = self
            .lookup(name)
            .ok_or_else(|| DiError::not_found(name, self.visible_names()))?;

        owner.probe_health(&entry, token).map_err(|error| {
            let mut errors = AggregateError::new();
            errors.insert(owner.service_ref(name), error);
            DiError::Aggregate(errors)
        })
    }

    /// Shuts this scope and its descendants down.
    ///
    /// Child scopes go first, then this scope's built services in reverse
    /// build order. Every built service is reset whatever its hook returns,
    /// so the scope stays usable: invoking a service afterwards builds it
    /// again. Calling `shutdown` twice in a row is a no-op the second time.
    ///
    /// Independent subtrees may be shut down concurrently. A lazy service
    /// being built while its scope shuts down is torn down after the build
    /// completes.
    ///
    /// # Errors
    ///
    /// An [`AggregateError`] with one entry per failing hook.
    pub fn shutdown(&self, token: &CancellationToken) -> Result<(), AggregateError> {
        let mut errors = AggregateError::new();
        self.shutdown_into(token, &mut errors);
        errors.into_result()
    }

    fn shutdown_into(&self, token: &CancellationToken, errors: &mut AggregateError) {
        for child in self.children() {
            child.shutdown_into(token, errors);
        }

        let mut built: Vec<(u64, Arc<dyn ServiceEntry>)> = self
            .local_entries()
            .into_iter()
            .filter(|entry| entry.is_built())
            .map(|entry| (entry.build_stamp(), entry))
            .collect();
        built.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, entry) in built {
            if let Err(error) = self.teardown(&entry, token) {
                errors.insert(self.service_ref(entry.name()), error);
            }
        }
    }

    fn teardown(
        &self,
        entry: &Arc<dyn ServiceEntry>,
        token: &CancellationToken,
    ) -> Result<(), HookError> {
        let result = call_hook(|| entry.shutdown(token));
        let service = self.service_ref(entry.name());

        match &result {
            Ok(()) => tracing::debug!(
                scope = %self.name(),
                service = %service.service,
                "service shut down"
            ),
            Err(error) => {
                tracing::warn!(
                    scope = %self.name(),
                    service = %service.service,
                    %error,
                    "service shutdown failed"
                )
            }
        }
        self.observers().shut_down(&service, result.as_ref().err());
        result
    }

    /// Shuts this subtree down, then [`detach`](Scope::detach)es it from its
    /// parent. The scope is detached even when a hook fails.
    ///
    /// # Errors
    ///
    /// The [`AggregateError`] of the shutdown.
    pub fn close(&self, token: &CancellationToken) -> Result<(), AggregateError> {
        let result = self.shutdown(token);
        self.detach();
        result
    }

    /// Shuts down the single service `name` registered in this scope.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` if this scope has no such service (ancestors are not
    /// searched: a scope only tears down what it owns), or an `Aggregate`
    /// error holding the hook's failure.
    pub fn shutdown_named(&self, name: &str, token: &CancellationToken) -> DiResult<()> {
        let entry = self
            .local_entry(name)
            .ok_or_else(|| DiError::not_found(name, self.local_names()))?;

        if !entry.is_built() {
            return Ok(());
        }

        self.teardown(&entry, token).map_err(|error| {
            let mut errors = AggregateError::new();
            errors.insert(self.service_ref(name), error);
            DiError::Aggregate(errors)
        })
    }
}
