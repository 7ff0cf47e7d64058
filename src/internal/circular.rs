//! Circular dependency detection infrastructure.
//!
//! Each thread keeps the chain of services it is currently resolving. A
//! service that is already on the chain is a cycle; a chain longer than the
//! configured depth is rejected before it can overflow the stack. The check
//! happens before a lazy descriptor's lock is taken, so a service depending on
//! itself fails fast instead of deadlocking. Cycles that span threads are
//! caught by the wait-for graph in [`wait_graph`](super::wait_graph), which
//! reads snapshots of these chains.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<ChainLink>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainLink {
    pub(crate) scope_id: u64,
    pub(crate) name: String,
}

impl ChainLink {
    pub(crate) fn new(scope_id: u64, name: &str) -> Self {
        Self { scope_id, name: name.to_string() }
    }
}

/// Copy of the current thread's resolution chain, outermost first.
pub(crate) fn snapshot() -> Vec<ChainLink> {
    RESOLUTION_TLS.with(|tls| tls.borrow().clone())
}

/// Guard for managing the thread-local resolution chain.
///
/// Pushes on creation and pops on drop, including during unwinding out of a
/// panicking provider.
#[derive(Debug)]
pub(crate) struct ChainGuard {
    _private: (),
}

impl ChainGuard {
    pub(crate) fn enter(scope_id: u64, name: &str, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut chain = tls.borrow_mut();

            // Circular detection BEFORE pushing the new name
            if let Some(start) = chain
                .iter()
                .position(|link| link.scope_id == scope_id && link.name == name)
            {
                let mut path: Vec<String> =
                    chain[start..].iter().map(|link| link.name.clone()).collect();
                path.push(name.to_string());
                return Err(DiError::Circular(path));
            }

            // Depth guard
            if chain.len() >= max_depth {
                return Err(DiError::DepthExceeded(max_depth));
            }

            chain.push(ChainLink::new(scope_id, name));
            Ok(())
        })?;

        Ok(Self { _private: () })
    }
}

impl Drop for ChainGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
pub(crate) fn chain_len() -> usize {
    RESOLUTION_TLS.with(|tls| tls.borrow().len())
}
