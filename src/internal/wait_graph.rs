//! Wait-for graph spanning every thread that blocks on a lazy build.
//!
//! A lazy descriptor records the thread running its provider in a
//! [`BuilderCell`]. A thread that finds the descriptor locked registers what
//! it waits on, together with a snapshot of its resolution chain. Following
//! builder -> waited-on builder -> ... back to the registering thread means
//! two builds wait on each other, which is reported as `Circular` instead of
//! blocking forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::circular::{self, ChainLink};
use crate::error::{DiError, DiResult};

/// The thread currently running a descriptor's provider, if any.
pub(crate) type BuilderCell = Arc<Mutex<Option<ThreadId>>>;

struct Waiter {
    builder: BuilderCell,
    target: ChainLink,
    chain: Vec<ChainLink>,
}

static WAITING: Lazy<Mutex<HashMap<ThreadId, Waiter>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Registration of the current thread as waiting on a build. Removed on drop.
pub(crate) struct WaitGuard {
    thread: ThreadId,
}

impl WaitGuard {
    /// Registers the current thread as waiting on the build of `name` in
    /// scope `scope_id`, whose provider runs on the thread in `builder`.
    pub(crate) fn enter(builder: &BuilderCell, scope_id: u64, name: &str) -> DiResult<Self> {
        let thread = thread::current().id();
        let waiter = Waiter {
            builder: builder.clone(),
            target: ChainLink::new(scope_id, name),
            chain: circular::snapshot(),
        };

        let mut waiting = WAITING.lock();
        if let Some(path) = find_cycle(&waiting, thread, &waiter) {
            return Err(DiError::Circular(path));
        }
        waiting.insert(thread, waiter);
        Ok(Self { thread })
    }

    /// Walks the graph again. Builders publish themselves after taking their
    /// lock, so a cycle may only become visible after a few rounds.
    pub(crate) fn check(&self) -> DiResult<()> {
        let waiting = WAITING.lock();
        let cycle = waiting
            .get(&self.thread)
            .and_then(|waiter| find_cycle(&waiting, self.thread, waiter));
        match cycle {
            Some(path) => Err(DiError::Circular(path)),
            None => Ok(()),
        }
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        WAITING.lock().remove(&self.thread);
    }
}

fn find_cycle(
    waiting: &HashMap<ThreadId, Waiter>,
    me: ThreadId,
    waiter: &Waiter,
) -> Option<Vec<String>> {
    let mut path = waiter.chain.clone();
    let mut target = &waiter.target;
    let mut holder = *waiter.builder.lock();

    // Each thread waits on at most one build, so a walk longer than the
    // number of waiters is a cycle among other threads.
    for _ in 0..=waiting.len() {
        let thread = holder?;
        if thread == me {
            return Some(close_path(path));
        }
        let next = waiting.get(&thread)?;
        if let Some(start) = next.chain.iter().position(|link| link == target) {
            path.extend(next.chain[start + 1..].iter().cloned());
        }
        target = &next.target;
        holder = *next.builder.lock();
    }
    None
}

// Trims the path so that it starts at the first occurrence of its last link.
fn close_path(path: Vec<ChainLink>) -> Vec<String> {
    let start = path
        .last()
        .and_then(|last| path.iter().position(|link| link == last))
        .unwrap_or(0);
    path[start..].iter().map(|link| link.name.clone()).collect()
}
