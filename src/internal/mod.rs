//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod panic;
pub(crate) mod wait_graph;

pub(crate) use circular::ChainGuard;
pub(crate) use panic::{call_hook, call_provider};
pub(crate) use wait_graph::{BuilderCell, WaitGuard};
