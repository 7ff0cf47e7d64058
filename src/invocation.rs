//! Bounded record of the call sites that invoked a service.
//!
//! Every invocation of a lazy service records the caller's source location
//! (captured through `#[track_caller]`). Only the first `capacity` distinct
//! frames are kept; past that the trace keeps counting but stops storing, so
//! the memory held by a hot singleton stays bounded.

use std::collections::HashSet;
use std::fmt;
use std::panic::Location;

/// Default number of distinct call sites retained per service.
pub const DEFAULT_TRACE_CAPACITY: usize = 100;

/// A source location that registered or invoked a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    /// Source file of the call
    pub file: &'static str,
    /// Line of the call
    pub line: u32,
    /// Column of the call
    pub column: u32,
}

impl Frame {
    /// Frame of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl From<&'static Location<'static>> for Frame {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Append-only set of invocation frames with a saturating insert policy.
#[derive(Debug, Clone)]
pub(crate) struct InvocationTrace {
    frames: HashSet<Frame>,
    capacity: usize,
    count: u64,
}

impl InvocationTrace {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            frames: HashSet::new(),
            capacity,
            count: 0,
        }
    }

    /// Counts the invocation and stores `frame` while below capacity.
    pub(crate) fn record(&mut self, frame: Frame) {
        self.count = self.count.saturating_add(1);
        if self.frames.len() < self.capacity {
            self.frames.insert(frame);
        }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    /// Stored frames, sorted for stable output.
    pub(crate) fn frames(&self) -> Vec<Frame> {
        let mut frames: Vec<Frame> = self.frames.iter().copied().collect();
        frames.sort();
        frames
    }

    /// Empty trace with the same capacity.
    pub(crate) fn reset(&self) -> Self {
        Self::new(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(line: u32) -> Frame {
        Frame { file: "src/app.rs", line, column: 1 }
    }

    #[test]
    fn test_record_deduplicates_frames() {
        let mut trace = InvocationTrace::new(10);
        trace.record(frame(1));
        trace.record(frame(1));
        trace.record(frame(2));

        assert_eq!(trace.count(), 3);
        assert_eq!(trace.frames(), vec![frame(1), frame(2)]);
    }

    #[test]
    fn test_stops_storing_past_capacity_but_keeps_counting() {
        let mut trace = InvocationTrace::new(3);
        for line in 0..10 {
            trace.record(frame(line));
        }

        assert_eq!(trace.count(), 10);
        assert_eq!(trace.frames().len(), 3);
        assert_eq!(trace.frames(), vec![frame(0), frame(1), frame(2)]);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut trace = InvocationTrace::new(2);
        trace.record(frame(1));
        let fresh = trace.reset();

        assert_eq!(fresh.count(), 0);
        assert!(fresh.frames().is_empty());
        assert_eq!(fresh.capacity, 2);
    }

    #[test]
    fn test_caller_frame_points_at_this_file() {
        let frame = Frame::caller();
        assert!(frame.file.ends_with("invocation.rs"));
        assert!(frame.line > 0);
    }
}
