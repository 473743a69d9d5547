// Mock host and cancellation collaborators for builder tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use compiler_api::{BuildHost, CancellationToken, WriteFileCallback};

/// Host with a configurable case policy and an optional recording writer.
pub struct MockBuildHost {
    case_sensitive: bool,
    writer: Option<WriteFileCallback>,
}

impl MockBuildHost {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            writer: None,
        }
    }

    /// Install a host-level writer that records every (file, contents) pair
    /// into `sink`.
    pub fn with_recording_writer(mut self, sink: Rc<RefCell<Vec<(String, String)>>>) -> Self {
        self.writer = Some(Rc::new(move |file: &str, contents: &str| {
            sink.borrow_mut().push((file.to_string(), contents.to_string()));
            Ok(())
        }));
        self
    }
}

impl BuildHost for MockBuildHost {
    fn use_case_sensitive_file_names(&self) -> bool {
        self.case_sensitive
    }

    fn write_file(&self) -> Option<WriteFileCallback> {
        self.writer.clone()
    }
}

/// Token tripped explicitly by the test.
#[derive(Default)]
pub struct TriggeredCancellationToken {
    cancelled: Cell<bool>,
}

impl TriggeredCancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

impl CancellationToken for TriggeredCancellationToken {
    fn is_cancellation_requested(&self) -> bool {
        self.cancelled.get()
    }
}

/// Token that trips after a fixed number of polls.
pub struct CountdownCancellationToken {
    remaining: Cell<usize>,
}

impl CountdownCancellationToken {
    pub fn new(polls_before_trip: usize) -> Self {
        Self {
            remaining: Cell::new(polls_before_trip),
        }
    }
}

impl CancellationToken for CountdownCancellationToken {
    fn is_cancellation_requested(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining == 0 {
            true
        } else {
            self.remaining.set(remaining - 1);
            false
        }
    }
}
