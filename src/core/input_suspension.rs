//! Reference-counted input suspension
//!
//! Each async push that must block player input holds a `SuspensionToken`.
//! The input system is told to suspend when the first token is taken and to
//! resume when the last one is dropped, whichever path drops it (completion,
//! failure, supersede or teardown).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// The host's input system, as seen by the layout
pub trait InputSink {
    fn suspend_input(&self);
    fn resume_input(&self);
}

/// Input sink that only logs; used when the host has no input system to gate
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInputSink;

impl InputSink for LoggingInputSink {
    fn suspend_input(&self) {
        info!(target: "layerstack::input", "player input suspended");
    }

    fn resume_input(&self) {
        info!(target: "layerstack::input", "player input resumed");
    }
}

struct SuspensionState {
    count: Cell<usize>,
    /// Reasons of outstanding tokens, for diagnostics
    reasons: RefCell<Vec<(u64, String)>>,
    next_token: Cell<u64>,
    sink: Box<dyn InputSink>,
}

/// Shared suspension counter for one player session
#[derive(Clone)]
pub struct InputSuspension {
    state: Rc<SuspensionState>,
}

impl InputSuspension {
    pub fn new(sink: impl InputSink + 'static) -> Self {
        Self {
            state: Rc::new(SuspensionState {
                count: Cell::new(0),
                reasons: RefCell::new(Vec::new()),
                next_token: Cell::new(1),
                sink: Box::new(sink),
            }),
        }
    }

    /// Take one suspension reference
    pub fn acquire(&self, reason: impl Into<String>) -> SuspensionToken {
        let reason = reason.into();
        let token_id = self.state.next_token.get();
        self.state.next_token.set(token_id + 1);

        let count = self.state.count.get() + 1;
        self.state.count.set(count);
        debug!(target: "layerstack::input", count, %reason, "input suspension acquired");
        self.state.reasons.borrow_mut().push((token_id, reason));
        if count == 1 {
            self.state.sink.suspend_input();
        }

        SuspensionToken {
            state: Rc::clone(&self.state),
            id: token_id,
        }
    }

    /// Outstanding suspension references
    pub fn count(&self) -> usize {
        self.state.count.get()
    }

    pub fn is_suspended(&self) -> bool {
        self.count() > 0
    }

    /// Reasons of outstanding tokens, oldest first
    pub fn reasons(&self) -> Vec<String> {
        self.state
            .reasons
            .borrow()
            .iter()
            .map(|(_, reason)| reason.clone())
            .collect()
    }
}

impl fmt::Debug for InputSuspension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSuspension")
            .field("count", &self.count())
            .finish()
    }
}

/// One suspension reference; input resumes when the last token drops
pub struct SuspensionToken {
    state: Rc<SuspensionState>,
    id: u64,
}

impl SuspensionToken {
    /// Release explicitly (same as dropping)
    pub fn release(self) {}
}

impl Drop for SuspensionToken {
    fn drop(&mut self) {
        let count = self.state.count.get().saturating_sub(1);
        self.state.count.set(count);
        self.state
            .reasons
            .borrow_mut()
            .retain(|(id, _)| *id != self.id);
        debug!(target: "layerstack::input", count, "input suspension released");
        if count == 0 {
            self.state.sink.resume_input();
        }
    }
}

impl fmt::Debug for SuspensionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuspensionToken({})", self.id)
    }
}
