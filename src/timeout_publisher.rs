use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::graph::GraphInner;
use crate::registry::TopicRegistry;
use crate::topic_state::TopicState;

/// Host-supplied monotonic tick count. The core never reads a clock; the
/// host is the one polling time and calling [`crate::graph::Graph::fire_overdue`]
/// with its own notion of "now".
pub type Instant = u64;

/// Handle to cancel a scheduled timeout before it fires. Cancelling after
/// the timeout has already fired is a no-op: the value has already been
/// queued as a next-traversal seed and cannot be withdrawn.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

pub(crate) struct PendingTimeout {
    pub(crate) deadline: Instant,
    pub(crate) cancelled: Rc<Cell<bool>>,
    pub(crate) seed: Box<dyn FnOnce(&mut TopicRegistry)>,
}

/// Write capability for a topic that should become visible at a specific
/// future point in monotonic time, rather than at the very next traversal.
///
/// A detector calls [`TimeoutPublisher::schedule`] to arm a deadline; the
/// host later calls `Graph::fire_overdue(now)` (typically once per
/// traversal, or on its own timer) to move any due, non-cancelled entries
/// into the same deferred-seed queue `FuturePublisher` uses.
pub struct TimeoutPublisher<T: TopicState> {
    inner: Weak<RefCell<GraphInner>>,
    _marker: PhantomData<T>,
}

impl<T: TopicState> TimeoutPublisher<T> {
    pub(crate) fn new(inner: Weak<RefCell<GraphInner>>) -> Self {
        TimeoutPublisher { inner, _marker: PhantomData }
    }

    /// Arms a one-shot publication of `value` for the first `fire_overdue(now)`
    /// call with `now >= deadline`. Returns a token that can cancel it
    /// beforehand.
    pub fn schedule(&self, deadline: Instant, value: T) -> CancelToken {
        let inner = self.inner.upgrade().expect("TimeoutPublisher used after its Graph was dropped");
        let cancelled = Rc::new(Cell::new(false));
        let seed: Box<dyn FnOnce(&mut TopicRegistry)> =
            Box::new(move |registry: &mut TopicRegistry| registry.resolve_mut::<T>().publish(value));
        inner.borrow_mut().pending_timeouts.push(PendingTimeout {
            deadline,
            cancelled: cancelled.clone(),
            seed,
        });
        CancelToken { cancelled }
    }
}

impl<T: TopicState> Clone for TimeoutPublisher<T> {
    fn clone(&self) -> Self {
        TimeoutPublisher { inner: self.inner.clone(), _marker: PhantomData }
    }
}
