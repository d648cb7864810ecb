use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Weak;

use crate::graph::GraphInner;
use crate::registry::TopicRegistry;
use crate::topic_state::TopicState;

/// Write capability for a topic that should only become visible at the
/// *start* of the next external `ProcessData`/`process_external` call, not
/// within the traversal currently in progress.
///
/// This is how a detector re-enters the graph out of band: the value is
/// queued and drained before the next seed is even applied, so it is
/// visible to every detector of that next traversal regardless of where
/// the queuing detector sits in this traversal's topological order.
pub struct FuturePublisher<T: TopicState> {
    inner: Weak<RefCell<GraphInner>>,
    _marker: PhantomData<T>,
}

impl<T: TopicState> FuturePublisher<T> {
    pub(crate) fn new(inner: Weak<RefCell<GraphInner>>) -> Self {
        FuturePublisher { inner, _marker: PhantomData }
    }

    /// Queues `value` for delivery at the start of the next traversal.
    pub fn publish(&self, value: T) {
        let inner = self.inner.upgrade().expect("FuturePublisher used after its Graph was dropped");
        let seed: Box<dyn FnOnce(&mut TopicRegistry)> =
            Box::new(move |registry: &mut TopicRegistry| registry.resolve_mut::<T>().publish(value));
        inner.borrow_mut().future_seeds.push(seed);
    }
}

impl<T: TopicState> Clone for FuturePublisher<T> {
    fn clone(&self) -> Self {
        FuturePublisher { inner: self.inner.clone(), _marker: PhantomData }
    }
}
