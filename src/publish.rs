use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Weak;

use crate::graph::GraphInner;
use crate::topic_state::TopicState;

/// Write capability for one output topic, obtained from a [`crate::detector::DetectorBuilder`]
/// at construction time. Publishing is immediate: the value lands in the
/// topic's new-value list in the traversal currently in progress and is
/// visible to any not-yet-visited subscriber later in this same pass.
pub struct PublishHandle<T: TopicState> {
    inner: Weak<RefCell<GraphInner>>,
    _marker: PhantomData<T>,
}

impl<T: TopicState> PublishHandle<T> {
    pub(crate) fn new(inner: Weak<RefCell<GraphInner>>) -> Self {
        PublishHandle { inner, _marker: PhantomData }
    }

    /// Publishes `value` to this handle's topic, same-traversal.
    ///
    /// Panics if the owning graph has already been dropped; a detector
    /// cannot outlive the graph that holds it, so this indicates a bug
    /// rather than a recoverable condition.
    pub fn publish(&self, value: T) {
        let inner = self.inner.upgrade().expect("PublishHandle used after its Graph was dropped");
        inner.borrow_mut().registry.resolve_mut::<T>().publish(value);
    }
}

impl<T: TopicState> Clone for PublishHandle<T> {
    fn clone(&self) -> Self {
        PublishHandle { inner: self.inner.clone(), _marker: PhantomData }
    }
}
