use std::any::TypeId;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::future_publisher::FuturePublisher;
use crate::graph::{DetectorId, GraphInner};
use crate::publish::PublishHandle;
use crate::timeout_publisher::TimeoutPublisher;
use crate::topic_state::TopicState;

/// A node in the graph: subscribes to input topics, publishes to output
/// topics, and is visited at most once per traversal.
pub trait Detector {
    /// Called once per traversal, after every `Evaluate` call for this
    /// visit, iff at least one subscribed topic was dirty. The default
    /// does nothing, for detectors that only observe.
    fn complete_evaluation(&mut self) {}
}

/// Per-topic evaluation capability. A detector subscribing to `T` must
/// implement this for `T`; `Graph::subscribe::<T, D>` requires it at the
/// call site, so a missing capability is a compile error, never a runtime
/// one.
pub trait Evaluate<T: TopicState>: Detector {
    fn evaluate(&mut self, value: &T);
}

/// Identifies a detector's reserved slot and the shared cell its value
/// lives in. Returned by [`crate::graph::Graph::add_detector`]; pass it to
/// [`crate::graph::Graph::subscribe`] to wire up inputs once the value
/// exists.
pub struct DetectorHandle<D> {
    pub(crate) id: DetectorId,
    pub(crate) cell: Rc<RefCell<D>>,
}

impl<D> Clone for DetectorHandle<D> {
    fn clone(&self) -> Self {
        DetectorHandle { id: self.id, cell: self.cell.clone() }
    }
}

/// Passed to the closure given to `Graph::add_detector`, before the
/// detector value itself exists. Lets construction-time code obtain
/// publish/future/timeout handles for the slot being built, which is how a
/// detector gets a handle to itself before it exists as a value.
pub struct DetectorBuilder {
    pub(crate) inner: Weak<RefCell<GraphInner>>,
    pub(crate) id: DetectorId,
}

impl DetectorBuilder {
    /// Declares an immediate output: this publication contributes a
    /// same-traversal ordering edge into every subscriber of `T`.
    pub fn publish_handle<T: TopicState>(&mut self) -> PublishHandle<T> {
        self.record::<T>(false);
        PublishHandle::new(self.inner.clone())
    }

    /// Declares a deferred output, visible only at the start of the next
    /// traversal; contributes no ordering edge (see [`crate::future_publisher::FuturePublisher`]).
    pub fn future_publisher<T: TopicState>(&mut self) -> FuturePublisher<T> {
        self.record::<T>(true);
        FuturePublisher::new(self.inner.clone())
    }

    /// Declares a time-deferred output; like `future_publisher`, contributes
    /// no ordering edge.
    pub fn timeout_publisher<T: TopicState>(&mut self) -> TimeoutPublisher<T> {
        self.record::<T>(true);
        TimeoutPublisher::new(self.inner.clone())
    }

    fn record<T: TopicState>(&mut self, deferred: bool) {
        if let Some(inner) = self.inner.upgrade() {
            let mut g = inner.borrow_mut();
            g.registry.resolve_mut::<T>();
            g.record_publication(self.id, TypeId::of::<T>(), std::any::type_name::<T>(), deferred);
        }
    }
}
