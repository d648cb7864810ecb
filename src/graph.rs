//! The traversal engine.
//!
//! A `Graph` owns a [`TopicRegistry`] and the set of registered detectors,
//! computes a topological visiting order over them, and drives one
//! traversal per external input. Delivery to a subscribing detector is
//! scoped per detector rather than broadcast once per topic: each
//! detector's visit pulls the values of its own subscribed topics out of
//! the registry and hands them to that detector's `Evaluate`, because
//! `CompleteEvaluation` must fire exactly once, at that detector's own
//! position in the order — not at whichever producer happens to complete
//! first.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap};
use std::cmp::Reverse;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::detector::{DetectorBuilder, DetectorHandle, Evaluate};
use crate::error::{GraphError, Result};
use crate::registry::TopicRegistry;
use crate::timeout_publisher::{Instant, PendingTimeout};
use crate::topic::{SubscriptionDispatcher, Topic};
use crate::topic_state::TopicState;

/// Identifies a detector's position among its siblings. Stable for the
/// lifetime of the graph; never reused. Internal bookkeeping only — a
/// detector's position in `Graph::detectors()` already serves external
/// callers that need to correlate diagnostics entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DetectorId(pub(crate) usize);

/// One subscribed-topic edge belonging to a detector. Type-erased so a
/// `DetectorNode` can hold edges for many different `T` in one `Vec`.
trait SubscriptionEdge {
    fn type_id(&self) -> TypeId;
    fn topic_name(&self) -> &'static str;
    fn has_new_value(&self, registry: &TopicRegistry) -> bool;
    /// Clones this traversal's pending values out of the registry (a short
    /// borrow) and returns a closure that delivers them to the detector
    /// with no registry borrow held, so a callback that re-enters the
    /// graph (e.g. to publish) never collides with this borrow.
    fn snapshot_delivery(&self, registry: &TopicRegistry) -> Box<dyn FnOnce()>;
}

struct TypedSubscriptionEdge<T: TopicState, D> {
    detector: Weak<RefCell<D>>,
    _marker: PhantomData<T>,
}

impl<T: TopicState, D> Clone for TypedSubscriptionEdge<T, D> {
    fn clone(&self) -> Self {
        TypedSubscriptionEdge { detector: self.detector.clone(), _marker: PhantomData }
    }
}

/// The capability a subscription edge actually dispatches through: delivers
/// one value to the one detector this edge was built for.
impl<T, D> SubscriptionDispatcher<T> for TypedSubscriptionEdge<T, D>
where
    T: TopicState,
    D: Evaluate<T> + 'static,
{
    fn dispatch(&self, value: &T) {
        if let Some(detector) = self.detector.upgrade() {
            detector.borrow_mut().evaluate(value);
        }
    }
}

impl<T, D> SubscriptionEdge for TypedSubscriptionEdge<T, D>
where
    T: TopicState,
    D: Evaluate<T> + 'static,
{
    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn topic_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn has_new_value(&self, registry: &TopicRegistry) -> bool {
        registry.get::<T>().map(Topic::has_new_value).unwrap_or(false)
    }

    fn snapshot_delivery(&self, registry: &TopicRegistry) -> Box<dyn FnOnce()> {
        let values = registry.get::<T>().map(Topic::new_values_snapshot).unwrap_or_default();
        let dispatcher = self.clone();
        Box::new(move || {
            for value in &values {
                dispatcher.dispatch(value);
            }
        })
    }
}

struct PublicationInfo {
    type_id: TypeId,
    name: &'static str,
    deferred: bool,
}

struct DetectorNode {
    name: &'static str,
    subscriptions: Vec<Box<dyn SubscriptionEdge>>,
    publications: Vec<PublicationInfo>,
    complete: Option<Rc<dyn Fn()>>,
}

impl DetectorNode {
    fn placeholder() -> Self {
        DetectorNode {
            name: "<uninitialized>",
            subscriptions: Vec::new(),
            publications: Vec::new(),
            complete: None,
        }
    }
}

/// Diagnostic snapshot of one subscribed-topic edge. Consumed by an
/// external graph-visualization tool; building that tool is out of scope
/// here.
#[derive(Debug, Clone)]
pub struct TopicEdgeInfo {
    pub topic: &'static str,
}

/// Diagnostic snapshot of one published-topic edge.
#[derive(Debug, Clone)]
pub struct PublicationEdgeInfo {
    pub topic: &'static str,
    /// True if this publication is made through a `FuturePublisher` or
    /// `TimeoutPublisher` (as `Lag<T>`'s output always is) and therefore
    /// excluded from the topological ordering edges.
    pub deferred: bool,
}

/// Diagnostic snapshot of one registered detector.
#[derive(Debug, Clone)]
pub struct DetectorInfo {
    pub name: &'static str,
    pub subscribes: Vec<TopicEdgeInfo>,
    pub publishes: Vec<PublicationEdgeInfo>,
}

pub(crate) struct GraphInner {
    pub(crate) registry: TopicRegistry,
    detectors: Vec<DetectorNode>,
    order: Option<Vec<DetectorId>>,
    pub(crate) future_seeds: Vec<Box<dyn FnOnce(&mut TopicRegistry)>>,
    pub(crate) pending_timeouts: Vec<PendingTimeout>,
}

impl GraphInner {
    pub(crate) fn record_publication(&mut self, id: DetectorId, type_id: TypeId, name: &'static str, deferred: bool) {
        self.detectors[id.0].publications.push(PublicationInfo { type_id, name, deferred });
    }

    /// Kahn's algorithm over the DAG of immediate (non-deferred)
    /// publish/subscribe edges. Ties among simultaneously-ready detectors
    /// are broken by ascending registration order, via a min-heap, so the
    /// order is a deterministic function of registration order alone.
    fn compute_order(&self) -> Result<Vec<DetectorId>> {
        let n = self.detectors.len();
        let mut producer_of: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (idx, node) in self.detectors.iter().enumerate() {
            for publication in &node.publications {
                if !publication.deferred {
                    producer_of.entry(publication.type_id).or_default().push(idx);
                }
            }
        }

        let mut indegree = vec![0usize; n];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (idx, node) in self.detectors.iter().enumerate() {
            for edge in &node.subscriptions {
                if let Some(producers) = producer_of.get(&edge.type_id()) {
                    for &producer_idx in producers {
                        if producer_idx == idx {
                            continue;
                        }
                        adjacency[producer_idx].push(idx);
                        indegree[idx] += 1;
                    }
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> =
            (0..n).filter(|&i| indegree[i] == 0).map(Reverse).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(DetectorId(idx));
            for &next in &adjacency[idx] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != n {
            log::warn!("cyclic graph: topological sort only visited {} of {} detectors", order.len(), n);
            return Err(GraphError::CyclicGraph);
        }
        Ok(order)
    }
}

/// Owns every topic and detector of one dataflow instance, and drives its
/// traversals. Cheap to clone: clones share the same underlying state, so
/// a `Graph` can be handed to detector-construction code and to a
/// `ProcessorContainer` facade alike.
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: Rc::new(RefCell::new(GraphInner {
                registry: TopicRegistry::default(),
                detectors: Vec::new(),
                order: None,
                future_seeds: Vec::new(),
                pending_timeouts: Vec::new(),
            })),
        }
    }

    /// Reserves a detector slot, runs `build` to construct the detector
    /// value (which may obtain publish/future/timeout handles for the slot
    /// being built), and installs the result. This two-phase sequence is
    /// how a detector can hold a handle that publishes on its own behalf
    /// before the detector itself exists as a value.
    pub fn add_detector<D, F>(&self, build: F) -> DetectorHandle<D>
    where
        D: crate::detector::Detector + 'static,
        F: FnOnce(&mut DetectorBuilder) -> D,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = DetectorId(inner.detectors.len());
            inner.detectors.push(DetectorNode::placeholder());
            id
        };

        let mut builder = DetectorBuilder { inner: Rc::downgrade(&self.inner), id };
        let detector = build(&mut builder);
        let cell = Rc::new(RefCell::new(detector));

        {
            let complete_cell = cell.clone();
            let mut inner = self.inner.borrow_mut();
            let node = &mut inner.detectors[id.0];
            node.name = std::any::type_name::<D>();
            node.complete = Some(Rc::new(move || complete_cell.borrow_mut().complete_evaluation()));
        }

        log::debug!("registered detector {}", std::any::type_name::<D>());
        DetectorHandle { id, cell }
    }

    /// Subscribes `handle`'s detector to `T`, with ordinary same-traversal
    /// ordering: the detector is scheduled after whichever detector
    /// publishes `T` immediately (non-deferred).
    pub fn subscribe<T, D>(&self, handle: &DetectorHandle<D>)
    where
        T: TopicState,
        D: Evaluate<T> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.registry.resolve_mut::<T>();
        let edge: Box<dyn SubscriptionEdge> = Box::new(TypedSubscriptionEdge::<T, D> {
            detector: Rc::downgrade(&handle.cell),
            _marker: PhantomData,
        });
        inner.detectors[handle.id.0].subscriptions.push(edge);
    }

    /// Drains any queued future/timeout seeds, then publishes `value` to
    /// `T`, then runs one traversal. This is the engine-level operation a
    /// `ProcessorContainer`'s `process_data` calls.
    pub fn process_external<T: TopicState>(&self, value: T) -> Result<()> {
        let seeds: Vec<Box<dyn FnOnce(&mut TopicRegistry)>> = {
            let mut inner = self.inner.borrow_mut();
            std::mem::take(&mut inner.future_seeds)
        };
        {
            let mut inner = self.inner.borrow_mut();
            for seed in seeds {
                seed(&mut inner.registry);
            }
            inner.registry.resolve_mut::<T>().publish(value);
        }
        self.evaluate_graph()
    }

    /// Runs exactly one traversal: visits every detector in topological
    /// order, skipping any whose subscribed topics are all quiescent, then
    /// consolidates every topic.
    pub fn evaluate_graph(&self) -> Result<()> {
        let order = {
            let mut inner = self.inner.borrow_mut();
            if inner.order.is_none() {
                let computed = inner.compute_order()?;
                inner.order = Some(computed);
            }
            inner.order.clone().expect("order just computed")
        };

        for id in order {
            let (any_dirty, deliveries) = {
                let inner = self.inner.borrow();
                let node = &inner.detectors[id.0];
                let mut deliveries = Vec::new();
                let mut any_dirty = false;
                for edge in &node.subscriptions {
                    if edge.has_new_value(&inner.registry) {
                        any_dirty = true;
                        deliveries.push(edge.snapshot_delivery(&inner.registry));
                    }
                }
                (any_dirty, deliveries)
            };

            if !any_dirty {
                continue;
            }

            log::trace!("visiting detector {:?}", id);
            for deliver in deliveries {
                deliver();
            }

            let complete = self.inner.borrow().detectors[id.0].complete.clone();
            if let Some(complete) = complete {
                complete();
            } else {
                debug_assert!(false, "detector {:?} evaluated before construction completed", id);
            }
        }

        self.inner.borrow_mut().registry.consolidate_all();
        log::trace!("traversal complete");
        Ok(())
    }

    /// Moves any non-cancelled, overdue scheduled timeouts into the
    /// deferred-seed queue, to be drained at the start of the next
    /// traversal. `now` is host-supplied; the core never reads a clock.
    pub fn fire_overdue(&self, now: Instant) {
        let mut inner = self.inner.borrow_mut();
        let mut remaining = Vec::new();
        let mut due = Vec::new();
        for pending in inner.pending_timeouts.drain(..) {
            if pending.cancelled.get() {
                continue;
            } else if pending.deadline <= now {
                due.push(pending);
            } else {
                remaining.push(pending);
            }
        }
        inner.pending_timeouts = remaining;
        log::trace!("fire_overdue({now}): {} timeout(s) due", due.len());
        for pending in due {
            log::debug!("timeout fired at deadline {}", pending.deadline);
            inner.future_seeds.push(pending.seed);
        }
    }

    /// The last consolidated value of `T`. Fails if nothing has ever
    /// resolved this topic (no detector subscribes or publishes it, and it
    /// was never used as an external seed).
    pub fn current<T: TopicState>(&self) -> Result<T> {
        let inner = self.inner.borrow();
        inner.registry.get::<T>().map(|topic| topic.current().clone()).ok_or_else(|| {
            let topic = std::any::type_name::<T>();
            log::warn!("topic not found: {topic}");
            GraphError::TopicNotFound { topic }
        })
    }

    /// True iff `T` was published during the traversal in progress (or
    /// just completed, before the next traversal starts).
    pub fn has_new_value<T: TopicState>(&self) -> bool {
        let inner = self.inner.borrow();
        inner.registry.get::<T>().map(Topic::has_new_value).unwrap_or(false)
    }

    /// The most recent value published to `T` this traversal, if any.
    pub fn new_value<T: TopicState>(&self) -> Option<T> {
        let inner = self.inner.borrow();
        inner.registry.get::<T>().filter(|t| t.has_new_value()).map(Topic::get_new_value)
    }

    /// Snapshot of every registered detector's subscribed and published
    /// topics, for an external diagnostic renderer.
    pub fn detectors(&self) -> Vec<DetectorInfo> {
        let inner = self.inner.borrow();
        inner
            .detectors
            .iter()
            .map(|node| DetectorInfo {
                name: node.name,
                subscribes: node
                    .subscriptions
                    .iter()
                    .map(|edge| TopicEdgeInfo { topic: edge.topic_name() })
                    .collect(),
                publishes: node
                    .publications
                    .iter()
                    .map(|p| PublicationEdgeInfo { topic: p.name, deferred: p.deferred })
                    .collect(),
            })
            .collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}
