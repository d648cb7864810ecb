use crate::detector::{Detector, DetectorBuilder, DetectorHandle, Evaluate};
use crate::future_publisher::FuturePublisher;
use crate::graph::Graph;
use crate::topic_state::TopicState;

/// Wrapper distinguishing a lag-delayed value from its live counterpart, so
/// subscribing to `Lagged<T>` can never be mistaken for subscribing to `T`
/// itself with zero delay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lagged<T> {
    pub data: T,
}

static_assertions::assert_impl_all!(Lagged<u32>: crate::topic_state::TopicState);

/// Delays `T` by exactly one traversal, republishing it as `Lagged<T>`.
///
/// Used to break logical cycles: a detector may depend on its own past
/// output via `Lagged<T>` without the topological sort ever seeing a
/// cycle, because `Lag<T>` hands its output to a [`FuturePublisher`]
/// rather than publishing it immediately — see the module docs on
/// [`crate::graph`] for why that sidesteps the ordering problem entirely.
pub struct Lag<T: TopicState> {
    publish: FuturePublisher<Lagged<T>>,
    pending: Option<T>,
}

impl<T: TopicState> Lag<T> {
    /// Registers a new `Lag<T>` detector on `graph`, subscribed to `T`,
    /// and returns its handle.
    pub fn new(graph: &Graph) -> DetectorHandle<Lag<T>> {
        let handle = graph.add_detector(|builder: &mut DetectorBuilder| Lag {
            publish: builder.future_publisher::<Lagged<T>>(),
            pending: None,
        });
        graph.subscribe::<T, Lag<T>>(&handle);
        handle
    }
}

impl<T: TopicState> Detector for Lag<T> {
    fn complete_evaluation(&mut self) {
        if let Some(value) = self.pending.take() {
            self.publish.publish(Lagged { data: value });
        }
    }
}

impl<T: TopicState> Evaluate<T> for Lag<T> {
    fn evaluate(&mut self, value: &T) {
        self.pending = Some(value.clone());
    }
}
