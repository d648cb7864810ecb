use crate::storage::List;
use crate::topic_state::TopicState;

/// A capability object that delivers one topic's new values to one
/// subscribing detector. Implementations are installed by [`crate::graph::Graph::subscribe`]
/// and live inside the graph, not on the topic itself — see the module docs
/// on [`crate::graph`] for why delivery is scoped per-detector rather than
/// broadcast once per topic.
pub trait SubscriptionDispatcher<T: TopicState> {
    fn dispatch(&self, value: &T);
}

/// Typed container holding the current and in-flight values of one topic.
///
/// There is exactly one `Topic<T>` per `Graph`, resolved by `T`'s type
/// identity. `current` is the last fully-consolidated value; `new_values`
/// accumulates every value published during the traversal in progress.
pub struct Topic<T: TopicState> {
    current: T,
    new_values: List<T>,
}

impl<T: TopicState> Topic<T> {
    pub(crate) fn new() -> Self {
        Topic { current: T::default(), new_values: List::new() }
    }

    /// True iff at least one value was published to this topic during the
    /// traversal currently in progress.
    pub fn has_new_value(&self) -> bool {
        !self.new_values.is_empty()
    }

    /// The most recently published value of this traversal.
    ///
    /// Panics if [`Topic::has_new_value`] is false; callers are expected to
    /// check first, mirroring the unchecked accessor in the reference
    /// design.
    pub fn get_new_value(&self) -> T {
        self.new_values
            .last()
            .cloned()
            .expect("get_new_value called with no new value published this traversal")
    }

    /// All values published this traversal, in publish order. If nothing
    /// was published, returns the single current value instead.
    pub fn get_current_values(&self) -> Vec<T> {
        if self.new_values.is_empty() {
            vec![self.current.clone()]
        } else {
            self.new_values.iter().cloned().collect()
        }
    }

    /// The last fully-consolidated value (as of the end of the previous
    /// traversal).
    pub fn current(&self) -> &T {
        &self.current
    }

    pub(crate) fn publish(&mut self, value: T) {
        self.new_values.push(value);
    }

    /// A clone of every value published this traversal, in publish order.
    pub(crate) fn new_values_snapshot(&self) -> Vec<T> {
        self.new_values.iter().cloned().collect()
    }

    /// Promotes the last published value to `current` and clears the
    /// in-flight list. Called once per topic at the end of a traversal.
    pub(crate) fn consolidate(&mut self) {
        if let Some(last) = self.new_values.last() {
            self.current = last.clone();
        }
        self.new_values.clear();
    }
}

impl<T: TopicState> Default for Topic<T> {
    fn default() -> Self {
        Topic::new()
    }
}
