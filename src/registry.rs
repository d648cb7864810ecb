use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::topic::Topic;
use crate::topic_state::TopicState;

/// Type-erased handle to one `Topic<T>`, so the registry can hold topics of
/// different `T` in one map and the graph can consolidate all of them at
/// traversal end without naming each concrete type.
trait ErasedTopic: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn consolidate(&mut self);
}

impl<T: TopicState> ErasedTopic for Topic<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn consolidate(&mut self) {
        Topic::consolidate(self)
    }
}

/// Process-wide mapping from a topic's type identity to its `Topic<T>`
/// instance. At most one topic per type lives in a registry.
#[derive(Default)]
pub(crate) struct TopicRegistry {
    topics: HashMap<TypeId, Box<dyn ErasedTopic>>,
}

impl TopicRegistry {
    /// Returns the existing `Topic<T>`, creating it on first use.
    pub(crate) fn resolve_mut<T: TopicState>(&mut self) -> &mut Topic<T> {
        self.topics
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Topic::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Topic<T>>()
            .expect("TopicRegistry: type mismatch for TypeId, this is a bug")
    }

    pub(crate) fn get<T: TopicState>(&self) -> Option<&Topic<T>> {
        self.topics
            .get(&TypeId::of::<T>())
            .map(|erased| {
                erased
                    .as_any()
                    .downcast_ref::<Topic<T>>()
                    .expect("TopicRegistry: type mismatch for TypeId, this is a bug")
            })
    }

    pub(crate) fn consolidate_all(&mut self) {
        for topic in self.topics.values_mut() {
            topic.consolidate();
        }
    }
}
