use crate::error::Result;
use crate::graph::Graph;
use crate::topic_state::TopicState;

/// Facade that owns a [`Graph`] (and, by composition, its detectors) and
/// exposes the external input/output surface applications actually call.
///
/// Implementors supply `graph()`; `process_data` is provided and drains
/// deferred seeds, posts the external value, and runs one traversal before
/// calling the overridable `process_output` hook.
pub trait ProcessorContainer {
    fn graph(&self) -> &Graph;

    /// Posts `value` to its topic and runs one full traversal, then calls
    /// `process_output` for the caller to drain results.
    fn process_data<T: TopicState>(&self, value: T) -> Result<()> {
        self.graph().process_external(value)?;
        self.process_output();
        Ok(())
    }

    /// Called once per `process_data`, after the traversal completes.
    /// Override to read output topics via `Graph::current`/`Graph::new_value`.
    /// The default does nothing.
    fn process_output(&self) {}
}
