use thiserror::Error;

/// Errors raised by the graph engine itself.
///
/// Both variants are programmer errors: a well-formed application never
/// triggers either one in normal operation. They exist so a host can fail
/// loudly (and recover, if it chooses to) instead of the process aborting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("topic not found: {topic}")]
    TopicNotFound { topic: &'static str },

    #[error("cyclic graph: topological sort did not visit all detectors")]
    CyclicGraph,
}

pub type Result<T> = std::result::Result<T, GraphError>;
