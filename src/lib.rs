//! A single-threaded, synchronously-evaluated, topic-typed dataflow
//! detector-graph.
//!
//! Applications define [`Detector`](detector::Detector)s that subscribe to
//! strongly-typed topics, compute, and publish to other topics. A
//! [`Graph`](graph::Graph) wires them into a deterministic topological
//! order and runs one full traversal per external input, delivered through
//! a [`ProcessorContainer`](processor_container::ProcessorContainer)
//! facade. [`Lag<T>`](lag::Lag) delays a topic by one traversal so cyclic
//! logical dependencies can be expressed without a live cycle in any one
//! evaluation.
//!
//! ```
//! use detectorgraph::detector::{Detector, DetectorBuilder, Evaluate};
//! use detectorgraph::graph::Graph;
//! use detectorgraph::processor_container::ProcessorContainer;
//! use detectorgraph::publish::PublishHandle;
//!
//! #[derive(Clone, Default)]
//! struct Doubled(i64);
//!
//! struct Doubler {
//!     out: PublishHandle<Doubled>,
//! }
//!
//! impl Detector for Doubler {}
//!
//! impl Evaluate<i64> for Doubler {
//!     fn evaluate(&mut self, value: &i64) {
//!         self.out.publish(Doubled(value * 2));
//!     }
//! }
//!
//! let graph = Graph::new();
//! let doubler = graph.add_detector(|b: &mut DetectorBuilder| Doubler {
//!     out: b.publish_handle::<Doubled>(),
//! });
//! graph.subscribe::<i64, Doubler>(&doubler);
//!
//! struct Container {
//!     graph: Graph,
//! }
//! impl ProcessorContainer for Container {
//!     fn graph(&self) -> &Graph {
//!         &self.graph
//!     }
//! }
//!
//! let container = Container { graph: graph.clone() };
//! container.process_data(21_i64).unwrap();
//! assert_eq!(graph.current::<Doubled>().unwrap().0, 42);
//! ```

pub mod detector;
pub mod error;
pub mod future_publisher;
pub mod graph;
pub mod lag;
pub mod processor_container;
pub mod publish;
mod registry;
mod storage;
pub mod timeout_publisher;
pub mod topic;
pub mod topic_state;

pub use detector::{Detector, DetectorBuilder, DetectorHandle, Evaluate};
pub use error::{GraphError, Result};
pub use future_publisher::FuturePublisher;
pub use graph::{DetectorInfo, Graph, PublicationEdgeInfo, TopicEdgeInfo};
pub use lag::{Lag, Lagged};
pub use processor_container::ProcessorContainer;
pub use publish::PublishHandle;
pub use timeout_publisher::{CancelToken, Instant, TimeoutPublisher};
pub use topic::{SubscriptionDispatcher, Topic};
pub use topic_state::TopicState;
