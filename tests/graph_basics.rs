//! Covers the base scheduler invariants (registry uniqueness, topological
//! order, single-visit, dispatch order, consolidation, idempotence) and
//! scenarios S1/S2.

use std::cell::RefCell;
use std::rc::Rc;

use detectorgraph::{Detector, DetectorBuilder, Evaluate, Graph, PublishHandle, ProcessorContainer};

#[derive(Clone, Default, Debug, PartialEq)]
struct A(i32);
#[derive(Clone, Default, Debug, PartialEq)]
struct B(i32);
#[derive(Clone, Default, Debug, PartialEq)]
struct C(i32);

struct D1 {
    out: PublishHandle<B>,
    visits: Rc<RefCell<usize>>,
    pending: Option<i32>,
}

impl Detector for D1 {
    fn complete_evaluation(&mut self) {
        *self.visits.borrow_mut() += 1;
        if let Some(a) = self.pending.take() {
            self.out.publish(B(a * 10));
        }
    }
}

impl Evaluate<A> for D1 {
    fn evaluate(&mut self, value: &A) {
        self.pending = Some(value.0);
    }
}

struct D2 {
    out: PublishHandle<C>,
    visits: Rc<RefCell<usize>>,
    seen: Rc<RefCell<Vec<i32>>>,
    pending: Option<i32>,
}

impl Detector for D2 {
    fn complete_evaluation(&mut self) {
        *self.visits.borrow_mut() += 1;
        if let Some(b) = self.pending.take() {
            self.out.publish(C(b * 10));
        }
    }
}

impl Evaluate<B> for D2 {
    fn evaluate(&mut self, value: &B) {
        self.seen.borrow_mut().push(value.0);
        self.pending = Some(value.0);
    }
}

struct Container {
    graph: Graph,
}

impl ProcessorContainer for Container {
    fn graph(&self) -> &Graph {
        &self.graph
    }
}

fn build_chain() -> (Container, Rc<RefCell<usize>>, Rc<RefCell<usize>>, Rc<RefCell<Vec<i32>>>) {
    let graph = Graph::new();
    let d1_visits = Rc::new(RefCell::new(0));
    let d2_visits = Rc::new(RefCell::new(0));
    let d2_seen = Rc::new(RefCell::new(Vec::new()));

    let d1_visits_clone = d1_visits.clone();
    let d1 = graph.add_detector(move |b: &mut DetectorBuilder| D1 {
        out: b.publish_handle::<B>(),
        visits: d1_visits_clone,
        pending: None,
    });
    graph.subscribe::<A, D1>(&d1);

    let d2_visits_clone = d2_visits.clone();
    let d2_seen_clone = d2_seen.clone();
    let d2 = graph.add_detector(move |b: &mut DetectorBuilder| D2 {
        out: b.publish_handle::<C>(),
        visits: d2_visits_clone,
        seen: d2_seen_clone,
        pending: None,
    });
    graph.subscribe::<B, D2>(&d2);

    (Container { graph }, d1_visits, d2_visits, d2_seen)
}

#[test]
fn s1_single_external_input_propagates_end_to_end() {
    let (container, _, _, _) = build_chain();
    container.process_data(A(1)).unwrap();
    assert_eq!(container.graph().current::<C>().unwrap(), C(100));
    assert!(!container.graph().has_new_value::<A>());
    assert!(!container.graph().has_new_value::<B>());
    assert!(!container.graph().has_new_value::<C>());
}

#[test]
fn s2_sequence_of_external_inputs_produces_matching_sequence_of_outputs() {
    let (container, _, _, _) = build_chain();
    container.process_data(A(1)).unwrap();
    assert_eq!(container.graph().current::<C>().unwrap(), C(100));
    container.process_data(A(2)).unwrap();
    assert_eq!(container.graph().current::<C>().unwrap(), C(200));
}

#[test]
fn topological_correctness_producer_runs_before_subscriber() {
    let (container, d1_visits, d2_visits, _) = build_chain();
    container.process_data(A(1)).unwrap();
    assert_eq!(*d1_visits.borrow(), 1);
    assert_eq!(*d2_visits.borrow(), 1);
}

#[test]
fn single_visit_per_traversal() {
    let (container, d1_visits, d2_visits, _) = build_chain();
    container.process_data(A(1)).unwrap();
    container.process_data(A(2)).unwrap();
    container.process_data(A(3)).unwrap();
    assert_eq!(*d1_visits.borrow(), 3);
    assert_eq!(*d2_visits.borrow(), 3);
}

#[test]
fn dispatch_order_multiple_publishes_delivered_in_publish_order() {
    #[derive(Clone, Default)]
    struct Fanout;

    struct Producer {
        out: PublishHandle<B>,
    }
    impl Detector for Producer {}
    impl Evaluate<Fanout> for Producer {
        fn evaluate(&mut self, _value: &Fanout) {
            self.out.publish(B(1));
            self.out.publish(B(2));
        }
    }

    let graph = Graph::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();

    let producer = graph.add_detector(|b: &mut DetectorBuilder| Producer { out: b.publish_handle::<B>() });
    graph.subscribe::<Fanout, Producer>(&producer);

    struct Sink {
        seen: Rc<RefCell<Vec<i32>>>,
    }
    impl Detector for Sink {}
    impl Evaluate<B> for Sink {
        fn evaluate(&mut self, value: &B) {
            self.seen.borrow_mut().push(value.0);
        }
    }
    let sink = graph.add_detector(move |_: &mut DetectorBuilder| Sink { seen: seen_clone });
    graph.subscribe::<B, Sink>(&sink);

    graph.process_external(Fanout).unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert_eq!(graph.current::<B>().unwrap(), B(2));
}

#[test]
fn consolidation_clears_dirty_flags_at_traversal_end() {
    let (container, _, _, _) = build_chain();
    container.process_data(A(1)).unwrap();
    assert!(!container.graph().has_new_value::<A>());
    assert!(!container.graph().has_new_value::<B>());
    assert!(!container.graph().has_new_value::<C>());
}

#[test]
fn idempotence_of_unrelated_external_seed() {
    #[derive(Clone, Default)]
    struct Unrelated(i32);

    let (container, _, _, _) = build_chain();
    container.process_data(A(1)).unwrap();
    let before = container.graph().current::<C>().unwrap();
    container.process_data(Unrelated(99)).unwrap();
    let after = container.graph().current::<C>().unwrap();
    assert_eq!(before, after);
}

#[test]
fn registry_resolve_is_idempotent_per_type() {
    // Two independent detectors subscribing to the same topic type must
    // observe the exact same published values, which is only possible if
    // `Resolve::<A>()` handed both of them the same underlying `Topic<A>`.
    struct Counter {
        seen: Rc<RefCell<Vec<i32>>>,
    }
    impl Detector for Counter {}
    impl Evaluate<A> for Counter {
        fn evaluate(&mut self, value: &A) {
            self.seen.borrow_mut().push(value.0);
        }
    }

    let graph = Graph::new();
    let seen1 = Rc::new(RefCell::new(Vec::new()));
    let seen2 = Rc::new(RefCell::new(Vec::new()));

    let seen1_clone = seen1.clone();
    let d1 = graph.add_detector(move |_: &mut DetectorBuilder| Counter { seen: seen1_clone });
    graph.subscribe::<A, Counter>(&d1);

    let seen2_clone = seen2.clone();
    let d2 = graph.add_detector(move |_: &mut DetectorBuilder| Counter { seen: seen2_clone });
    graph.subscribe::<A, Counter>(&d2);

    graph.process_external(A(5)).unwrap();
    graph.process_external(A(6)).unwrap();

    assert_eq!(*seen1.borrow(), vec![5, 6]);
    assert_eq!(*seen2.borrow(), vec![5, 6]);
}
