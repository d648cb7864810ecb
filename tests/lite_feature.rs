//! Covers property 9: with the `lite` feature enabled, the storage swap
//! from `Vec` to `smallvec::SmallVec` must be invisible to behavior. This
//! file only compiles and runs under `--features lite`, reproducing S1's
//! chain scenario against the same public API used in `graph_basics.rs`.

#![cfg(feature = "lite")]

use detectorgraph::{Detector, DetectorBuilder, Evaluate, Graph, PublishHandle};

#[derive(Clone, Default, Debug, PartialEq)]
struct A(i32);
#[derive(Clone, Default, Debug, PartialEq)]
struct B(i32);
#[derive(Clone, Default, Debug, PartialEq)]
struct C(i32);

struct D1 {
    out: PublishHandle<B>,
    pending: Option<i32>,
}
impl Detector for D1 {
    fn complete_evaluation(&mut self) {
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
    pending: Option<i32>,
}
impl Detector for D2 {
    fn complete_evaluation(&mut self) {
        if let Some(b) = self.pending.take() {
            self.out.publish(C(b * 10));
        }
    }
}
impl Evaluate<B> for D2 {
    fn evaluate(&mut self, value: &B) {
        self.pending = Some(value.0);
    }
}

#[test]
fn lite_feature_reproduces_s1_and_s2_identically() {
    let graph = Graph::new();
    let d1 = graph.add_detector(|b: &mut DetectorBuilder| D1 { out: b.publish_handle::<B>(), pending: None });
    graph.subscribe::<A, D1>(&d1);
    let d2 = graph.add_detector(|b: &mut DetectorBuilder| D2 { out: b.publish_handle::<C>(), pending: None });
    graph.subscribe::<B, D2>(&d2);

    graph.process_external(A(1)).unwrap();
    assert_eq!(graph.current::<C>().unwrap(), C(100));

    graph.process_external(A(2)).unwrap();
    assert_eq!(graph.current::<C>().unwrap(), C(200));
}
