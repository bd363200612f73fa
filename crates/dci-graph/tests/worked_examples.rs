//! End-to-end scoring on small hand-checked systems.

use dci_core::CallRecord;
use dci_graph::{compute_coupling, CallGraph, CouplingLevel};

fn build(records: &[(&str, &str, u64)]) -> CallGraph {
    let mut graph = CallGraph::new();
    for (caller, callee, count) in records {
        graph.add_call(&CallRecord::new(*caller, *callee, *count).unwrap());
    }
    graph
}

fn round3(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

#[test]
fn three_service_triangle() {
    let graph = build(&[("A", "B", 1), ("A", "C", 1), ("B", "C", 1)]);
    assert_eq!(graph.total_services(), 3);

    let scores = compute_coupling(&graph);
    assert_eq!(scores["A"], 1.0);
    assert_eq!(CouplingLevel::classify(scores["A"]).label(), "High Coupling");
    assert_eq!(scores["B"], 0.5);
    assert_eq!(
        CouplingLevel::classify(scores["B"]).label(),
        "Moderate Coupling"
    );
    assert_eq!(scores["C"], 0.0);
    assert_eq!(CouplingLevel::classify(scores["C"]).label(), "No Coupling");
}

#[test]
fn four_services_with_two_isolated() {
    let graph = build(&[("A", "B", 1), ("B", "C", 1), ("A", "D", 1)]);
    assert_eq!(graph.total_services(), 4);
    assert_eq!(graph.isolated_services_count(), 2);

    let isolated: Vec<&str> = graph
        .isolated_services()
        .into_iter()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(isolated, vec!["C", "D"]);

    let scores = compute_coupling(&graph);
    assert_eq!(round3(scores["A"]), 0.667);
    assert_eq!(CouplingLevel::classify(scores["A"]), CouplingLevel::Moderate);
    assert_eq!(scores["D"], 0.0);
    assert_eq!(CouplingLevel::classify(scores["D"]), CouplingLevel::None);
}

#[test]
fn lone_service_calling_itself() {
    let graph = build(&[("A", "A", 1)]);
    assert_eq!(graph.total_services(), 1);

    let scores = compute_coupling(&graph);
    assert_eq!(scores.len(), 1);
    assert_eq!(scores["A"], 0.0);
}

#[test]
fn record_order_does_not_change_result() {
    let records = [
        ("gateway", "users", 4),
        ("gateway", "orders", 2),
        ("orders", "payments", 1),
        ("orders", "orders", 3),
        ("gateway", "users", 1),
    ];
    let forward = build(&records);
    let mut reversed_records = records;
    reversed_records.reverse();
    let backward = build(&reversed_records);

    assert_eq!(compute_coupling(&forward), compute_coupling(&backward));
    assert_eq!(
        forward.outgoing_calls("gateway").get("users"),
        backward.outgoing_calls("gateway").get("users")
    );
    assert_eq!(forward.outgoing_calls("gateway").get("users"), Some(5));
}
